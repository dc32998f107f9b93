use serde::Deserialize;

/// Application configuration loaded from environment variables
///
/// Shared by the `factorize` batch pipeline and the web server; both only
/// read the fields they need.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Ratings CSV (columns: userId, movieId, rating)
    #[serde(default = "default_ratings_csv")]
    pub ratings_csv: String,

    /// Movie catalog CSV (columns: movieId, title, genres)
    #[serde(default = "default_movies_csv")]
    pub movies_csv: String,

    /// Directory the pipeline writes model artifacts to and the server
    /// loads them from
    #[serde(default = "default_model_dir")]
    pub model_dir: String,

    /// Target rank K of the truncated decomposition
    #[serde(default = "default_latent_rank")]
    pub latent_rank: usize,

    /// Seed for the randomized SVD range finder
    #[serde(default = "default_svd_seed")]
    pub svd_seed: u64,

    /// Vocabulary cap for the genre bag-of-words table
    #[serde(default = "default_max_genre_features")]
    pub max_genre_features: usize,

    /// How many recommendations a request returns
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_ratings_csv() -> String {
    "ratings.csv".to_string()
}

fn default_movies_csv() -> String {
    "movies.csv".to_string()
}

fn default_model_dir() -> String {
    "model".to_string()
}

fn default_latent_rank() -> usize {
    20
}

fn default_svd_seed() -> u64 {
    42
}

fn default_max_genre_features() -> usize {
    1000
}

fn default_top_n() -> usize {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_pipeline_conventions() {
        // Deserializing from an empty map exercises every default fn.
        let config: Config = envy::from_iter(std::iter::empty::<(String, String)>()).unwrap();
        assert_eq!(config.ratings_csv, "ratings.csv");
        assert_eq!(config.movies_csv, "movies.csv");
        assert_eq!(config.model_dir, "model");
        assert_eq!(config.latent_rank, 20);
        assert_eq!(config.svd_seed, 42);
        assert_eq!(config.max_genre_features, 1000);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_env_overrides() {
        let vars = vec![
            ("LATENT_RANK".to_string(), "8".to_string()),
            ("MODEL_DIR".to_string(), "/tmp/model".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.latent_rank, 8);
        assert_eq!(config.model_dir, "/tmp/model");
        assert_eq!(config.top_n, 10);
    }
}
