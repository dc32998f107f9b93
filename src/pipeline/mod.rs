pub mod genres;
pub mod interactions;
pub mod svd;

use std::time::Instant;

use chrono::Utc;

use crate::artifacts::{ArtifactStore, Manifest};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{IdIndex, Movie, Rating};

use genres::GenreFeatures;
use interactions::Interactions;
use svd::truncated_svd;

/// Counters describing one factorizer run
#[derive(Debug)]
pub struct PipelineSummary {
    pub n_ratings: usize,
    pub n_users: usize,
    pub n_rated_movies: usize,
    pub n_catalog_movies: usize,
    pub rank: usize,
}

/// Runs the offline factorizer end to end
///
/// Loads the ratings and catalog CSVs, factorizes the interaction
/// matrix, computes the genre feature table, and persists everything to
/// the model directory, overwriting artifacts from previous runs. Any
/// I/O or data failure aborts the run.
pub fn run(config: &Config) -> AppResult<PipelineSummary> {
    let start = Instant::now();

    // 1. Load input tables
    let ratings = load_ratings(&config.ratings_csv)?;
    let movies = load_movies(&config.movies_csv)?;
    tracing::info!(
        ratings = ratings.len(),
        movies = movies.len(),
        "Input data loaded"
    );

    // 2. Assign dense matrix indices in first-occurrence order
    let user_index = IdIndex::from_first_occurrence(ratings.iter().map(|r| r.user_id));
    let movie_index = IdIndex::from_first_occurrence(ratings.iter().map(|r| r.movie_id));

    // 3. Build the sparse interaction matrix
    let interactions = Interactions::from_ratings(&ratings, &user_index, &movie_index)?;
    tracing::info!(
        rows = interactions.nrows(),
        cols = interactions.ncols(),
        stored = interactions.nnz(),
        "Interaction matrix built"
    );

    // 4. Factorize
    let factors = truncated_svd(&interactions, config.latent_rank, config.svd_seed)?;
    tracing::info!(rank = factors.rank(), "Truncated SVD fit complete");

    // 5. Genre bag-of-words over the catalog
    let features = GenreFeatures::fit(&movies, config.max_genre_features);
    tracing::info!(
        vocabulary = features.vocabulary().len(),
        "Genre features computed"
    );

    // 6. Persist artifacts, overwriting any previous run
    let manifest = Manifest {
        created_at: Utc::now(),
        rank: factors.rank(),
        n_users: user_index.len(),
        n_rated_movies: movie_index.len(),
        n_catalog_movies: movies.len(),
        vocabulary_size: features.vocabulary().len(),
        seed: config.svd_seed,
    };
    let store = ArtifactStore::new(&config.model_dir);
    store.save(
        &factors,
        &user_index,
        &movie_index,
        &features,
        &movies,
        &manifest,
    )?;

    let elapsed = start.elapsed();
    tracing::info!(
        model_dir = %config.model_dir,
        elapsed_ms = elapsed.as_millis(),
        "Pipeline finished"
    );

    Ok(PipelineSummary {
        n_ratings: ratings.len(),
        n_users: user_index.len(),
        n_rated_movies: movie_index.len(),
        n_catalog_movies: movies.len(),
        rank: factors.rank(),
    })
}

/// Loads the ratings CSV; empty or malformed input is fatal
pub fn load_ratings(path: &str) -> AppResult<Vec<Rating>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::Data(format!("cannot open ratings file {}: {}", path, e)))?;
    let ratings: Vec<Rating> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .map_err(|e| AppError::Data(format!("malformed row in {}: {}", path, e)))?;
    if ratings.is_empty() {
        return Err(AppError::Data(format!(
            "ratings file {} contains no rows",
            path
        )));
    }
    Ok(ratings)
}

/// Loads the movie catalog CSV; empty or malformed input is fatal
pub fn load_movies(path: &str) -> AppResult<Vec<Movie>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::Data(format!("cannot open catalog file {}: {}", path, e)))?;
    let movies: Vec<Movie> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .map_err(|e| AppError::Data(format!("malformed row in {}: {}", path, e)))?;
    if movies.is_empty() {
        return Err(AppError::Data(format!(
            "catalog file {} contains no rows",
            path
        )));
    }
    Ok(movies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_ratings_reads_rows_in_file_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "userId,movieId,rating,timestamp").unwrap();
        writeln!(file, "1,10,5.0,964982703").unwrap();
        writeln!(file, "2,10,4.0,964982931").unwrap();
        let ratings = load_ratings(file.path().to_str().unwrap()).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].user_id, 1);
        assert_eq!(ratings[1].user_id, 2);
    }

    #[test]
    fn test_load_ratings_rejects_empty_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "userId,movieId,rating").unwrap();
        let result = load_ratings(file.path().to_str().unwrap());
        assert!(matches!(result, Err(AppError::Data(_))));
    }

    #[test]
    fn test_load_ratings_missing_file_is_a_data_error() {
        let result = load_ratings("/nonexistent/ratings.csv");
        assert!(matches!(result, Err(AppError::Data(_))));
    }

    #[test]
    fn test_load_movies_rejects_malformed_row() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "movieId,title,genres").unwrap();
        writeln!(file, "not-a-number,Broken,Action").unwrap();
        let result = load_movies(file.path().to_str().unwrap());
        assert!(matches!(result, Err(AppError::Data(_))));
    }
}
