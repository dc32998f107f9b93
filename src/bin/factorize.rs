use tracing_subscriber::EnvFilter;

use reelrec::config::Config;
use reelrec::pipeline;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reelrec=info")),
        )
        .init();

    let config = Config::from_env()?;
    let summary = pipeline::run(&config)?;
    tracing::info!(
        ratings = summary.n_ratings,
        users = summary.n_users,
        rated_movies = summary.n_rated_movies,
        catalog_movies = summary.n_catalog_movies,
        rank = summary.rank,
        "Factorization artifacts ready"
    );
    Ok(())
}
