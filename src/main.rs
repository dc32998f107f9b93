use tracing_subscriber::EnvFilter;

use reelrec::api::{create_router, AppState};
use reelrec::artifacts::ArtifactStore;
use reelrec::config::Config;
use reelrec::recommend::ModelContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reelrec=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Load the model artifacts before accepting any traffic; a missing
    // artifact aborts startup with the offending file in the message
    let store = ArtifactStore::new(&config.model_dir);
    let model = ModelContext::load(&store)?;

    let state = AppState::new(model, config.top_n);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
