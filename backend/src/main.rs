//! Costbook Ledger - Backend Server

use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use costbook_backend::external::{OpenAiExtractor, OpenAiMatcher};
use costbook_backend::store::MemoryStore;
use costbook_backend::{create_app, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "costbook_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Costbook Ledger Server");
    tracing::info!("Environment: {}", config.environment);

    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        extractor: Arc::new(OpenAiExtractor::new(config.extraction.clone())),
        matcher: Arc::new(OpenAiMatcher::new(config.matching.clone())),
        config: Arc::new(config.clone()),
    };

    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
