// Main entry point for the batch scrape API server

use anyhow::{Context, Result};
use server_core::{server::build_app, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,batcher=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting batch scrape API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    let addr = format!("0.0.0.0:{}", config.port);

    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: {}/health", config.public_base_url);

    let app = build_app(config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
