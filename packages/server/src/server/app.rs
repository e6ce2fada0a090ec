//! Application setup and router construction.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use batcher::{
    ArtifactStore, Dispatcher, DispatcherConfig, HttpScraper, MemoryArtifactStore, MemoryJobStore,
    Scraper,
};

use crate::config::Config;
use crate::server::routes::{artifact_handler, health_handler, status_handler, submit_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub config: Config,
}

/// Build the axum application router with the default HTTP scraper.
pub fn build_app(config: Config) -> Router {
    build_app_with_scraper(config, Arc::new(HttpScraper::new()))
}

/// Build the router with a specific scraper implementation. Tests inject a
/// mock here; production wiring goes through [`build_app`].
pub fn build_app_with_scraper(config: Config, scraper: Arc<dyn Scraper>) -> Router {
    let store = Arc::new(MemoryJobStore::new());
    let artifacts: Arc<dyn ArtifactStore> =
        Arc::new(MemoryArtifactStore::new(config.artifact_base_url()));

    let dispatcher = Dispatcher::with_config(
        scraper,
        store,
        artifacts.clone(),
        DispatcherConfig {
            max_concurrent_items: config.max_concurrent_items,
            max_concurrent_jobs: config.max_concurrent_jobs,
            max_batch_size: config.max_batch_size,
        },
    );

    let state = AppState {
        dispatcher,
        artifacts,
        config,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/v1/batch", post(submit_handler))
        .route("/v1/batch/:id", get(status_handler))
        .route("/v1/artifacts/*path", get(artifact_handler))
        .route("/health", get(health_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
