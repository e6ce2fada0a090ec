//! Batch scrape API server.
//!
//! REST surface over the [`batcher`] orchestration library:
//! - `POST /v1/batch` - submit a batch of URLs (sync or async)
//! - `GET /v1/batch/{id}` - poll a job's status
//! - `GET /v1/artifacts/{path}` - fetch generated artifacts
//! - `GET /health` - liveness

pub mod config;
pub mod server;

pub use config::Config;
