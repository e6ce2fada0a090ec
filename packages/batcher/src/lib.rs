//! Batch scrape job orchestration.
//!
//! Accepts a batch of URLs, fans them out to a pluggable [`Scraper`] under
//! a bounded concurrency limit, tracks per-item and aggregate progress in
//! an injectable [`JobStore`], optionally collates the outputs into one
//! combined document, and notifies a caller-supplied webhook when the job
//! reaches a terminal state.
//!
//! # Design
//!
//! - Items are bulkheaded: one URL failing is recorded on that item alone
//!   and never aborts the batch.
//! - A job completes when at least one item succeeded; it fails only when
//!   every item failed.
//! - Artifact locations are deterministic functions of the job id and item
//!   index, so async submitters get resolvable URLs before work finishes.
//! - Webhook delivery is best-effort, at-most-one attempt; the status API
//!   stays the source of truth.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use batcher::{
//!     Dispatcher, HttpScraper, MemoryArtifactStore, MemoryJobStore, SubmitOptions,
//! };
//!
//! let dispatcher = Dispatcher::new(
//!     Arc::new(HttpScraper::new()),
//!     Arc::new(MemoryJobStore::new()),
//!     Arc::new(MemoryArtifactStore::new("http://localhost:8080/v1/artifacts")),
//! );
//!
//! // Async submission: returns once the job row exists.
//! let outcome = dispatcher
//!     .submit(SubmitOptions::new(vec!["https://example.com".into()]))
//!     .await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Injection seams (Scraper, JobStore, ArtifactStore)
//! - [`types`] - Job and submission data model
//! - [`dispatcher`] - Fan-out engine and submission entry points
//! - [`collate`] - Combined-document rendering and storage
//! - [`callback`] - Webhook delivery
//! - [`stores`] - In-memory store implementations
//! - [`scrapers`] - Scraper implementations (HTTP, mock)

pub mod callback;
pub mod collate;
pub mod dispatcher;
pub mod error;
pub mod scrapers;
pub mod stores;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use callback::CallbackSender;
pub use collate::{render_collated, Collator};
pub use dispatcher::{
    Dispatcher, DispatcherConfig, Submission, SubmitOutcome, SubmittedItem,
};
pub use error::{BatchError, ScrapeError};
pub use scrapers::{HttpScraper, MockScraper};
pub use stores::{MemoryArtifactStore, MemoryJobStore};
pub use traits::{
    artifacts::{predicted_outputs, ArtifactKey, ArtifactKind, ArtifactStore, StoredArtifact},
    scraper::{ScrapeOutput, Scraper},
    store::{ItemOutcome, JobStore},
};
pub use types::{
    job::{BatchJob, BatchStatus, ItemError, ItemResult, ItemStatus, OutputLocations},
    options::{OutputFormat, ScrapeOptions, SubmitMode, SubmitOptions},
};
