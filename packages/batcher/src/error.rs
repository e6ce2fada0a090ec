//! Typed errors for the batch orchestration library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the job API and orchestration layers.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Malformed submission; rejected before any job is created.
    #[error("invalid submission: {reason}")]
    Validation { reason: String },

    /// Status query for an unknown job id.
    #[error("job not found: {id}")]
    NotFound { id: Uuid },

    /// Job store operation failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Artifact store operation failed.
    #[error("artifact error: {0}")]
    Artifact(String),
}

/// Errors from a single item's scrape.
///
/// Captured per item and recorded in that item's slot; an item error never
/// aborts the rest of the batch and never surfaces as a top-level API error.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-success HTTP status
    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    /// Connection or response timeout
    #[error("timeout scraping: {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Page yielded no extractable content
    #[error("no content extracted from: {url}")]
    EmptyContent { url: String },
}

impl ScrapeError {
    /// Machine-readable kind recorded on the failed item.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Http(_) => "http",
            ScrapeError::Status { .. } => "http_status",
            ScrapeError::Timeout { .. } => "timeout",
            ScrapeError::InvalidUrl { .. } => "invalid_url",
            ScrapeError::EmptyContent { .. } => "empty_content",
        }
    }
}

/// Result type alias for job-level operations.
pub type Result<T> = std::result::Result<T, BatchError>;

/// Result type alias for scrape operations.
pub type ScrapeResult<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_error_kinds_are_stable() {
        let err = ScrapeError::Timeout {
            url: "https://example.com".to_string(),
        };
        assert_eq!(err.kind(), "timeout");

        let err = ScrapeError::Status {
            url: "https://example.com".to_string(),
            status: 503,
        };
        assert_eq!(err.kind(), "http_status");
    }

    #[test]
    fn validation_error_names_the_constraint() {
        let err = BatchError::Validation {
            reason: "urls must not be empty".to_string(),
        };
        assert!(err.to_string().contains("urls must not be empty"));
    }
}
