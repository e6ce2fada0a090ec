//! Scraper trait: the boundary to the content-extraction pipeline.
//!
//! The dispatcher treats a scraper as an opaque, potentially slow,
//! potentially failing operation. Implementations:
//! - [`HttpScraper`](crate::scrapers::HttpScraper) - local HTTP fetch +
//!   markdown conversion
//! - [`MockScraper`](crate::scrapers::MockScraper) - canned responses for
//!   tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ScrapeResult;
use crate::types::options::ScrapeOptions;

/// Content produced by one successful scrape.
///
/// Fields are populated according to the requested
/// [`formats`](ScrapeOptions::formats); a scraper that cannot produce a
/// requested format leaves that field unset rather than failing.
#[derive(Debug, Clone)]
pub struct ScrapeOutput {
    /// Final URL after redirects.
    pub url: String,

    /// Markdown rendition of the page content.
    pub markdown: Option<String>,

    /// Structured metadata extracted from the page.
    pub structured: Option<serde_json::Value>,

    /// Screenshot image bytes (PNG).
    pub screenshot: Option<Vec<u8>>,

    /// Page title if available.
    pub title: Option<String>,

    /// When the content was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl ScrapeOutput {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            markdown: None,
            structured: None,
            screenshot: None,
            title: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn with_markdown(mut self, markdown: impl Into<String>) -> Self {
        self.markdown = Some(markdown.into());
        self
    }

    pub fn with_structured(mut self, value: serde_json::Value) -> Self {
        self.structured = Some(value);
        self
    }

    pub fn with_screenshot(mut self, bytes: Vec<u8>) -> Self {
        self.screenshot = Some(bytes);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Turns one URL into content.
///
/// The only operation in the system expected to take non-trivial wall-clock
/// time; the dispatcher bounds how many calls run concurrently and isolates
/// each call's failure to its own item.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Scrape a single URL, honoring the requested formats and timeout.
    async fn scrape(&self, url: &str, options: &ScrapeOptions) -> ScrapeResult<ScrapeOutput>;

    /// Implementation name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_output_builder() {
        let output = ScrapeOutput::new("https://example.com")
            .with_markdown("# Hello")
            .with_title("Example");

        assert_eq!(output.url, "https://example.com");
        assert_eq!(output.markdown.as_deref(), Some("# Hello"));
        assert_eq!(output.title.as_deref(), Some("Example"));
        assert!(output.structured.is_none());
        assert!(output.screenshot.is_none());
    }
}
