//! Mock scraper for testing.
//!
//! Provides configurable canned responses, per-URL failures and delays,
//! call recording, and an in-flight high-water mark for concurrency
//! assertions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::{ScrapeError, ScrapeResult};
use crate::traits::scraper::{ScrapeOutput, Scraper};
use crate::types::options::{OutputFormat, ScrapeOptions};

/// Mock scraper for tests.
///
/// URLs without a canned page or failure produce a default markdown body,
/// so large batches don't need per-URL setup.
///
/// # Example
///
/// ```rust,ignore
/// let mock = MockScraper::new()
///     .with_page("https://a.example", "# A")
///     .with_failure("https://b.example", "connection refused")
///     .with_delay("https://a.example", Duration::from_millis(50));
/// ```
#[derive(Default)]
pub struct MockScraper {
    /// Canned markdown indexed by URL
    pages: Arc<RwLock<HashMap<String, String>>>,
    /// URLs that fail, with the failure message
    failures: Arc<RwLock<HashMap<String, String>>>,
    /// Artificial per-URL latency
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    /// URLs requested, in call order
    calls: Arc<RwLock<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockScraper {
    /// Create a new empty mock scraper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned markdown for a URL (builder pattern).
    pub fn with_page(self, url: impl Into<String>, markdown: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), markdown.into());
        self
    }

    /// Make a URL fail with the given message (builder pattern).
    pub fn with_failure(self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures
            .write()
            .unwrap()
            .insert(url.into(), message.into());
        self
    }

    /// Add artificial latency to a URL (builder pattern).
    pub fn with_delay(self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(url.into(), delay);
        self
    }

    /// Add the same artificial latency to every scrape (builder pattern).
    pub fn with_delay_for_all(self, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(String::new(), delay);
        self
    }

    /// URLs requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Number of scrape calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Highest number of scrapes observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn delay_for(&self, url: &str) -> Option<Duration> {
        let delays = self.delays.read().unwrap();
        delays.get(url).or_else(|| delays.get("")).copied()
    }
}

impl Clone for MockScraper {
    fn clone(&self) -> Self {
        Self {
            pages: Arc::clone(&self.pages),
            failures: Arc::clone(&self.failures),
            delays: Arc::clone(&self.delays),
            calls: Arc::clone(&self.calls),
            in_flight: Arc::clone(&self.in_flight),
            max_in_flight: Arc::clone(&self.max_in_flight),
        }
    }
}

#[async_trait]
impl Scraper for MockScraper {
    async fn scrape(&self, url: &str, options: &ScrapeOptions) -> ScrapeResult<ScrapeOutput> {
        self.calls.write().unwrap().push(url.to_string());
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay_for(url) {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let failure = self.failures.read().unwrap().get(url).cloned();
            match failure {
                Some(message) => Err(ScrapeError::Http(message.into())),
                None => {
                    let markdown = self
                        .pages
                        .read()
                        .unwrap()
                        .get(url)
                        .cloned()
                        .unwrap_or_else(|| format!("# {url}\n\nmock content for {url}"));

                    let mut output = ScrapeOutput::new(url);
                    if options.wants(OutputFormat::Markdown) {
                        output = output.with_markdown(markdown);
                    }
                    if options.wants(OutputFormat::Structured) {
                        output = output.with_structured(json!({ "url": url }));
                    }
                    if options.wants(OutputFormat::Screenshot) {
                        output = output.with_screenshot(vec![0x89, 0x50, 0x4e, 0x47]);
                    }
                    Ok(output)
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &str {
        "mock"
    }
}
