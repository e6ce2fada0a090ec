//! Submission and scrape options.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Whether a submission blocks until the job is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    /// Block the caller until the job reaches a terminal state.
    Sync,
    /// Return as soon as the job row exists; processing continues in the
    /// background.
    #[default]
    Async,
}

/// Output artifact formats a scrape can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Markdown,
    Structured,
    Screenshot,
}

/// Options passed through to the scraper for every item in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOptions {
    /// Formats to produce per item.
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,

    /// Per-item scrape timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Markdown]
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ScrapeOptions {
    pub fn wants(&self, format: OutputFormat) -> bool {
        self.formats.contains(&format)
    }
}

/// A full batch submission.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub urls: Vec<String>,
    pub mode: SubmitMode,
    pub collate: bool,
    pub callback_url: Option<String>,
    pub callback_headers: HashMap<String, String>,
    pub scrape: ScrapeOptions,
}

impl SubmitOptions {
    /// An async, markdown-only submission of the given URLs.
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            mode: SubmitMode::default(),
            collate: false,
            callback_url: None,
            callback_headers: HashMap::new(),
            scrape: ScrapeOptions::default(),
        }
    }

    pub fn with_mode(mut self, mode: SubmitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_collate(mut self, collate: bool) -> Self {
        self.collate = collate;
        self
    }

    pub fn with_callback(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn with_callback_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.callback_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_formats(mut self, formats: Vec<OutputFormat>) -> Self {
        self.scrape.formats = formats;
        self
    }
}
