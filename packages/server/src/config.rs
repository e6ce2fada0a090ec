use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Base URL clients reach this service on; used to build status and
    /// artifact links.
    pub public_base_url: String,
    pub max_batch_size: usize,
    pub max_concurrent_items: usize,
    pub max_concurrent_jobs: usize,
    /// Default per-item scrape timeout when a submission doesn't set one.
    pub scrape_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            public_base_url: "http://localhost:8080".to_string(),
            max_batch_size: 1000,
            max_concurrent_items: 5,
            max_concurrent_jobs: 8,
            scrape_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("PORT must be a valid number")?;

        Ok(Self {
            port,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
            max_batch_size: env::var("MAX_BATCH_SIZE")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .context("MAX_BATCH_SIZE must be a valid number")?,
            max_concurrent_items: env::var("MAX_CONCURRENT_ITEMS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("MAX_CONCURRENT_ITEMS must be a valid number")?,
            max_concurrent_jobs: env::var("MAX_CONCURRENT_JOBS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .context("MAX_CONCURRENT_JOBS must be a valid number")?,
            scrape_timeout_secs: env::var("SCRAPE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("SCRAPE_TIMEOUT_SECS must be a valid number")?,
        })
    }

    /// Base URL artifacts are addressed under.
    pub fn artifact_base_url(&self) -> String {
        format!(
            "{}/v1/artifacts",
            self.public_base_url.trim_end_matches('/')
        )
    }

    /// Status-polling URL for a job.
    pub fn status_url(&self, job_id: uuid::Uuid) -> String {
        format!(
            "{}/v1/batch/{}",
            self.public_base_url.trim_end_matches('/'),
            job_id
        )
    }
}
