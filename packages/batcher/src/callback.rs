//! Webhook delivery for finished jobs.
//!
//! Best-effort, at-most-one attempt: a non-2xx response or network failure
//! is logged and swallowed. The status API remains the source of truth, so
//! a job's correctness never depends on notification succeeding.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use tracing::{debug, error, warn};

use crate::types::job::BatchJob;

/// Delivers the terminal job snapshot to the caller's webhook.
#[derive(Clone)]
pub struct CallbackSender {
    client: reqwest::Client,
}

impl Default for CallbackSender {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackSender {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// POST the terminal snapshot to the job's callback URL, if any.
    ///
    /// Never fails the caller and never mutates the job; delivery problems
    /// are logged only.
    pub async fn notify(&self, job: &BatchJob) {
        let Some(url) = job.callback_url.as_deref() else {
            return;
        };

        // Body matches the GetStatus serialization exactly.
        let body = match serde_json::to_vec(job) {
            Ok(body) => body,
            Err(e) => {
                error!(job_id = %job.id, error = %e, "failed to serialize callback payload");
                return;
            }
        };

        let headers = build_headers(&job.callback_headers);
        debug!(job_id = %job.id, url = %url, "delivering callback");

        match self.client.post(url).headers(headers).body(body).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(job_id = %job.id, status = %response.status(), "callback delivered");
            }
            Ok(response) => {
                warn!(
                    job_id = %job.id,
                    url = %url,
                    status = %response.status(),
                    "callback rejected by receiver"
                );
            }
            Err(e) => {
                warn!(job_id = %job.id, url = %url, error = %e, "callback delivery failed");
            }
        }
    }
}

/// Default headers merged with the caller's; caller entries win. Invalid
/// header names or values are skipped with a warning.
fn build_headers(caller: &HashMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static("batcher/0.1"));

    for (name, value) in caller {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "skipping invalid callback header"),
        }
    }

    headers
}
