//! Batch dispatcher - fans submitted URLs out to the scraper under a
//! bounded concurrency limit and records results as they complete.
//!
//! # Architecture
//!
//! ```text
//! Submit(urls, options)
//!     │ validate, create job row (all items pending)
//!     ├─► sync:  run the job inline, return the terminal snapshot
//!     └─► async: spawn onto the bounded job pool, return predictions
//!
//! run(job)
//!     ├─► mark processing
//!     ├─► per item (≤ K in flight): scrape → write artifacts → update_item
//!     ├─► collate (if requested)
//!     ├─► set terminal status
//!     └─► deliver callback (best effort)
//! ```
//!
//! Item failures never abort the batch; each item's outcome lands in its
//! own slot and the batch continues.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::callback::CallbackSender;
use crate::collate::Collator;
use crate::error::{BatchError, Result};
use crate::traits::artifacts::{predicted_outputs, ArtifactKey, ArtifactKind, ArtifactStore};
use crate::traits::scraper::{ScrapeOutput, Scraper};
use crate::traits::store::{ItemOutcome, JobStore};
use crate::types::job::{BatchJob, ItemError, OutputLocations};
use crate::types::options::{OutputFormat, ScrapeOptions, SubmitMode, SubmitOptions};

/// Tuning for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Maximum items in flight at once, per job.
    pub max_concurrent_items: usize,
    /// Maximum async-mode jobs processing at once (the background job pool).
    pub max_concurrent_jobs: usize,
    /// Maximum URLs accepted in one submission.
    pub max_batch_size: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_items: 5,
            max_concurrent_jobs: 8,
            max_batch_size: 1000,
        }
    }
}

/// An accepted async submission: the job row exists and processing
/// continues in the background. Output locations are predictions, computed
/// deterministically from the job id and item index, so clients can start
/// resolving them before processing finishes.
#[derive(Debug, Clone)]
pub struct Submission {
    pub job_id: Uuid,
    pub items: Vec<SubmittedItem>,
    pub collated_location: Option<String>,
}

/// One submitted URL with its predicted output locations.
#[derive(Debug, Clone)]
pub struct SubmittedItem {
    pub url: String,
    pub outputs: OutputLocations,
}

/// Outcome of a submission, by mode.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Async mode: accepted, job running in the background.
    Accepted(Submission),
    /// Sync mode: the terminal job snapshot.
    Finished(BatchJob),
}

/// Orchestrates batch jobs over injectable scraper, job store, and
/// artifact store implementations.
///
/// Cheap to clone; clones share the same stores and job pool.
#[derive(Clone)]
pub struct Dispatcher {
    scraper: Arc<dyn Scraper>,
    store: Arc<dyn JobStore>,
    artifacts: Arc<dyn ArtifactStore>,
    callback: CallbackSender,
    config: DispatcherConfig,
    /// Bounded pool for async-mode jobs; lifetime tied to the process.
    job_slots: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(
        scraper: Arc<dyn Scraper>,
        store: Arc<dyn JobStore>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self::with_config(scraper, store, artifacts, DispatcherConfig::default())
    }

    pub fn with_config(
        scraper: Arc<dyn Scraper>,
        store: Arc<dyn JobStore>,
        artifacts: Arc<dyn ArtifactStore>,
        config: DispatcherConfig,
    ) -> Self {
        let job_slots = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        Self {
            scraper,
            store,
            artifacts,
            callback: CallbackSender::new(),
            config,
            job_slots,
        }
    }

    /// Validate and create a batch job, then execute it according to mode.
    ///
    /// Async mode returns once the job row exists, with predicted output
    /// locations; sync mode blocks until the job is terminal. Validation
    /// failures reject the submission before any job is created.
    pub async fn submit(&self, options: SubmitOptions) -> Result<SubmitOutcome> {
        let urls = self.validate(&options)?;

        let job = BatchJob::new(
            urls.clone(),
            options.collate,
            options.callback_url.clone(),
            options.callback_headers.clone(),
        );
        let job_id = job.id;
        self.store.create(job).await?;
        info!(
            job_id = %job_id,
            total = urls.len(),
            mode = ?options.mode,
            collate = options.collate,
            scraper = self.scraper.name(),
            "batch job created"
        );

        match options.mode {
            SubmitMode::Sync => {
                self.run(job_id, urls, options.scrape).await;
                let job = self.store.get(job_id).await?;
                Ok(SubmitOutcome::Finished(job))
            }
            SubmitMode::Async => {
                let items = urls
                    .iter()
                    .enumerate()
                    .map(|(index, url)| SubmittedItem {
                        url: url.clone(),
                        outputs: predicted_outputs(
                            self.artifacts.as_ref(),
                            job_id,
                            index,
                            &options.scrape.formats,
                        ),
                    })
                    .collect();
                let collated_location = options
                    .collate
                    .then(|| self.artifacts.url_for(&ArtifactKey::collated(job_id)));

                let dispatcher = self.clone();
                let scrape = options.scrape.clone();
                tokio::spawn(async move {
                    let Ok(_slot) = dispatcher.job_slots.clone().acquire_owned().await else {
                        error!(job_id = %job_id, "job pool closed before job could run");
                        return;
                    };
                    dispatcher.run(job_id, urls, scrape).await;
                });

                Ok(SubmitOutcome::Accepted(Submission {
                    job_id,
                    items,
                    collated_location,
                }))
            }
        }
    }

    /// Current snapshot of a job. `NotFound` for unknown ids.
    pub async fn status(&self, id: Uuid) -> Result<BatchJob> {
        self.store.get(id).await
    }

    fn validate(&self, options: &SubmitOptions) -> Result<Vec<String>> {
        if options.urls.is_empty() {
            return Err(BatchError::Validation {
                reason: "urls must not be empty".to_string(),
            });
        }
        if options.urls.len() > self.config.max_batch_size {
            return Err(BatchError::Validation {
                reason: format!(
                    "batch size {} exceeds maximum {}",
                    options.urls.len(),
                    self.config.max_batch_size
                ),
            });
        }
        if options.scrape.formats.is_empty() {
            return Err(BatchError::Validation {
                reason: "formats must not be empty".to_string(),
            });
        }

        let mut urls = Vec::with_capacity(options.urls.len());
        for raw in &options.urls {
            let normalized = normalize_scheme(raw);
            match url::Url::parse(&normalized) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                    urls.push(normalized);
                }
                _ => {
                    return Err(BatchError::Validation {
                        reason: format!("invalid url: {raw}"),
                    });
                }
            }
        }
        Ok(urls)
    }

    /// Process every item, then collate, assign the terminal state, and
    /// notify the callback.
    async fn run(&self, job_id: Uuid, urls: Vec<String>, options: ScrapeOptions) {
        if let Err(e) = self.store.mark_processing(job_id).await {
            error!(job_id = %job_id, error = %e, "failed to mark job processing");
            return;
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_items));
        let mut handles = Vec::with_capacity(urls.len());
        for (index, url) in urls.into_iter().enumerate() {
            let dispatcher = self.clone();
            let semaphore = semaphore.clone();
            let options = options.clone();
            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                dispatcher.process_item(job_id, index, &url, &options).await;
            }));
        }
        let _ = join_all(handles).await;

        let job = match self.store.get(job_id).await {
            Ok(job) => job,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "failed to load job after processing");
                return;
            }
        };

        let collated_location = if job.collate_requested {
            let collator = Collator::new(self.artifacts.clone());
            match collator.run(&job).await {
                Ok(location) => Some(location),
                Err(e) => {
                    warn!(job_id = %job_id, error = %e, "collation failed");
                    None
                }
            }
        } else {
            None
        };

        let status = job.terminal_status();
        let job = match self
            .store
            .set_terminal(job_id, status, collated_location)
            .await
        {
            Ok(job) => job,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "failed to set terminal status");
                return;
            }
        };

        info!(
            job_id = %job_id,
            status = ?job.status,
            completed = job.completed_count,
            failed = job.failed_count,
            "batch job finished"
        );

        self.callback.notify(&job).await;
    }

    /// Scrape one item and record its outcome. Errors land in the item's
    /// own slot and never escalate.
    async fn process_item(
        &self,
        job_id: Uuid,
        index: usize,
        url: &str,
        options: &ScrapeOptions,
    ) {
        let outcome = match self.scraper.scrape(url, options).await {
            Ok(output) => match self.store_outputs(job_id, index, options, output).await {
                Ok(outputs) => ItemOutcome::Succeeded(outputs),
                Err(e) => {
                    warn!(job_id = %job_id, index, url = %url, error = %e, "artifact write failed");
                    ItemOutcome::Failed(ItemError::new("artifact", e.to_string()))
                }
            },
            Err(e) => {
                debug!(job_id = %job_id, index, url = %url, error = %e, "item scrape failed");
                ItemOutcome::Failed(ItemError::from(&e))
            }
        };

        if let Err(e) = self.store.update_item(job_id, index, outcome).await {
            error!(job_id = %job_id, index, error = %e, "failed to record item result");
        }
    }

    /// Write one artifact per requested format the scraper produced and
    /// return the addressable locations.
    async fn store_outputs(
        &self,
        job_id: Uuid,
        index: usize,
        options: &ScrapeOptions,
        output: ScrapeOutput,
    ) -> Result<OutputLocations> {
        let mut locations = OutputLocations::default();

        if options.wants(OutputFormat::Markdown) {
            if let Some(markdown) = output.markdown {
                let key = ArtifactKey::item(job_id, index, ArtifactKind::Markdown);
                locations.markdown = Some(self.artifacts.put(&key, markdown.into_bytes()).await?);
            }
        }
        if options.wants(OutputFormat::Structured) {
            if let Some(value) = output.structured {
                let key = ArtifactKey::item(job_id, index, ArtifactKind::Structured);
                let bytes = serde_json::to_vec_pretty(&value)
                    .map_err(|e| BatchError::Artifact(e.to_string()))?;
                locations.structured = Some(self.artifacts.put(&key, bytes).await?);
            }
        }
        if options.wants(OutputFormat::Screenshot) {
            if let Some(bytes) = output.screenshot {
                let key = ArtifactKey::item(job_id, index, ArtifactKind::Screenshot);
                locations.screenshot = Some(self.artifacts.put(&key, bytes).await?);
            }
        }

        Ok(locations)
    }
}

fn normalize_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
