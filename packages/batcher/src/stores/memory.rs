//! In-memory job store for single-process deployments and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::error::{BatchError, Result};
use crate::traits::store::{ItemOutcome, JobStore};
use crate::types::job::{BatchJob, BatchStatus, ItemStatus};

/// Job store backed by a lock-guarded map.
///
/// Jobs live for the lifetime of the process. Every mutation happens under
/// a single write lock, so a concurrent reader never observes a counter
/// bumped without its item slot written.
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<Uuid, BatchJob>>,
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryJobStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of jobs currently tracked.
    pub fn job_count(&self) -> usize {
        self.jobs.read().unwrap().len()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job: BatchJob) -> Result<()> {
        self.jobs.write().unwrap().insert(job.id, job);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<BatchJob> {
        self.jobs
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(BatchError::NotFound { id })
    }

    async fn mark_processing(&self, id: Uuid) -> Result<()> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs.get_mut(&id).ok_or(BatchError::NotFound { id })?;
        if job.status == BatchStatus::Pending {
            job.status = BatchStatus::Processing;
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_item(&self, id: Uuid, index: usize, outcome: ItemOutcome) -> Result<BatchJob> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs.get_mut(&id).ok_or(BatchError::NotFound { id })?;

        let Some(item) = job.items.get_mut(index) else {
            return Err(BatchError::Storage(format!(
                "item index {index} out of bounds for job {id}"
            )));
        };

        if item.status.is_terminal() {
            warn!(job_id = %id, index, "ignoring duplicate item update");
            return Ok(job.clone());
        }

        match outcome {
            ItemOutcome::Succeeded(outputs) => {
                item.status = ItemStatus::Succeeded;
                item.outputs = outputs;
                job.completed_count += 1;
            }
            ItemOutcome::Failed(error) => {
                item.status = ItemStatus::Failed;
                item.error = Some(error);
                job.failed_count += 1;
            }
        }
        job.updated_at = Utc::now();

        Ok(job.clone())
    }

    async fn set_terminal(
        &self,
        id: Uuid,
        status: BatchStatus,
        collated_location: Option<String>,
    ) -> Result<BatchJob> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs.get_mut(&id).ok_or(BatchError::NotFound { id })?;

        job.status = status;
        if collated_location.is_some() {
            job.collated_location = collated_location;
        }
        job.updated_at = Utc::now();

        Ok(job.clone())
    }
}
