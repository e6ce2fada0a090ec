//! Job store abstraction.
//!
//! An explicit, injectable seam that keeps the concurrency-control
//! mechanism out of the dispatcher. The in-memory implementation
//! ([`MemoryJobStore`](crate::stores::MemoryJobStore)) holds job state for
//! the lifetime of the process; a durable backend can be substituted
//! without changing callers.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::job::{BatchJob, BatchStatus, ItemError, OutputLocations};

/// Terminal outcome of one item.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Succeeded(OutputLocations),
    Failed(ItemError),
}

/// Mutable state of every batch job, keyed by id.
///
/// The store is the only resource mutated by multiple concurrent actors
/// (item-completion writers, the collator, the callback dispatcher, and
/// status readers). Implementations must make each mutation atomic with
/// respect to readers: a snapshot never shows a counter bumped without the
/// corresponding item slot written, or vice versa. Jobs are independent;
/// no cross-job locking is required.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a freshly created job. All items must be pending.
    async fn create(&self, job: BatchJob) -> Result<()>;

    /// Snapshot of a job by id. `NotFound` for unknown ids.
    async fn get(&self, id: Uuid) -> Result<BatchJob>;

    /// Move a pending job to processing, the instant the first item begins
    /// work. No-op if the job is already past pending.
    async fn mark_processing(&self, id: Uuid) -> Result<()>;

    /// Record one item's terminal outcome at its original index and bump
    /// the matching aggregate counter atomically with the item write.
    ///
    /// An item transitions exactly once; a second write to the same index
    /// is ignored. Returns the updated snapshot.
    async fn update_item(&self, id: Uuid, index: usize, outcome: ItemOutcome) -> Result<BatchJob>;

    /// Assign the terminal job status and, if collation produced one, the
    /// collated artifact location. Returns the terminal snapshot.
    async fn set_terminal(
        &self,
        id: Uuid,
        status: BatchStatus,
        collated_location: Option<String>,
    ) -> Result<BatchJob>;
}
