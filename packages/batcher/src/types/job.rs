//! Batch job data model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::error::ScrapeError;

// ============================================================================
// Enums
// ============================================================================

/// Aggregate status of a batch job.
///
/// `pending → processing → {completed, failed}`. A job completes when every
/// item is terminal and at least one succeeded; it fails only when every
/// item failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Failed)
    }
}

/// Status of one item within a batch.
///
/// Each item transitions `pending → {succeeded, failed}` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Pending,
    Succeeded,
    Failed,
}

impl ItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Succeeded | ItemStatus::Failed)
    }
}

// ============================================================================
// Item model
// ============================================================================

/// Error captured on a failed item: a machine-readable kind plus a
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub kind: String,
    pub message: String,
}

impl ItemError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl From<&ScrapeError> for ItemError {
    fn from(err: &ScrapeError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Addressable locations of one item's generated artifacts, populated only
/// on success and only for the formats requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLocations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

impl OutputLocations {
    pub fn is_empty(&self) -> bool {
        self.markdown.is_none() && self.structured.is_none() && self.screenshot.is_none()
    }
}

/// One unit of work: a single URL and its independent terminal outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResult {
    pub url: String,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "OutputLocations::is_empty")]
    pub outputs: OutputLocations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemError>,
}

impl ItemResult {
    /// A freshly submitted item, awaiting processing.
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: ItemStatus::Pending,
            outputs: OutputLocations::default(),
            error: None,
        }
    }
}

// ============================================================================
// Job model
// ============================================================================

/// The aggregate root: one submission of one or more URLs tracked under a
/// single identifier.
///
/// Created atomically with all items pending; mutated only through the
/// [`JobStore`](crate::traits::store::JobStore), which guarantees counters
/// and item slots stay consistent under concurrent reads.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct BatchJob {
    #[builder(default = Uuid::now_v7())]
    #[serde(rename = "job_id")]
    pub id: Uuid,

    #[builder(default)]
    pub status: BatchStatus,

    /// Count of items submitted; immutable after creation.
    pub total: usize,

    /// Items that succeeded. Monotonically increasing.
    #[builder(default = 0)]
    pub completed_count: usize,

    /// Items that failed. Monotonically increasing.
    #[builder(default = 0)]
    pub failed_count: usize,

    /// Index-stable: the Nth input URL always maps to the Nth slot,
    /// regardless of completion order.
    pub items: Vec<ItemResult>,

    #[builder(default = false)]
    pub collate_requested: bool,

    /// Set only if collation ran and succeeded.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collated_location: Option<String>,

    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,

    #[builder(default)]
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub callback_headers: HashMap<String, String>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,

    /// Bumped on every item completion and on the terminal transition.
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl BatchJob {
    /// Create a pending job with every item slot pre-populated, so a status
    /// read at any time sees exactly `total` items.
    pub fn new(
        urls: Vec<String>,
        collate: bool,
        callback_url: Option<String>,
        callback_headers: HashMap<String, String>,
    ) -> Self {
        let items: Vec<ItemResult> = urls.into_iter().map(ItemResult::pending).collect();
        Self::builder()
            .total(items.len())
            .items(items)
            .collate_requested(collate)
            .callback_url(callback_url)
            .callback_headers(callback_headers)
            .build()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether every item has reached a terminal status.
    pub fn all_items_terminal(&self) -> bool {
        self.completed_count + self.failed_count == self.total
    }

    /// The aggregate status this job should carry once all items are
    /// terminal: completed when at least one item succeeded, failed when
    /// every item failed.
    pub fn terminal_status(&self) -> BatchStatus {
        if self.completed_count > 0 {
            BatchStatus::Completed
        } else {
            BatchStatus::Failed
        }
    }
}
