//! Artifact addressing and storage.
//!
//! Artifacts (markdown, structured JSON, screenshots, collated documents)
//! are addressed by keys derived from the job id and item index alone, so
//! their locations are predictable before the artifacts exist. The same
//! addressing function backs predictions, writes, and retrieval.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::job::OutputLocations;
use crate::types::options::OutputFormat;

/// What an artifact holds; determines its object path and content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Markdown,
    Structured,
    Screenshot,
    /// The combined document produced by collation.
    Collated,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Markdown | ArtifactKind::Collated => "md",
            ArtifactKind::Structured => "json",
            ArtifactKind::Screenshot => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Markdown | ArtifactKind::Collated => "text/markdown",
            ArtifactKind::Structured => "application/json",
            ArtifactKind::Screenshot => "image/png",
        }
    }
}

impl From<OutputFormat> for ArtifactKind {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Markdown => ArtifactKind::Markdown,
            OutputFormat::Structured => ArtifactKind::Structured,
            OutputFormat::Screenshot => ArtifactKind::Screenshot,
        }
    }
}

/// Deterministic address of one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactKey {
    job_id: Uuid,
    index: Option<usize>,
    kind: ArtifactKind,
}

impl ArtifactKey {
    /// Key for one item's artifact of the given kind.
    pub fn item(job_id: Uuid, index: usize, kind: ArtifactKind) -> Self {
        debug_assert!(kind != ArtifactKind::Collated);
        Self {
            job_id,
            index: Some(index),
            kind,
        }
    }

    /// Key for the job's collated document.
    pub fn collated(job_id: Uuid) -> Self {
        Self {
            job_id,
            index: None,
            kind: ArtifactKind::Collated,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Object path under the store root, e.g. `jobs/<job_id>/0.md` or
    /// `jobs/<job_id>/collated.md`.
    pub fn object_path(&self) -> String {
        match self.index {
            Some(index) => format!("jobs/{}/{}.{}", self.job_id, index, self.kind.extension()),
            None => format!("jobs/{}/collated.{}", self.job_id, self.kind.extension()),
        }
    }
}

/// A stored artifact body.
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Addressable storage for generated artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// The addressable URL an artifact will have once written. Pure and
    /// deterministic, so callers can predict locations before processing
    /// finishes.
    fn url_for(&self, key: &ArtifactKey) -> String;

    /// Write an artifact body and return its addressable URL (equal to
    /// `url_for(key)`).
    async fn put(&self, key: &ArtifactKey, bytes: Vec<u8>) -> Result<String>;

    /// Fetch a stored artifact by object path; `None` until written.
    async fn get(&self, path: &str) -> Result<Option<StoredArtifact>>;
}

/// Predicted locations for one item, one entry per requested format.
pub fn predicted_outputs(
    store: &dyn ArtifactStore,
    job_id: Uuid,
    index: usize,
    formats: &[OutputFormat],
) -> OutputLocations {
    let mut outputs = OutputLocations::default();
    for format in formats {
        let url = store.url_for(&ArtifactKey::item(job_id, index, (*format).into()));
        match format {
            OutputFormat::Markdown => outputs.markdown = Some(url),
            OutputFormat::Structured => outputs.structured = Some(url),
            OutputFormat::Screenshot => outputs.screenshot = Some(url),
        }
    }
    outputs
}
