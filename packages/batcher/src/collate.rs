//! Collation of item outputs into one combined document.
//!
//! Runs only after every item is terminal. Successful items' markdown is
//! read back through the artifact store, concatenated in original input
//! order under per-item headings, and the combined document is written
//! through the same artifact-addressing mechanism used for individual
//! items.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::traits::artifacts::{ArtifactKey, ArtifactKind, ArtifactStore};
use crate::types::job::{BatchJob, ItemStatus};

/// Merges a finished job's outputs into a single combined document.
pub struct Collator {
    artifacts: Arc<dyn ArtifactStore>,
}

impl Collator {
    pub fn new(artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { artifacts }
    }

    /// Build and store the combined document; returns its location.
    ///
    /// Expects all items terminal. Zero successful items still produces a
    /// document (noting total failure) rather than an error.
    pub async fn run(&self, job: &BatchJob) -> Result<String> {
        let mut contents: Vec<Option<String>> = Vec::with_capacity(job.items.len());
        for (index, item) in job.items.iter().enumerate() {
            if item.status != ItemStatus::Succeeded {
                contents.push(None);
                continue;
            }
            let key = ArtifactKey::item(job.id, index, ArtifactKind::Markdown);
            let content = self
                .artifacts
                .get(&key.object_path())
                .await?
                .map(|artifact| String::from_utf8_lossy(&artifact.bytes).into_owned());
            if content.is_none() {
                // Succeeded without a markdown artifact (non-markdown formats)
                debug!(job_id = %job.id, index, "no markdown artifact to collate");
            }
            contents.push(content);
        }

        let document = render_collated(job, &contents);
        let location = self
            .artifacts
            .put(&ArtifactKey::collated(job.id), document.into_bytes())
            .await?;

        info!(job_id = %job.id, location = %location, "collated document written");
        Ok(location)
    }
}

/// Render the combined markdown document: successful items in input order,
/// each under a heading naming its source URL, with a summary of failed
/// items when any exist.
pub fn render_collated(job: &BatchJob, contents: &[Option<String>]) -> String {
    let mut doc = String::from("# Batch results\n");

    if job.completed_count == 0 {
        doc.push_str(&format!(
            "\nAll {} items failed; no content was extracted.\n",
            job.total
        ));
    } else {
        for (item, content) in job.items.iter().zip(contents) {
            let Some(content) = content else { continue };
            doc.push_str(&format!("\n## {}\n\n", item.url));
            doc.push_str(content.trim_end());
            doc.push('\n');
        }
    }

    if job.failed_count > 0 {
        doc.push_str("\n---\n\n## Failed items\n\n");
        for item in &job.items {
            if item.status != ItemStatus::Failed {
                continue;
            }
            match &item.error {
                Some(error) => doc.push_str(&format!(
                    "- {} ({}): {}\n",
                    item.url, error.kind, error.message
                )),
                None => doc.push_str(&format!("- {}\n", item.url)),
            }
        }
    }

    doc
}
