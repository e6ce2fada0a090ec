//! In-memory artifact store for single-process deployments and tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::artifacts::{ArtifactKey, ArtifactStore, StoredArtifact};

/// Artifact store backed by a lock-guarded map, addressed under a base URL.
///
/// Suitable when artifacts are served back by the same process (see the
/// server's artifact route). An object-storage backend would implement the
/// same trait with bucket URLs.
pub struct MemoryArtifactStore {
    base_url: String,
    objects: RwLock<HashMap<String, StoredArtifact>>,
}

impl MemoryArtifactStore {
    /// Create a store whose artifact URLs live under `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of artifacts written so far.
    pub fn object_count(&self) -> usize {
        self.objects.read().unwrap().len()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    fn url_for(&self, key: &ArtifactKey) -> String {
        format!("{}/{}", self.base_url, key.object_path())
    }

    async fn put(&self, key: &ArtifactKey, bytes: Vec<u8>) -> Result<String> {
        let artifact = StoredArtifact {
            content_type: key.kind().content_type().to_string(),
            bytes,
        };
        self.objects
            .write()
            .unwrap()
            .insert(key.object_path(), artifact);
        Ok(self.url_for(key))
    }

    async fn get(&self, path: &str) -> Result<Option<StoredArtifact>> {
        Ok(self.objects.read().unwrap().get(path).cloned())
    }
}
