//! In-memory manifest store

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::{ManifestPath, ManifestStore, StoreError};

/// Holds manifests in a map; contents can be replaced at any time
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<HashMap<ManifestPath, Bytes>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `contents` at `path`, replacing anything already there
    pub fn put(&self, path: &ManifestPath, contents: impl Into<Bytes>) {
        self.files.write().insert(path.clone(), contents.into());
    }

    /// Remove whatever is stored at `path`
    pub fn remove(&self, path: &ManifestPath) {
        self.files.write().remove(path);
    }
}

#[async_trait]
impl ManifestStore for MemoryStore {
    async fn read_path(&self, path: &ManifestPath) -> Result<Bytes, StoreError> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })
    }
}
