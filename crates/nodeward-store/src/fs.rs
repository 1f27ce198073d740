//! Local filesystem manifest store

use std::io::ErrorKind;

use async_trait::async_trait;
use bytes::Bytes;
use nodeward_common::Error;
use tracing::trace;

use crate::{ManifestPath, ManifestStore, StoreError, StoreRoot};

/// Reads manifests from files below a local directory
#[derive(Clone, Debug)]
pub struct FsStore {
    root: StoreRoot,
}

impl FsStore {
    /// Open a store at `root`, which must be an existing directory
    pub async fn open(root: StoreRoot) -> Result<Self, Error> {
        let metadata = tokio::fs::metadata(root.dir()).await.map_err(|e| {
            Error::config(format!(
                "cannot open config base {}: {}",
                root.dir().display(),
                e
            ))
        })?;
        if !metadata.is_dir() {
            return Err(Error::config(format!(
                "config base {} is not a directory",
                root.dir().display()
            )));
        }
        Ok(Self { root })
    }

    /// The root this store reads below
    pub fn root(&self) -> &StoreRoot {
        &self.root
    }
}

#[async_trait]
impl ManifestStore for FsStore {
    async fn read_path(&self, path: &ManifestPath) -> Result<Bytes, StoreError> {
        trace!(path = %path, "reading manifest file");
        match tokio::fs::read(path.as_path()).await {
            Ok(contents) => Ok(Bytes::from(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(StoreError::Io {
                path: path.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
