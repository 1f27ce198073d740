//! Manifest storage for nodeward
//!
//! Manifests live in a path-addressed store rooted at a base location given
//! once at startup. [`ConfigCache`] sits in front of any [`ManifestStore`]
//! and serves raw bytes for a bounded time before fetching again.

#![deny(missing_docs)]

pub mod cache;
pub mod fs;
pub mod memory;
pub mod path;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

pub use cache::ConfigCache;
pub use fs::FsStore;
pub use memory::MemoryStore;
pub use path::{ManifestPath, StoreRoot};

/// Errors returned by manifest stores
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Nothing is stored at the path
    #[error("{path} not found")]
    NotFound {
        /// Path that was read
        path: String,
    },

    /// The backend failed to read the path
    #[error("error reading {path}: {message}")]
    Io {
        /// Path that was read
        path: String,
        /// Description of what failed
        message: String,
    },

    /// A path segment would escape or malform the store hierarchy
    #[error("invalid path segment {segment:?}")]
    InvalidSegment {
        /// The rejected segment
        segment: String,
    },
}

impl StoreError {
    /// Convert into the shared error type, naming the manifest kind that was expected
    pub fn into_error(self, kind: &str) -> nodeward_common::Error {
        match self {
            Self::NotFound { path } => nodeward_common::Error::not_found(kind, path),
            Self::Io { path, message } => nodeward_common::Error::store(path, message),
            Self::InvalidSegment { segment } => nodeward_common::Error::config(format!(
                "cannot address {kind} manifest: invalid path segment {segment:?}"
            )),
        }
    }
}

/// A path-addressed store of manifest documents
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Read the full contents stored at `path`
    async fn read_path(&self, path: &ManifestPath) -> Result<Bytes, StoreError>;
}
