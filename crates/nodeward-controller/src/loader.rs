//! Loads typed manifests through the shared cache

use std::sync::Arc;
use std::time::Duration;

use nodeward_common::manifest::{decode_cluster, decode_group, ClusterManifest, GroupManifest};
use nodeward_common::{Error, Result, DEFAULT_MANIFEST_TTL};
use nodeward_store::{ConfigCache, StoreRoot};

/// File name of the cluster manifest under the store root
pub const CLUSTER_MANIFEST_FILE: &str = "cluster.spec";

/// Directory holding one manifest per group under the store root
pub const GROUP_MANIFEST_DIR: &str = "groups";

/// Resolves manifest paths under a store root and decodes what the cache returns
#[derive(Clone, Debug)]
pub struct ManifestLoader {
    root: StoreRoot,
    cache: Arc<ConfigCache>,
    ttl: Duration,
}

impl ManifestLoader {
    /// Create a loader using the default one-hour ttl
    pub fn new(root: StoreRoot, cache: Arc<ConfigCache>) -> Self {
        Self::with_ttl(root, cache, DEFAULT_MANIFEST_TTL)
    }

    /// Create a loader with a custom ttl
    pub fn with_ttl(root: StoreRoot, cache: Arc<ConfigCache>, ttl: Duration) -> Self {
        Self { root, cache, ttl }
    }

    /// Load the cluster manifest
    pub async fn load_cluster(&self) -> Result<ClusterManifest> {
        let path = self
            .root
            .join(&[CLUSTER_MANIFEST_FILE])
            .map_err(|e| e.into_error("Cluster"))?;
        let bytes = self
            .cache
            .read(&path, self.ttl)
            .await
            .map_err(|e| e.into_error("Cluster"))?;
        decode_cluster(&path.to_string(), &bytes)
    }

    /// Load the manifest of `group`, which `node` was resolved into
    ///
    /// The manifest's own name must match the group it was loaded for.
    pub async fn load_group(&self, node: &str, group: &str) -> Result<GroupManifest> {
        let path = self
            .root
            .join(&[GROUP_MANIFEST_DIR, group])
            .map_err(|e| Error::validation(node, format!("unusable group name: {e}")))?;
        let bytes = self
            .cache
            .read(&path, self.ttl)
            .await
            .map_err(|e| e.into_error("Group"))?;

        let manifest = decode_group(&path.to_string(), &bytes)?;
        if manifest.metadata.name != group {
            return Err(Error::decode(
                path.to_string(),
                format!(
                    "manifest is named {:?} but was loaded for group {:?}",
                    manifest.metadata.name, group
                ),
            ));
        }
        Ok(manifest)
    }
}
