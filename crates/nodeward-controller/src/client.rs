//! Node access for the reconciler

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use nodeward_common::{Error, FIELD_MANAGER};

#[cfg(test)]
use mockall::automock;

/// Trait abstracting the Kubernetes node operations the reconciler needs
///
/// This trait allows mocking the Kubernetes client in tests while using
/// the real client in production.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Fetch a node by name; `None` if it no longer exists
    async fn get(&self, name: &str) -> Result<Option<Node>, Error>;

    /// Set `update` and remove `delete` on the node's labels in one call
    ///
    /// Labels not mentioned are left untouched.
    async fn patch_labels(
        &self,
        name: &str,
        update: &BTreeMap<String, String>,
        delete: &BTreeSet<String>,
    ) -> Result<(), Error>;
}

/// Real Kubernetes client implementation
pub struct KubeNodeClient {
    api: Api<Node>,
}

impl KubeNodeClient {
    /// Create a new KubeNodeClient wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

#[async_trait]
impl NodeClient for KubeNodeClient {
    async fn get(&self, name: &str) -> Result<Option<Node>, Error> {
        Ok(self.api.get_opt(name).await?)
    }

    async fn patch_labels(
        &self,
        name: &str,
        update: &BTreeMap<String, String>,
        delete: &BTreeSet<String>,
    ) -> Result<(), Error> {
        let patch = label_patch(update, delete);
        let params = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };

        self.api
            .patch(name, &params, &Patch::Merge(&patch))
            .await
            .map_err(|e| Error::patch(name, e.to_string()))?;

        Ok(())
    }
}

/// JSON merge patch that sets `update` and nulls out `delete`
pub fn label_patch(
    update: &BTreeMap<String, String>,
    delete: &BTreeSet<String>,
) -> serde_json::Value {
    let mut labels = serde_json::Map::new();
    for (key, value) in update {
        labels.insert(key.clone(), serde_json::Value::String(value.clone()));
    }
    for key in delete {
        labels.insert(key.clone(), serde_json::Value::Null);
    }

    serde_json::json!({
        "metadata": {
            "labels": labels
        }
    })
}
