//! Identity provider backed by a static inventory file
//!
//! The inventory maps each node's providerID to its group and lifecycle
//! class:
//!
//! ```yaml
//! nodes:
//!   aws:///us-east-1a/i-0abc123:
//!     group: workers-a
//!     lifecycle: spot
//!   aws:///us-east-1b/i-0def456:
//!     group: control-plane-us-east-1b
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use nodeward_common::Error;
use serde::Deserialize;
use tracing::info;

use crate::{provider_id, IdentifyError, NodeIdentifier, NodeIdentity};

#[derive(Debug, Default, Deserialize)]
struct Inventory {
    #[serde(default)]
    nodes: HashMap<String, NodeIdentity>,
}

/// Identifies nodes from a providerID inventory loaded at startup
#[derive(Debug, Default)]
pub struct StaticIdentifier {
    nodes: HashMap<String, NodeIdentity>,
}

impl StaticIdentifier {
    /// Build an identifier from inventory YAML (or JSON)
    pub fn from_yaml(source: &str, contents: &[u8]) -> Result<Self, Error> {
        let inventory: Inventory = serde_yaml::from_slice(contents)
            .map_err(|e| Error::config(format!("cannot parse identity map {source}: {e}")))?;
        Ok(Self {
            nodes: inventory.nodes,
        })
    }

    /// Load an inventory file
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let contents = tokio::fs::read(path).await.map_err(|e| {
            Error::config(format!("cannot read identity map {}: {e}", path.display()))
        })?;
        let identifier = Self::from_yaml(&path.display().to_string(), &contents)?;
        info!(
            path = %path.display(),
            nodes = identifier.len(),
            "loaded static identity map"
        );
        Ok(identifier)
    }

    /// Number of providerIDs in the inventory
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the inventory is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[async_trait]
impl NodeIdentifier for StaticIdentifier {
    async fn identify_node(&self, node: &Node) -> Result<NodeIdentity, IdentifyError> {
        let id = provider_id(node).ok_or_else(|| {
            IdentifyError::NotFound(format!("node {} has no providerID", node.name_any()))
        })?;
        self.nodes
            .get(id)
            .cloned()
            .ok_or_else(|| IdentifyError::NotFound(format!("providerID {id} not in inventory")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::NodeSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    const INVENTORY: &str = r#"
nodes:
  aws:///us-east-1a/i-0abc123:
    group: workers-a
    lifecycle: spot
  aws:///us-east-1b/i-0def456:
    group: masters-us-east-1b
"#;

    fn node_with_provider_id(id: &str) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some("n1".to_string()),
                ..Default::default()
            },
            spec: Some(NodeSpec {
                provider_id: Some(id.to_string()),
                ..Default::default()
            }),
            status: None,
        }
    }

    #[tokio::test]
    async fn identifies_known_provider_ids() {
        let identifier = StaticIdentifier::from_yaml("test", INVENTORY.as_bytes()).unwrap();
        assert_eq!(identifier.len(), 2);

        let found = identifier
            .identify_node(&node_with_provider_id("aws:///us-east-1a/i-0abc123"))
            .await
            .unwrap();
        assert_eq!(found.group, "workers-a");
        assert_eq!(found.lifecycle, "spot");

        let found = identifier
            .identify_node(&node_with_provider_id("aws:///us-east-1b/i-0def456"))
            .await
            .unwrap();
        assert_eq!(found.lifecycle, "");
    }

    #[tokio::test]
    async fn unknown_provider_id_is_not_found() {
        let identifier = StaticIdentifier::from_yaml("test", INVENTORY.as_bytes()).unwrap();
        let err = identifier
            .identify_node(&node_with_provider_id("aws:///us-east-1c/i-missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentifyError::NotFound(_)));
    }

    #[test]
    fn malformed_inventory_is_a_config_error() {
        let err = StaticIdentifier::from_yaml("test", b"nodes: [not, a, map]").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identities.yaml");
        std::fs::write(&path, INVENTORY).unwrap();

        let identifier = StaticIdentifier::load(&path).await.unwrap();
        assert!(!identifier.is_empty());

        let missing = StaticIdentifier::load(&dir.path().join("nope.yaml")).await;
        assert!(matches!(missing, Err(Error::Config { .. })));
    }
}
