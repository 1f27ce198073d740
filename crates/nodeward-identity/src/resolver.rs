//! Resolves a node's group name and lifecycle class

use std::sync::Arc;

use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;
use nodeward_common::labels::{is_valid_group_name, is_valid_lifecycle_class, GROUP_LABEL};
use nodeward_common::{Error, Result};
use tracing::debug;

use crate::{provider_id, NodeIdentifier, NodeIdentity};

/// A node's resolved identity; computed per reconcile and never stored
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    /// Group the node belongs to
    pub group_name: String,
    /// Lifecycle class; empty means no special lifecycle
    pub lifecycle_class: String,
}

/// Maps observed nodes to their declared group and lifecycle class
#[derive(Clone)]
pub struct IdentityResolver {
    identifier: Arc<dyn NodeIdentifier>,
}

impl IdentityResolver {
    /// Create a resolver backed by `identifier`
    pub fn new(identifier: Arc<dyn NodeIdentifier>) -> Self {
        Self { identifier }
    }

    /// Resolve the identity of `node`
    ///
    /// A non-empty [`GROUP_LABEL`] is trusted as-is. It lives under
    /// `node-restriction.kubernetes.io/`, which NodeRestriction bars kubelets
    /// from writing, so only cluster-side writers can have set it. Without it
    /// the node must carry a providerID, and the provider's answer decides
    /// the group. The provider is consulted at most once per call.
    ///
    /// The group name must be usable as a label value and the lifecycle
    /// class as part of a label name; either failing is a `Validation` error.
    pub async fn identify(&self, node: &Node) -> Result<Identity> {
        let name = node.name_any();
        let labeled_group = node
            .labels()
            .get(GROUP_LABEL)
            .filter(|group| !group.is_empty())
            .cloned();

        let identity = match labeled_group {
            Some(group_name) => {
                // Lifecycle still comes from the provider whenever it can be asked
                let lifecycle_class = match provider_id(node) {
                    Some(_) => self.lookup(&name, node).await?.lifecycle,
                    None => String::new(),
                };
                debug!(node = %name, group = %group_name, "using group label");
                Identity {
                    group_name,
                    lifecycle_class,
                }
            }
            None => {
                if provider_id(node).is_none() {
                    return Err(Error::validation(&name, "node providerID not set"));
                }
                let found = self.lookup(&name, node).await?;
                if found.group.is_empty() {
                    return Err(Error::validation(
                        &name,
                        "provider did not associate the node with a group",
                    ));
                }
                debug!(node = %name, group = %found.group, "identified node via provider");
                Identity {
                    group_name: found.group,
                    lifecycle_class: found.lifecycle,
                }
            }
        };

        if !is_valid_group_name(&identity.group_name) {
            return Err(Error::validation(
                &name,
                format!("group {:?} is not a valid label value", identity.group_name),
            ));
        }

        if !is_valid_lifecycle_class(&identity.lifecycle_class) {
            return Err(Error::validation(
                &name,
                format!(
                    "invalid lifecycle class {:?} for node",
                    identity.lifecycle_class
                ),
            ));
        }

        Ok(identity)
    }

    async fn lookup(&self, name: &str, node: &Node) -> Result<NodeIdentity> {
        self.identifier
            .identify_node(node)
            .await
            .map_err(|e| Error::identity_lookup(name, e.failure(), e.message()))
    }
}
