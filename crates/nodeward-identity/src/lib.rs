//! Node identity resolution for nodeward
//!
//! A node's own labels cannot be trusted to say which group it belongs to,
//! since the kubelet can set them. [`IdentityResolver`] answers that question
//! from a [`NodeIdentifier`], a provider lookup keyed by the node's
//! `spec.providerID` that the node cannot influence.

#![deny(missing_docs)]

mod provider;
mod resolver;
mod static_map;

pub use provider::{IdentifyError, NodeIdentifier, NodeIdentity};
pub use resolver::{Identity, IdentityResolver};
pub use static_map::StaticIdentifier;

use k8s_openapi::api::core::v1::Node;

/// The node's infrastructure identifier, if set and non-empty
pub fn provider_id(node: &Node) -> Option<&str> {
    node.spec
        .as_ref()
        .and_then(|spec| spec.provider_id.as_deref())
        .filter(|id| !id.is_empty())
}
