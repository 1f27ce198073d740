//! Provider identity lookup seam

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use nodeward_common::LookupFailure;
use serde::Deserialize;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// What a provider knows about a node
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct NodeIdentity {
    /// Name of the group the node was launched in
    pub group: String,
    /// Provisioning class such as `spot`; empty for standard capacity
    #[serde(default)]
    pub lifecycle: String,
}

/// Errors returned by identity providers
#[derive(Debug, Error)]
pub enum IdentifyError {
    /// The provider has no record of the node
    #[error("no instance found: {0}")]
    NotFound(String),

    /// The provider rejected our credentials
    #[error("unauthorized: {0}")]
    Auth(String),

    /// The provider could not be reached
    #[error("transport failure: {0}")]
    Transport(String),
}

impl IdentifyError {
    /// The failure class of this error
    pub fn failure(&self) -> LookupFailure {
        match self {
            Self::NotFound(_) => LookupFailure::NotFound,
            Self::Auth(_) => LookupFailure::Auth,
            Self::Transport(_) => LookupFailure::Transport,
        }
    }

    /// Provider-supplied detail
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m) | Self::Auth(m) | Self::Transport(m) => m,
        }
    }
}

/// Securely maps nodes to the group they were launched in
///
/// Implementations key the lookup on `spec.providerID` and consult a source
/// the node cannot write to (a cloud API, a static inventory).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NodeIdentifier: Send + Sync {
    /// Identify the group and lifecycle class of `node`
    async fn identify_node(&self, node: &Node) -> Result<NodeIdentity, IdentifyError>;
}
