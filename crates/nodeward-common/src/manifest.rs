//! Declared configuration documents read from the manifest store
//!
//! Manifests are YAML (or JSON) documents tagged by `kind`. Decoding yields a
//! [`Manifest`] variant; callers that expect a particular kind use
//! [`decode_cluster`] or [`decode_group`], which turn a kind mismatch into a
//! decode error.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Object metadata shared by all manifests
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestMeta {
    /// Manifest name
    pub name: String,
}

/// Cluster-wide declared configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterManifest {
    /// Schema version of the document
    #[serde(default)]
    pub api_version: Option<String>,
    /// Cluster metadata
    pub metadata: ManifestMeta,
    /// Cluster spec
    #[serde(default)]
    pub spec: ClusterSpec,
}

/// Cluster spec fields nodeward reads; everything else is ignored
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Kubernetes version the cluster runs
    #[serde(default)]
    pub kubernetes_version: Option<String>,
}

/// Per-group declared configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupManifest {
    /// Schema version of the document
    #[serde(default)]
    pub api_version: Option<String>,
    /// Group metadata; `name` is the group name
    pub metadata: ManifestMeta,
    /// Group spec
    pub spec: GroupSpec,
}

/// Group spec fields nodeward reads
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Role every node in the group plays
    pub role: GroupRole,
}

/// Semantic role of a node group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupRole {
    /// Runs the control plane (legacy documents spell this `Master`)
    #[serde(alias = "Master")]
    ControlPlane,
    /// Runs only the API server
    #[serde(rename = "APIServer")]
    ApiServer,
    /// Runs workloads
    Node,
}

/// A decoded manifest, tagged by its `kind` field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Manifest {
    /// `kind: Cluster`
    Cluster(ClusterManifest),
    /// `kind: Group`
    Group(GroupManifest),
}

impl Manifest {
    /// The `kind` tag of this manifest
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cluster(_) => "Cluster",
            Self::Group(_) => "Group",
        }
    }
}

/// Decode manifest bytes read from `path`
pub fn decode(path: &str, bytes: &[u8]) -> Result<Manifest> {
    serde_yaml::from_slice(bytes).map_err(|e| Error::decode(path, e.to_string()))
}

/// Decode bytes that must hold a cluster manifest
pub fn decode_cluster(path: &str, bytes: &[u8]) -> Result<ClusterManifest> {
    match decode(path, bytes)? {
        Manifest::Cluster(cluster) => Ok(cluster),
        other => Err(Error::decode(
            path,
            format!("unexpected kind {}, expected Cluster", other.kind()),
        )),
    }
}

/// Decode bytes that must hold a group manifest
pub fn decode_group(path: &str, bytes: &[u8]) -> Result<GroupManifest> {
    match decode(path, bytes)? {
        Manifest::Group(group) => Ok(group),
        other => Err(Error::decode(
            path,
            format!("unexpected kind {}, expected Group", other.kind()),
        )),
    }
}
