//! Node label scheme and the policy that computes desired labels
//!
//! Role labels exist in two generations. Older tooling reads the legacy keys
//! (`node-role.kubernetes.io/master`, `.../node`) while current tooling reads
//! `.../control-plane` and `.../worker`, so every generation's key for a role
//! is set together.

use std::collections::BTreeMap;

use crate::manifest::{ClusterManifest, GroupManifest, GroupRole};

/// Namespace shared by all role labels
pub const ROLE_LABEL_NAMESPACE: &str = "node-role.kubernetes.io";

/// Legacy control-plane role label
pub const ROLE_LABEL_MASTER_LEGACY: &str = "node-role.kubernetes.io/master";
/// Current control-plane role label
pub const ROLE_LABEL_CONTROL_PLANE: &str = "node-role.kubernetes.io/control-plane";
/// API-server role label (same key in both generations)
pub const ROLE_LABEL_API_SERVER: &str = "node-role.kubernetes.io/api-server";
/// Legacy worker role label
pub const ROLE_LABEL_NODE_LEGACY: &str = "node-role.kubernetes.io/node";
/// Current worker role label
pub const ROLE_LABEL_WORKER: &str = "node-role.kubernetes.io/worker";

/// Label carrying the node's group name
///
/// Also the explicit, cluster-applied label the identity resolver trusts.
pub const GROUP_LABEL: &str = "node-restriction.kubernetes.io/nodeward-group";

/// Value set on role labels
pub const ROLE_LABEL_VALUE: &str = "true";

/// Every label key nodeward may prune, across all label-scheme generations
pub const MANAGED_LABEL_KEYS: &[&str] = &[
    ROLE_LABEL_MASTER_LEGACY,
    ROLE_LABEL_CONTROL_PLANE,
    ROLE_LABEL_API_SERVER,
    ROLE_LABEL_NODE_LEGACY,
    ROLE_LABEL_WORKER,
    GROUP_LABEL,
];

/// Longest label value, and longest label name segment
pub const MAX_LABEL_VALUE_LEN: usize = 63;

/// Longest lifecycle class that still yields a valid `<class>-worker` name
pub const MAX_LIFECYCLE_CLASS_LEN: usize = MAX_LABEL_VALUE_LEN - "-worker".len();

/// Whether `key` is one of the managed label keys
pub fn is_managed(key: &str) -> bool {
    MANAGED_LABEL_KEYS.contains(&key)
}

/// Role label keys for `role`, one per label-scheme generation
pub fn role_label_keys(role: GroupRole) -> &'static [&'static str] {
    match role {
        GroupRole::ControlPlane => &[ROLE_LABEL_MASTER_LEGACY, ROLE_LABEL_CONTROL_PLANE],
        GroupRole::ApiServer => &[ROLE_LABEL_API_SERVER],
        GroupRole::Node => &[ROLE_LABEL_NODE_LEGACY, ROLE_LABEL_WORKER],
    }
}

/// Label key marking a node's lifecycle class, e.g. `node-role.kubernetes.io/spot-worker`
pub fn lifecycle_label_key(lifecycle_class: &str) -> String {
    format!("{ROLE_LABEL_NAMESPACE}/{lifecycle_class}-worker")
}

/// Whether `class` can be embedded in a label name
///
/// The empty string is valid and means "no special lifecycle".
pub fn is_valid_lifecycle_class(class: &str) -> bool {
    class.is_empty() || is_label_token(class, MAX_LIFECYCLE_CLASS_LEN)
}

/// Whether `name` can be written as the value of [`GROUP_LABEL`]
pub fn is_valid_group_name(name: &str) -> bool {
    is_label_token(name, MAX_LABEL_VALUE_LEN)
}

/// Non-empty, at most `max_len` bytes, alphanumeric at both ends and
/// `[-_.A-Za-z0-9]` in between
fn is_label_token(token: &str, max_len: usize) -> bool {
    if token.is_empty() || token.len() > max_len {
        return false;
    }
    let bytes = token.as_bytes();
    let alnum_edges = bytes.first().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.last().is_some_and(u8::is_ascii_alphanumeric);
    alnum_edges
        && bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(*b, b'-' | b'_' | b'.'))
}

/// Compute the full desired label set for a node
///
/// Deterministic in its inputs. The cluster manifest does not currently
/// contribute keys.
pub fn build_labels(
    _cluster: &ClusterManifest,
    group: &GroupManifest,
    lifecycle_class: &str,
) -> BTreeMap<String, String> {
    let mut labels: BTreeMap<String, String> = role_label_keys(group.spec.role)
        .iter()
        .map(|key| (key.to_string(), ROLE_LABEL_VALUE.to_string()))
        .collect();

    labels.insert(GROUP_LABEL.to_string(), group.metadata.name.clone());

    if !lifecycle_class.is_empty() {
        labels.insert(
            lifecycle_label_key(lifecycle_class),
            ROLE_LABEL_VALUE.to_string(),
        );
    }

    labels
}
