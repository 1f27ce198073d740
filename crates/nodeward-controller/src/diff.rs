//! Label diffing between a node's current and desired labels

use std::collections::{BTreeMap, BTreeSet};

use nodeward_common::labels::is_managed;

/// Changes needed to bring a node's labels to the desired state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelDiff {
    /// Labels to set (missing or holding a different value)
    pub update: BTreeMap<String, String>,
    /// Managed label keys to remove
    pub delete: BTreeSet<String>,
}

impl LabelDiff {
    /// Whether no change is needed
    pub fn is_empty(&self) -> bool {
        self.update.is_empty() && self.delete.is_empty()
    }

    /// The label set that results from applying this diff to `current`
    pub fn apply(&self, current: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut labels: BTreeMap<String, String> = current
            .iter()
            .filter(|(key, _)| !self.delete.contains(*key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        labels.extend(self.update.iter().map(|(k, v)| (k.clone(), v.clone())));
        labels
    }
}

/// Compute the changes from `current` to `desired`
///
/// Keys in `desired` that are missing or differ are updated. Keys present on
/// the node but absent from `desired` are deleted only if they are managed.
pub fn diff_labels(
    current: &BTreeMap<String, String>,
    desired: &BTreeMap<String, String>,
) -> LabelDiff {
    let update = desired
        .iter()
        .filter(|(key, value)| current.get(*key) != Some(*value))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let delete = current
        .keys()
        .filter(|key| is_managed(key) && !desired.contains_key(*key))
        .cloned()
        .collect();

    LabelDiff { update, delete }
}
