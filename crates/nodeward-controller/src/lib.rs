//! Node label reconciliation for nodeward
//!
//! Each pass fetches a node, resolves its identity, loads the cluster and
//! group manifests through the shared cache, computes the desired labels,
//! and patches only what differs. Labels are pruned only when they belong
//! to the managed key set, so labels owned by anything else are never
//! touched.

#![deny(missing_docs)]

pub mod client;
pub mod diff;
pub mod loader;
pub mod reconcile;
pub mod runner;

pub use client::{KubeNodeClient, NodeClient};
pub use diff::{diff_labels, LabelDiff};
pub use loader::ManifestLoader;
pub use reconcile::{error_policy, reconcile, reconcile_node, Context, ReconcileOutcome};
pub use runner::run_node_controller;
