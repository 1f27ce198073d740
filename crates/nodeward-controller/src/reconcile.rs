//! Node label reconciliation
//!
//! One pass per node event: observe the node, determine its desired labels
//! from declared configuration, diff, and patch. Nothing is retried here;
//! errors go back to the controller runtime, which owns backoff.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::core::v1::Node;
use kube::runtime::controller::Action;
use kube::ResourceExt;
use nodeward_common::labels::build_labels;
use nodeward_common::{Error, ErrorCategory, Result};
use nodeward_identity::IdentityResolver;
use tracing::{debug, error, info, instrument, warn};

use crate::client::NodeClient;
use crate::diff::diff_labels;
use crate::loader::ManifestLoader;

/// Requeue delay after a transient failure
pub const TRANSIENT_REQUEUE: Duration = Duration::from_secs(5);
/// Requeue delay while a node precondition does not hold
pub const PRECONDITION_REQUEUE: Duration = Duration::from_secs(30);
/// Requeue delay after a configuration defect
pub const CONFIGURATION_REQUEUE: Duration = Duration::from_secs(300);

/// Shared state for all reconcile passes
pub struct Context {
    /// Node access (trait object for testability)
    pub nodes: Arc<dyn NodeClient>,
    /// Resolves node group and lifecycle class
    pub identity: IdentityResolver,
    /// Loads manifests through the process-wide cache
    pub manifests: ManifestLoader,
}

impl Context {
    /// Create a new controller context
    pub fn new(
        nodes: Arc<dyn NodeClient>,
        identity: IdentityResolver,
        manifests: ManifestLoader,
    ) -> Self {
        Self {
            nodes,
            identity,
            manifests,
        }
    }
}

/// What a reconcile pass did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The node no longer exists
    NodeGone,
    /// Labels already matched
    Unchanged,
    /// Labels were patched
    Patched {
        /// Labels that were set
        updated: BTreeMap<String, String>,
        /// Labels that were removed
        deleted: BTreeSet<String>,
    },
}

/// Run one reconcile pass for the node called `name`
#[instrument(skip_all, fields(node = %name))]
pub async fn reconcile_node(name: &str, ctx: &Context) -> Result<ReconcileOutcome> {
    let Some(node) = ctx.nodes.get(name).await? else {
        // Deleted between the event and the fetch; a new event will follow if it returns
        debug!("node not found, skipping");
        return Ok(ReconcileOutcome::NodeGone);
    };

    let cluster = ctx.manifests.load_cluster().await?;
    let identity = ctx.identity.identify(&node).await?;
    let group = ctx.manifests.load_group(name, &identity.group_name).await?;

    let desired = build_labels(&cluster, &group, &identity.lifecycle_class);
    let diff = diff_labels(node.labels(), &desired);

    if diff.is_empty() {
        debug!("no label changes needed");
        return Ok(ReconcileOutcome::Unchanged);
    }

    info!(
        group = %identity.group_name,
        updated = ?diff.update.keys().collect::<Vec<_>>(),
        deleted = ?diff.delete,
        "patching node labels"
    );

    if let Err(e) = ctx
        .nodes
        .patch_labels(name, &diff.update, &diff.delete)
        .await
    {
        warn!(error = %e, "failed to patch node labels");
        return Err(e);
    }

    Ok(ReconcileOutcome::Patched {
        updated: diff.update,
        deleted: diff.delete,
    })
}

/// Reconcile entry point for the kube-rs controller
pub async fn reconcile(node: Arc<Node>, ctx: Arc<Context>) -> Result<Action> {
    reconcile_node(&node.name_any(), &ctx).await?;
    Ok(Action::await_change())
}

/// Error policy for the kube-rs controller
///
/// Configuration defects are logged apart from transient failures and wait
/// longer before the next attempt, since retrying will not fix them.
pub fn error_policy(node: Arc<Node>, error: &Error, _ctx: Arc<Context>) -> Action {
    let category = error.category();
    match category {
        ErrorCategory::Transient => {
            warn!(?error, node = %node.name_any(), %category, "reconciliation failed");
        }
        ErrorCategory::Precondition => {
            info!(?error, node = %node.name_any(), %category, "node not ready for labeling");
        }
        ErrorCategory::Configuration => {
            error!(
                ?error,
                node = %node.name_any(),
                %category,
                "declared configuration is unusable"
            );
        }
    }
    Action::requeue(requeue_delay(category))
}

/// How long to wait before retrying after an error of `category`
pub fn requeue_delay(category: ErrorCategory) -> Duration {
    match category {
        ErrorCategory::Transient => TRANSIENT_REQUEUE,
        ErrorCategory::Precondition => PRECONDITION_REQUEUE,
        ErrorCategory::Configuration => CONFIGURATION_REQUEUE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockNodeClient;
    use k8s_openapi::api::core::v1::NodeSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use nodeward_common::labels::{
        GROUP_LABEL, ROLE_LABEL_CONTROL_PLANE, ROLE_LABEL_MASTER_LEGACY, ROLE_LABEL_NODE_LEGACY,
        ROLE_LABEL_WORKER,
    };
    use nodeward_identity::StaticIdentifier;
    use nodeward_store::{ConfigCache, MemoryStore, StoreRoot};

    const PROVIDER_ID: &str = "aws:///us-east-1a/i-0abc123";

    const IDENTITIES: &str = r#"
nodes:
  aws:///us-east-1a/i-0abc123:
    group: workers-a
  aws:///us-east-1a/i-0spot:
    group: workers-a
    lifecycle: spot
  aws:///us-east-1a/i-0gpu:
    group: "GPU pool (us-east-1a)"
"#;

    fn sample_node(name: &str, provider_id: Option<&str>, labels: &[(&str, &str)]) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(
                    labels
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
                ..Default::default()
            },
            spec: Some(NodeSpec {
                provider_id: provider_id.map(str::to_string),
                ..Default::default()
            }),
            status: None,
        }
    }

    /// Build a context with a healthy store holding a cluster manifest and
    /// a `workers-a` worker group
    fn context_with(nodes: MockNodeClient) -> (Context, Arc<MemoryStore>, StoreRoot) {
        let root = StoreRoot::parse("/cfg").unwrap();
        let store = Arc::new(MemoryStore::new());
        store.put(
            &root.join(&["cluster.spec"]).unwrap(),
            "kind: Cluster\nmetadata:\n  name: prod\n",
        );
        store.put(
            &root.join(&["groups", "workers-a"]).unwrap(),
            "kind: Group\nmetadata:\n  name: workers-a\nspec:\n  role: Node\n",
        );
        let cache = Arc::new(ConfigCache::new(store.clone()));
        let identifier = StaticIdentifier::from_yaml("test", IDENTITIES.as_bytes()).unwrap();

        let ctx = Context::new(
            Arc::new(nodes),
            IdentityResolver::new(Arc::new(identifier)),
            ManifestLoader::new(root.clone(), cache),
        );
        (ctx, store, root)
    }

    fn returns_node(mock: &mut MockNodeClient, node: Node) {
        mock.expect_get().returning(move |_| Ok(Some(node.clone())));
    }

    #[tokio::test]
    async fn unlabeled_worker_gets_all_worker_keys() {
        let mut mock = MockNodeClient::new();
        returns_node(&mut mock, sample_node("n1", Some(PROVIDER_ID), &[]));
        mock.expect_patch_labels()
            .times(1)
            .withf(|name, update, delete| {
                name == "n1"
                    && update.get(ROLE_LABEL_NODE_LEGACY).map(String::as_str) == Some("true")
                    && update.get(ROLE_LABEL_WORKER).map(String::as_str) == Some("true")
                    && update.get(GROUP_LABEL).map(String::as_str) == Some("workers-a")
                    && update.len() == 3
                    && delete.is_empty()
            })
            .returning(|_, _, _| Ok(()));

        let (ctx, _, _) = context_with(mock);
        let outcome = reconcile_node("n1", &ctx).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Patched { .. }));
    }

    #[tokio::test]
    async fn labeled_node_is_left_alone() {
        let mut mock = MockNodeClient::new();
        returns_node(
            &mut mock,
            sample_node(
                "n1",
                Some(PROVIDER_ID),
                &[
                    (ROLE_LABEL_NODE_LEGACY, "true"),
                    (ROLE_LABEL_WORKER, "true"),
                    (GROUP_LABEL, "workers-a"),
                    ("kubernetes.io/hostname", "n1"),
                ],
            ),
        );
        mock.expect_patch_labels().never();

        let (ctx, _, _) = context_with(mock);
        assert_eq!(
            reconcile_node("n1", &ctx).await.unwrap(),
            ReconcileOutcome::Unchanged
        );
    }

    #[tokio::test]
    async fn stale_control_plane_labels_are_pruned() {
        let mut mock = MockNodeClient::new();
        returns_node(
            &mut mock,
            sample_node(
                "n1",
                Some(PROVIDER_ID),
                &[(ROLE_LABEL_MASTER_LEGACY, ""), (ROLE_LABEL_CONTROL_PLANE, "")],
            ),
        );
        mock.expect_patch_labels().times(1).returning(|_, _, _| Ok(()));

        let (ctx, _, _) = context_with(mock);
        match reconcile_node("n1", &ctx).await.unwrap() {
            ReconcileOutcome::Patched { updated, deleted } => {
                assert!(updated.contains_key(ROLE_LABEL_WORKER));
                assert_eq!(
                    deleted,
                    [ROLE_LABEL_CONTROL_PLANE, ROLE_LABEL_MASTER_LEGACY]
                        .into_iter()
                        .map(String::from)
                        .collect::<BTreeSet<_>>()
                );
            }
            other => panic!("expected Patched, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn lifecycle_class_adds_worker_key() {
        let mut mock = MockNodeClient::new();
        returns_node(&mut mock, sample_node("n1", Some("aws:///us-east-1a/i-0spot"), &[]));
        mock.expect_patch_labels()
            .times(1)
            .withf(|_, update, _| {
                update
                    .get("node-role.kubernetes.io/spot-worker")
                    .map(String::as_str)
                    == Some("true")
            })
            .returning(|_, _, _| Ok(()));

        let (ctx, _, _) = context_with(mock);
        reconcile_node("n1", &ctx).await.unwrap();
    }

    #[tokio::test]
    async fn deleted_node_is_success_without_patch() {
        let mut mock = MockNodeClient::new();
        mock.expect_get().times(1).returning(|_| Ok(None));
        mock.expect_patch_labels().never();

        let (ctx, _, _) = context_with(mock);
        assert_eq!(
            reconcile_node("gone", &ctx).await.unwrap(),
            ReconcileOutcome::NodeGone
        );
    }

    #[tokio::test]
    async fn malformed_cluster_manifest_aborts_before_patch() {
        let mut mock = MockNodeClient::new();
        returns_node(&mut mock, sample_node("n1", Some(PROVIDER_ID), &[]));
        mock.expect_patch_labels().never();

        let (ctx, store, root) = context_with(mock);
        store.put(&root.join(&["cluster.spec"]).unwrap(), "kind: [unterminated");

        let err = reconcile_node("n1", &ctx).await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }), "got {err:?}");
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[tokio::test]
    async fn missing_group_manifest_is_reported() {
        let mut mock = MockNodeClient::new();
        returns_node(
            &mut mock,
            sample_node("n1", None, &[(GROUP_LABEL, "workers-z")]),
        );
        mock.expect_patch_labels().never();

        let (ctx, _, _) = context_with(mock);
        let err = reconcile_node("n1", &ctx).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn node_without_provider_id_or_label_is_a_validation_error() {
        let mut mock = MockNodeClient::new();
        returns_node(&mut mock, sample_node("n1", None, &[]));
        mock.expect_patch_labels().never();

        let (ctx, _, _) = context_with(mock);
        let err = reconcile_node("n1", &ctx).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn group_name_unfit_for_a_label_is_rejected_before_patch() {
        let mut mock = MockNodeClient::new();
        returns_node(&mut mock, sample_node("n1", Some("aws:///us-east-1a/i-0gpu"), &[]));
        mock.expect_patch_labels().never();

        let (ctx, store, root) = context_with(mock);
        store.put(
            &root.join(&["groups", "GPU pool (us-east-1a)"]).unwrap(),
            "kind: Group\nmetadata:\n  name: GPU pool (us-east-1a)\nspec:\n  role: Node\n",
        );

        let err = reconcile_node("n1", &ctx).await.unwrap_err();
        assert!(matches!(err, Error::Validation { .. }), "got {err:?}");
        assert_eq!(err.category(), ErrorCategory::Precondition);
    }

    #[tokio::test]
    async fn patch_failure_is_returned() {
        let mut mock = MockNodeClient::new();
        returns_node(&mut mock, sample_node("n1", Some(PROVIDER_ID), &[]));
        mock.expect_patch_labels()
            .times(1)
            .returning(|name, _, _| Err(Error::patch(name, "the object has been modified")));

        let (ctx, _, _) = context_with(mock);
        let err = reconcile_node("n1", &ctx).await.unwrap_err();
        assert!(matches!(err, Error::Patch { .. }));
    }

    #[tokio::test]
    async fn reconcile_waits_for_next_change_on_success() {
        let mut mock = MockNodeClient::new();
        mock.expect_get().returning(|_| Ok(None));

        let (ctx, _, _) = context_with(mock);
        let action = reconcile(Arc::new(sample_node("n1", None, &[])), Arc::new(ctx))
            .await
            .unwrap();
        assert_eq!(action, Action::await_change());
    }

    #[test]
    fn error_policy_backs_off_by_category() {
        let (ctx, _, _) = context_with(MockNodeClient::new());
        let ctx = Arc::new(ctx);
        let node = Arc::new(sample_node("n1", None, &[]));

        assert_eq!(
            error_policy(node.clone(), &Error::store("/cfg/cluster.spec", "reset"), ctx.clone()),
            Action::requeue(TRANSIENT_REQUEUE)
        );
        assert_eq!(
            error_policy(node.clone(), &Error::validation("n1", "no providerID"), ctx.clone()),
            Action::requeue(PRECONDITION_REQUEUE)
        );
        assert_eq!(
            error_policy(node, &Error::decode("/cfg/cluster.spec", "bad"), ctx),
            Action::requeue(CONFIGURATION_REQUEUE)
        );
    }
}
