//! Controller runner - drives node reconciliation from watch events

use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::core::v1::Node;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client};
use tracing::info;

use crate::reconcile::{error_policy, reconcile, Context};

/// Watcher timeout (seconds) - must be less than client read_timeout (30s)
/// This forces the API server to close the watch before the client times out,
/// so the watcher reconnects cleanly instead of erroring.
const WATCH_TIMEOUT_SECS: u32 = 25;

/// Watch all nodes and reconcile their labels until a shutdown signal arrives
///
/// Events for the same node are serialized by the controller runtime.
pub async fn run_node_controller(client: Client, ctx: Arc<Context>) {
    let nodes: Api<Node> = Api::all(client);

    info!("starting node label controller");
    Controller::new(nodes, WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS))
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(log_reconcile_result("Node"))
        .await;
    info!("node label controller stopped");
}

/// Creates a closure for logging reconciliation results.
fn log_reconcile_result<T: std::fmt::Debug, E: std::fmt::Debug>(
    controller_name: &'static str,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(action) => tracing::debug!(?action, "{} reconciliation completed", controller_name),
            Err(e) => tracing::error!(error = ?e, "{} reconciliation error", controller_name),
        }
        std::future::ready(())
    }
}
