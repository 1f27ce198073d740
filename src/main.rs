//! Nodeward - reconciles Kubernetes node role and group labels from declared manifests

mod config;

use std::sync::Arc;

use clap::Parser;
use kube::Client;
use tracing::info;

use nodeward_common::telemetry::init_telemetry;
use nodeward_controller::{run_node_controller, Context, KubeNodeClient, ManifestLoader};
use nodeward_identity::{IdentityResolver, StaticIdentifier};
use nodeward_store::{ConfigCache, FsStore};

use crate::config::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_telemetry(cli.telemetry())?;

    // Configuration problems fail startup rather than every reconcile
    let root = cli.store_root()?;
    let store = FsStore::open(root.clone()).await?;
    let identifier = StaticIdentifier::load(&cli.identity_map).await?;

    info!(
        config_base = %root.dir().display(),
        identities = identifier.len(),
        ttl_secs = cli.manifest_ttl_secs,
        "starting nodeward"
    );

    let cache = Arc::new(ConfigCache::new(Arc::new(store)));
    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("failed to create kube client: {}", e))?;

    let ctx = Arc::new(Context::new(
        Arc::new(KubeNodeClient::new(client.clone())),
        IdentityResolver::new(Arc::new(identifier)),
        ManifestLoader::with_ttl(root, cache, cli.manifest_ttl()),
    ));

    run_node_controller(client, ctx).await;
    Ok(())
}
