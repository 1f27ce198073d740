//! Command line and environment configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use nodeward_common::telemetry::TelemetryConfig;
use nodeward_common::Result;
use nodeward_store::StoreRoot;

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable text
    Text,
}

/// Nodeward - labels Kubernetes nodes with their centrally declared group and role
#[derive(Parser, Debug)]
#[command(name = "nodeward", version, about, long_about = None)]
pub struct Cli {
    /// Base of the manifest store: an absolute path or a file:// URL
    ///
    /// Holds `cluster.spec` and one manifest per group under `groups/`.
    #[arg(long, env = "NODEWARD_CONFIG_BASE")]
    pub config_base: String,

    /// Path to the providerID inventory used to identify unlabeled nodes
    #[arg(long, env = "NODEWARD_IDENTITY_MAP")]
    pub identity_map: PathBuf,

    /// How long a fetched manifest is reused before it is read again
    #[arg(long, env = "NODEWARD_MANIFEST_TTL_SECS", default_value = "3600")]
    pub manifest_ttl_secs: u64,

    /// Log output format
    #[arg(long, env = "NODEWARD_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Resolve the configured base into a validated store root
    pub fn store_root(&self) -> Result<StoreRoot> {
        StoreRoot::parse(&self.config_base)
    }

    /// Manifest cache ttl
    pub fn manifest_ttl(&self) -> Duration {
        Duration::from_secs(self.manifest_ttl_secs)
    }

    /// Telemetry settings derived from the log format
    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            json: self.log_format == LogFormat::Json,
        }
    }
}
