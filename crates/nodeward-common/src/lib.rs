//! Common types for nodeward: errors, manifests, label policy, telemetry

#![deny(missing_docs)]

pub mod error;
pub mod labels;
pub mod manifest;
pub mod telemetry;

pub use error::{Error, ErrorCategory, LookupFailure};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Default lifetime of cached manifests
pub const DEFAULT_MANIFEST_TTL: std::time::Duration = std::time::Duration::from_secs(3600);

/// Field manager name used when patching nodes
pub const FIELD_MANAGER: &str = "nodeward";
