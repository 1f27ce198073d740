//! Error types for nodeward
//!
//! Errors are structured with fields to aid debugging in production. Every
//! variant carries the node name or manifest path that produced it so a
//! reconcile failure can be traced back to its input without extra logging.

use std::fmt;

use thiserror::Error;

/// Why a provider identity lookup failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFailure {
    /// The provider has no mapping for the node
    NotFound,
    /// The provider rejected our credentials
    Auth,
    /// The provider could not be reached
    Transport,
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Auth => write!(f, "unauthorized"),
            Self::Transport => write!(f, "transport"),
        }
    }
}

/// Coarse error classes used to pick logging and requeue behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connectivity problems; likely to clear on their own
    Transient,
    /// A precondition on the node does not hold yet (e.g. no providerID)
    Precondition,
    /// Declared configuration is missing or malformed and needs an author
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Precondition => write!(f, "precondition"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

/// Main error type for nodeward operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error while reading a node
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// A manifest does not exist in the store
    #[error("{kind} not found at {path}")]
    NotFound {
        /// Manifest kind that was expected (e.g. "Cluster")
        kind: String,
        /// Store path that was read
        path: String,
    },

    /// A node does not satisfy a precondition for labeling
    #[error("validation error for node {node}: {message}")]
    Validation {
        /// Name of the node
        node: String,
        /// Description of what's missing or invalid
        message: String,
    },

    /// The provider identity lookup failed
    #[error("identity lookup for node {node} failed ({kind}): {message}")]
    IdentityLookup {
        /// Name of the node
        node: String,
        /// Failure class reported by the provider
        kind: LookupFailure,
        /// Provider-supplied detail
        message: String,
    },

    /// Backing store I/O failure
    #[error("store error reading {path}: {message}")]
    Store {
        /// Store path that was read
        path: String,
        /// Description of what failed
        message: String,
    },

    /// Manifest bytes could not be decoded into the expected kind
    #[error("error decoding {path}: {message}")]
    Decode {
        /// Store path the bytes came from
        path: String,
        /// Description of what failed
        message: String,
    },

    /// The node label patch was rejected
    #[error("failed to patch labels on node {node}: {message}")]
    Patch {
        /// Name of the node
        node: String,
        /// Description of what failed
        message: String,
    },

    /// Process configuration is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Description of what's invalid
        message: String,
    },
}

impl Error {
    /// Create a manifest-not-found error
    pub fn not_found(kind: impl Into<String>, path: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            path: path.into(),
        }
    }

    /// Create a validation error for a node
    pub fn validation(node: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            node: node.into(),
            message: msg.into(),
        }
    }

    /// Create an identity lookup error for a node
    pub fn identity_lookup(
        node: impl Into<String>,
        kind: LookupFailure,
        msg: impl Into<String>,
    ) -> Self {
        Self::IdentityLookup {
            node: node.into(),
            kind,
            message: msg.into(),
        }
    }

    /// Create a store I/O error
    pub fn store(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Store {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a decode error
    pub fn decode(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a patch error
    pub fn patch(node: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Patch {
            node: node.into(),
            message: msg.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Classify this error for logging and requeue decisions
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Kube { .. } | Self::Store { .. } | Self::Patch { .. } => {
                ErrorCategory::Transient
            }
            Self::IdentityLookup { kind, .. } => match kind {
                LookupFailure::Transport => ErrorCategory::Transient,
                LookupFailure::NotFound => ErrorCategory::Precondition,
                LookupFailure::Auth => ErrorCategory::Configuration,
            },
            Self::Validation { .. } => ErrorCategory::Precondition,
            Self::NotFound { .. } | Self::Decode { .. } | Self::Config { .. } => {
                ErrorCategory::Configuration
            }
        }
    }
}
