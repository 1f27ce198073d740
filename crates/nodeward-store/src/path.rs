//! Store roots and the paths addressed beneath them

use std::fmt;
use std::path::{Path, PathBuf};

use nodeward_common::Error;

use crate::StoreError;

const FILE_SCHEME: &str = "file://";

/// The validated base location every manifest path is resolved against
///
/// Built once at startup. Accepts an absolute local path or a `file://` URL;
/// anything else fails so that a typo in configuration stops the process
/// instead of failing every reconcile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreRoot {
    dir: PathBuf,
}

impl StoreRoot {
    /// Parse a configured base path
    pub fn parse(base: &str) -> Result<Self, Error> {
        let trimmed = base.trim();
        if trimmed.is_empty() {
            return Err(Error::config("config base path is empty"));
        }

        let local = match trimmed.split_once("://") {
            Some(_) if trimmed.starts_with(FILE_SCHEME) => &trimmed[FILE_SCHEME.len()..],
            Some((scheme, _)) => {
                return Err(Error::config(format!(
                    "cannot parse config base {base:?}: unsupported scheme {scheme:?}"
                )))
            }
            None => trimmed,
        };

        let dir = PathBuf::from(local);
        if !dir.is_absolute() {
            return Err(Error::config(format!(
                "cannot parse config base {base:?}: path must be absolute"
            )));
        }
        if dir
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(Error::config(format!(
                "cannot parse config base {base:?}: path must not contain '..'"
            )));
        }

        Ok(Self { dir })
    }

    /// The local directory this root points at
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build the path of a manifest below this root
    ///
    /// Each segment must be a single, non-empty path component.
    pub fn join(&self, segments: &[&str]) -> Result<ManifestPath, StoreError> {
        let mut path = self.dir.clone();
        for segment in segments {
            if !is_valid_segment(segment) {
                return Err(StoreError::InvalidSegment {
                    segment: (*segment).to_string(),
                });
            }
            path.push(segment);
        }
        Ok(ManifestPath { path })
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}

/// Location of a single manifest in the store
///
/// Only obtainable through [`StoreRoot::join`], so every path is known to
/// sit beneath the configured root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ManifestPath {
    path: PathBuf,
}

impl ManifestPath {
    /// The local filesystem location of this manifest
    pub fn as_path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ManifestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
