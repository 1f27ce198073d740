//! Read-through TTL cache over a manifest store
//!
//! Entries are immutable snapshots stamped with the time they were fetched.
//! A hit only takes the read side of a short-lived lock and never waits on a
//! fetch. A miss takes a per-path refresh lock and checks the entry again
//! before fetching, so callers that miss the same path together share one
//! backing read.
//!
//! Fetch failures are returned as-is. An expired entry is never served as a
//! fallback.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::{ManifestPath, ManifestStore, StoreError};

#[derive(Debug)]
struct CacheEntry {
    payload: Bytes,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Process-wide manifest cache shared by all reconciles
pub struct ConfigCache {
    store: Arc<dyn ManifestStore>,
    entries: RwLock<HashMap<ManifestPath, CacheEntry>>,
    refresh_locks: DashMap<ManifestPath, Arc<Mutex<()>>>,
}

impl ConfigCache {
    /// Create an empty cache in front of `store`
    pub fn new(store: Arc<dyn ManifestStore>) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
            refresh_locks: DashMap::new(),
        }
    }

    /// Read `path`, serving a cached copy younger than `ttl` when there is one
    pub async fn read(&self, path: &ManifestPath, ttl: Duration) -> Result<Bytes, StoreError> {
        if let Some(payload) = self.fresh(path, ttl) {
            trace!(path = %path, "manifest cache hit");
            return Ok(payload);
        }

        let refresh_lock = self
            .refresh_locks
            .entry(path.clone())
            .or_default()
            .value()
            .clone();
        let _guard = refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(payload) = self.fresh(path, ttl) {
            trace!(path = %path, "manifest refreshed by concurrent reader");
            return Ok(payload);
        }

        debug!(path = %path, "fetching manifest");
        let payload = self.store.read_path(path).await.map_err(|e| {
            warn!(path = %path, error = %e, "manifest fetch failed");
            e
        })?;

        self.entries.write().insert(
            path.clone(),
            CacheEntry {
                payload: payload.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(payload)
    }

    fn fresh(&self, path: &ManifestPath, ttl: Duration) -> Option<Bytes> {
        self.entries
            .read()
            .get(path)
            .filter(|entry| entry.is_fresh(ttl))
            .map(|entry| entry.payload.clone())
    }
}

impl std::fmt::Debug for ConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("entries", &self.entries.read().len())
            .finish_non_exhaustive()
    }
}
