//! Bounded-staleness read cache in front of a [`CounterStore`].
//!
//! # Read path
//!
//! A cached count younger than the TTL is returned without touching the
//! store. Otherwise the caller refreshes the key:
//!
//! 1. take the key's refresh lock (one `tokio::sync::Mutex` per key)
//! 2. re-check the entry, since a caller ahead in the queue may have filled it
//! 3. fetch from the store and record the value with the fill time
//!
//! At most one store fetch per key is in flight; callers queued behind it read
//! its result from the cache. Locks are per key, so unrelated keys never wait
//! on each other.
//!
//! The refresh runs on its own task. A caller that gives up on `get` (timeout,
//! dropped request) does not cancel the fetch, and the cache is still filled.
//!
//! # Failures
//!
//! A failed fetch is returned to the caller and never cached. An expired
//! entry stays in place (and stays expired) so the next call retries.
//!
//! # Writes
//!
//! `increment` goes straight to the store and leaves the cache alone: reads
//! can lag writes by up to one TTL.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::error::{CounterError, Result};
use crate::store::CounterStore;

/// Default maximum age of a cached count.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    value: i64,
    filled_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.filled_at) < ttl
    }
}

/// Per-key TTL cache over one counter store.
///
/// Cheap to clone; clones share entries, locks and store.
pub struct LocalCache<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    store: Arc<S>,
    ttl: Duration,
    entries: DashMap<String, CacheEntry>,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: CounterStore> LocalCache<S> {
    pub fn new(store: Arc<S>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                ttl,
                entries: DashMap::new(),
                refresh_locks: DashMap::new(),
            }),
        }
    }

    /// Count at `key`, at most one TTL stale.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn get(&self, key: &str) -> Result<i64> {
        if let Some(value) = self.inner.fresh(key) {
            trace!(key, value, "cache hit");
            return Ok(value);
        }

        let inner = Arc::clone(&self.inner);
        let key = key.to_owned();
        tokio::spawn(async move { inner.refresh(&key).await })
            .await
            .map_err(|err| CounterError::Internal(format!("cache refresh task failed: {}", err)))?
    }

    /// Forward an increment to the store. The cached count is not updated.
    pub async fn increment(&self, key: &str, delta: i64) -> Result<()> {
        self.inner.store.increment(key, delta).await
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Last successfully fetched count for `key`, fresh or not.
    pub fn cached(&self, key: &str) -> Option<i64> {
        self.inner.entries.get(key).map(|entry| entry.value)
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Number of refresh locks created so far. Never shrinks.
    pub fn lock_count(&self) -> usize {
        self.inner.refresh_locks.len()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.inner.store
    }
}

impl<S: CounterStore> Inner<S> {
    fn fresh(&self, key: &str) -> Option<i64> {
        let entry = self.entries.get(key)?;
        entry
            .is_fresh(self.ttl, Instant::now())
            .then_some(entry.value)
    }

    fn refresh_lock(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.refresh_locks.get(key) {
            return Arc::clone(&lock);
        }
        let lock = self.refresh_locks.entry(key.to_owned()).or_default();
        Arc::clone(&lock)
    }

    async fn refresh(&self, key: &str) -> Result<i64> {
        let lock = self.refresh_lock(key);
        let _guard = lock.lock().await;

        if let Some(value) = self.fresh(key) {
            trace!(key, value, "filled by concurrent refresh");
            return Ok(value);
        }

        match self.store.get(key).await {
            Ok(value) => {
                self.entries.insert(
                    key.to_owned(),
                    CacheEntry {
                        value,
                        filled_at: Instant::now(),
                    },
                );
                debug!(key, value, "cache refreshed");
                Ok(value)
            }
            Err(err) => {
                warn!(key, error = %err, "cache refresh failed");
                Err(err)
            }
        }
    }
}

impl<S> Clone for LocalCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for LocalCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalCache")
            .field("ttl", &self.inner.ttl)
            .field("entries", &self.inner.entries.len())
            .finish()
    }
}
