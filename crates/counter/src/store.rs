//! Backing counter store interface.
//!
//! The real store (and its transport) lives outside this crate; the service
//! only needs `increment` and `get`. [`MemoryStore`] is an in-process
//! implementation used by the CLI and the tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{CounterError, Result};

/// A key-value counter service reachable for one node.
#[async_trait]
pub trait CounterStore: Send + Sync + 'static {
    /// Add `delta` to the counter at `key`.
    async fn increment(&self, key: &str, delta: i64) -> Result<()>;

    /// Current count at `key`, 0 if the key was never incremented.
    async fn get(&self, key: &str) -> Result<i64>;
}

/// In-process counter store.
///
/// Can be switched offline to simulate an unreachable backend, and can delay
/// every call to simulate network latency. Counts calls for observation.
#[derive(Debug)]
pub struct MemoryStore {
    counts: DashMap<String, i64>,
    available: AtomicBool,
    latency: Option<Duration>,
    gets: AtomicU64,
    increments: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            counts: DashMap::new(),
            available: AtomicBool::new(true),
            latency: None,
            gets: AtomicU64::new(0),
            increments: AtomicU64::new(0),
        }
    }

    /// Delay every call by `latency` before it is served.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `get` calls received, including failed ones.
    pub fn get_calls(&self) -> u64 {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `increment` calls received, including failed ones.
    pub fn increment_calls(&self) -> u64 {
        self.increments.load(Ordering::SeqCst)
    }

    /// Number of distinct keys holding a count.
    pub fn key_count(&self) -> usize {
        self.counts.len()
    }

    async fn serve(&self) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CounterError::StoreUnavailable(
                "memory store is offline".to_string(),
            ))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: &str, delta: i64) -> Result<()> {
        self.increments.fetch_add(1, Ordering::SeqCst);
        self.serve().await?;
        let mut count = self.counts.entry(key.to_owned()).or_insert(0);
        *count = count.saturating_add(delta);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<i64> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.serve().await?;
        Ok(self.counts.get(key).map(|count| *count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unseen_key_reads_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nobody").await, Ok(0));
        assert_eq!(store.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_increment_accumulates() {
        let store = MemoryStore::new();
        store.increment("page", 2).await.unwrap();
        store.increment("page", 3).await.unwrap();
        assert_eq!(store.get("page").await, Ok(5));
        assert_eq!(store.increment_calls(), 2);
        assert_eq!(store.key_count(), 1);
    }

    #[tokio::test]
    async fn test_offline_store_fails_without_writing() {
        let store = MemoryStore::new();
        store.set_available(false);

        assert!(matches!(
            store.increment("page", 1).await,
            Err(CounterError::StoreUnavailable(_))
        ));
        assert!(matches!(
            store.get("page").await,
            Err(CounterError::StoreUnavailable(_))
        ));

        store.set_available(true);
        assert_eq!(store.get("page").await, Ok(0));
        assert_eq!(store.key_count(), 0);
    }
}
