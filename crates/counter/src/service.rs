//! Routing of counter operations to shards.

use std::sync::Arc;
use std::time::Duration;

use corelib::{HashRing, NodeId};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::info;

use crate::cache::LocalCache;
use crate::config::ServiceConfig;
use crate::error::{CounterError, Result};
use crate::store::CounterStore;

/// Routes each key to the shard the ring assigns it, then reads through that
/// shard's [`LocalCache`] or writes straight to its store.
///
/// Reads may trail writes by up to the cache TTL; see [`LocalCache`].
pub struct ShardedCounterService<S: CounterStore> {
    ring: Arc<HashRing>,
    shards: DashMap<NodeId, LocalCache<S>>,
    /// Held across the shard map and ring updates of a membership change.
    membership: Mutex<()>,
    ttl: Duration,
}

impl<S: CounterStore> ShardedCounterService<S> {
    /// Service over `ring` with no shards registered yet.
    ///
    /// Nodes already on the ring route to [`CounterError::UnknownShard`]
    /// until a store is registered for them with [`add_shard`](Self::add_shard).
    pub fn new(ring: Arc<HashRing>, ttl: Duration) -> Self {
        Self {
            ring,
            shards: DashMap::new(),
            membership: Mutex::new(()),
            ttl,
        }
    }

    /// Build the ring and one shard per configured node.
    pub fn from_config<F>(config: &ServiceConfig, mut store_for: F) -> Result<Self>
    where
        F: FnMut(&NodeId) -> Arc<S>,
    {
        config.validate()?;
        let ring = Arc::new(HashRing::with_vnodes(config.virtual_nodes)?);
        let service = Self::new(ring, config.cache_ttl());
        for node in config.node_ids()? {
            let store = store_for(&node);
            service.add_shard(node.as_str(), store)?;
        }
        Ok(service)
    }

    /// Register `store` for `node` and put the node on the ring.
    ///
    /// Registering a node twice keeps the first store.
    pub fn add_shard(&self, node: &str, store: Arc<S>) -> Result<NodeId> {
        let node_id = NodeId::parse(node)?;
        let ttl = self.ttl;
        let _membership = self.membership.lock();
        self.shards
            .entry(node_id.clone())
            .or_insert_with(|| LocalCache::new(store, ttl));
        let inserted = self.ring.add_node(node_id.as_str())?;
        info!(node = %node_id, inserted, "shard added");
        Ok(node_id)
    }

    /// Take `node` off the ring and drop its cache.
    ///
    /// Returns whether a shard was registered for the node.
    pub fn remove_shard(&self, node: &str) -> Result<bool> {
        let node_id = NodeId::parse(node)?;
        let _membership = self.membership.lock();
        let removed_tokens = self.ring.remove_node(node_id.as_str())?;
        let had_shard = self.shards.remove(&node_id).is_some();
        info!(node = %node_id, removed_tokens, had_shard, "shard removed");
        Ok(had_shard)
    }

    /// Node responsible for `key`.
    pub fn node_for(&self, key: &str) -> Result<NodeId> {
        Ok(self.ring.route(key)?)
    }

    fn shard_for(&self, key: &str) -> Result<LocalCache<S>> {
        let node = self.node_for(key)?;
        match self.shards.get(&node) {
            Some(cache) => Ok(cache.value().clone()),
            None => Err(CounterError::UnknownShard(node)),
        }
    }

    /// Add `delta` to `key` on its shard's store.
    ///
    /// Fails with [`CounterError::NoNodesAvailable`] on an empty ring without
    /// contacting any store.
    pub async fn route_and_increment(&self, key: &str, delta: i64) -> Result<()> {
        self.shard_for(key)?.increment(key, delta).await
    }

    /// Count at `key` from its shard, at most one TTL stale.
    pub async fn route_and_get(&self, key: &str) -> Result<i64> {
        self.shard_for(key)?.get(key).await
    }

    /// Record one visit to `page_id`.
    pub async fn increment_visit(&self, page_id: &str) -> Result<()> {
        self.route_and_increment(page_id, 1).await
    }

    pub async fn get_visit_count(&self, page_id: &str) -> Result<i64> {
        self.route_and_get(page_id).await
    }

    pub fn ring(&self) -> &Arc<HashRing> {
        &self.ring
    }

    /// Cache of the shard registered for `node`, if any.
    pub fn shard(&self, node: &NodeId) -> Option<LocalCache<S>> {
        self.shards.get(node).map(|cache| cache.value().clone())
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}
