//! Service configuration.

use std::time::Duration;

use corelib::{parse_node_list, NodeId, DEFAULT_VNODES};
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_TTL;
use crate::error::{CounterError, Result};

/// Ring membership and cache settings for [`ShardedCounterService`].
///
/// Missing fields take their defaults, so `{"nodes": ["a", "b"]}` is a
/// complete configuration.
///
/// [`ShardedCounterService`]: crate::ShardedCounterService
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Backing-store node identifiers.
    pub nodes: Vec<String>,
    /// Virtual positions per node on the ring.
    pub virtual_nodes: usize,
    /// Maximum age of a cached count, in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            virtual_nodes: DEFAULT_VNODES,
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

impl ServiceConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|err| CounterError::InvalidConfig(err.to_string()))
    }

    /// Replace the node list with a comma-separated one (`"a,b,c"`).
    pub fn set_nodes_csv(&mut self, raw: &str) {
        self.nodes = parse_node_list(raw)
            .into_iter()
            .map(|node| node.to_string())
            .collect();
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Configured nodes, validated and de-duplicated in order.
    pub fn node_ids(&self) -> Result<Vec<NodeId>> {
        let mut ids: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        for raw in &self.nodes {
            let id = NodeId::parse(raw)?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    pub fn validate(&self) -> Result<()> {
        if self.virtual_nodes == 0 {
            return Err(CounterError::InvalidConfig(
                "virtual_nodes must be at least 1".to_string(),
            ));
        }
        if self.node_ids()?.is_empty() {
            return Err(CounterError::InvalidConfig(
                "at least one node is required".to_string(),
            ));
        }
        Ok(())
    }
}
