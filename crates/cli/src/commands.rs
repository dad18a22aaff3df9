//! CLI subcommands.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Subcommand;
use corelib::{HashRing, NodeId, RingBuilder};
use counter::{CounterStore, MemoryStore, ServiceConfig, ShardedCounterService};
use serde::Serialize;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the node owning each key.
    Route {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Show how sampled keys and the keyspace spread over nodes.
    Distribution {
        #[arg(long, default_value_t = 10_000)]
        keys: usize,
    },
    /// Measure how many sampled keys move when a node leaves.
    Rebalance {
        #[arg(long)]
        remove: String,
        #[arg(long, default_value_t = 10_000)]
        keys: usize,
    },
    /// Record visits to a page against in-memory stores and read them back.
    Visit {
        page: String,
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyRoute {
    pub key: String,
    pub node: NodeId,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeShare {
    pub node: NodeId,
    pub keys: usize,
    pub key_fraction: f64,
    pub ownership: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandResult {
    Route {
        routes: Vec<KeyRoute>,
    },
    Distribution {
        keys: usize,
        nodes: Vec<NodeShare>,
    },
    Rebalance {
        removed: NodeId,
        keys: usize,
        remapped: usize,
        remapped_fraction: f64,
        moved_between_survivors: usize,
    },
    Visit {
        page: String,
        node: NodeId,
        increments: u32,
        /// What a reader sees right after the increments (may be stale).
        cached_count: i64,
        /// What the owning store actually holds.
        stored_count: i64,
    },
}

impl Command {
    pub fn execute(&self, config: &ServiceConfig) -> anyhow::Result<CommandResult> {
        match self {
            Command::Route { keys } => {
                let ring = build_ring(config)?;
                let mut routes = Vec::with_capacity(keys.len());
                for key in keys {
                    routes.push(KeyRoute {
                        key: key.clone(),
                        node: ring.route(key)?,
                    });
                }
                Ok(CommandResult::Route { routes })
            }
            Command::Distribution { keys } => distribution(config, *keys),
            Command::Rebalance { remove, keys } => rebalance(config, remove, *keys),
            Command::Visit { page, times } => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .context("starting tokio runtime")?;
                runtime.block_on(visit(config, page, *times))
            }
        }
    }
}

fn build_ring(config: &ServiceConfig) -> anyhow::Result<HashRing> {
    let ring = RingBuilder::new()
        .with_vnodes(config.virtual_nodes)
        .add_nodes(config.nodes.iter().cloned())
        .build()?;
    Ok(ring)
}

fn sample_key(i: usize) -> String {
    format!("key-{}", i)
}

fn distribution(config: &ServiceConfig, keys: usize) -> anyhow::Result<CommandResult> {
    let ring = build_ring(config)?;
    let mut counts: BTreeMap<NodeId, usize> = BTreeMap::new();
    for i in 0..keys {
        *counts.entry(ring.route(&sample_key(i))?).or_insert(0) += 1;
    }

    let nodes = ring
        .ownership()
        .into_iter()
        .map(|(node, ownership)| {
            let count = counts.get(&node).copied().unwrap_or(0);
            NodeShare {
                node,
                keys: count,
                key_fraction: if keys == 0 {
                    0.0
                } else {
                    count as f64 / keys as f64
                },
                ownership,
            }
        })
        .collect();

    Ok(CommandResult::Distribution { keys, nodes })
}

fn rebalance(config: &ServiceConfig, remove: &str, keys: usize) -> anyhow::Result<CommandResult> {
    let ring = build_ring(config)?;
    let removed = NodeId::parse(remove)?;
    if !ring.contains_node(&removed) {
        bail!("node {} is not on the ring", removed);
    }

    let before = (0..keys)
        .map(|i| ring.route(&sample_key(i)))
        .collect::<corelib::Result<Vec<_>>>()?;
    ring.remove_node(removed.as_str())?;

    let mut remapped = 0;
    let mut moved_between_survivors = 0;
    for (i, old) in before.iter().enumerate() {
        let Some(new) = ring.get_node(&sample_key(i)) else {
            // Removing the only node leaves every key without an owner.
            remapped += 1;
            continue;
        };
        if &new != old {
            remapped += 1;
            if old != &removed {
                moved_between_survivors += 1;
            }
        }
    }

    Ok(CommandResult::Rebalance {
        removed,
        keys,
        remapped,
        remapped_fraction: if keys == 0 {
            0.0
        } else {
            remapped as f64 / keys as f64
        },
        moved_between_survivors,
    })
}

async fn visit(config: &ServiceConfig, page: &str, times: u32) -> anyhow::Result<CommandResult> {
    let service = ShardedCounterService::from_config(config, |_| Arc::new(MemoryStore::new()))?;
    let node = service.node_for(page)?;

    // Prime the cache so the staleness window is visible below.
    service.get_visit_count(page).await?;
    for _ in 0..times {
        service.increment_visit(page).await?;
    }

    let cached_count = service.get_visit_count(page).await?;
    let shard = service
        .shard(&node)
        .with_context(|| format!("no shard registered for {}", node))?;
    let stored_count = shard.store().get(page).await?;

    Ok(CommandResult::Visit {
        page: page.to_string(),
        node,
        increments: times,
        cached_count,
        stored_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(nodes: &[&str]) -> ServiceConfig {
        ServiceConfig {
            nodes: nodes.iter().map(|node| node.to_string()).collect(),
            ..ServiceConfig::default()
        }
    }

    #[test]
    fn test_route_is_stable() {
        let command = Command::Route {
            keys: vec!["/home".to_string(), "/about".to_string()],
        };
        let first = command.execute(&config(&["a", "b", "c"])).unwrap();
        let second = command.execute(&config(&["a", "b", "c"])).unwrap();
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn test_distribution_counts_every_key() {
        let result = Command::Distribution { keys: 1_000 }
            .execute(&config(&["a", "b", "c"]))
            .unwrap();
        let CommandResult::Distribution { keys, nodes } = result else {
            panic!("unexpected command result");
        };
        assert_eq!(keys, 1_000);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes.iter().map(|share| share.keys).sum::<usize>(), 1_000);
    }

    #[test]
    fn test_rebalance_only_moves_removed_keys() {
        let result = Command::Rebalance {
            remove: "b".to_string(),
            keys: 2_000,
        }
        .execute(&config(&["a", "b", "c"]))
        .unwrap();
        let CommandResult::Rebalance {
            remapped,
            moved_between_survivors,
            ..
        } = result
        else {
            panic!("unexpected command result");
        };
        assert!(remapped > 0);
        assert_eq!(moved_between_survivors, 0);
    }

    #[test]
    fn test_rebalance_unknown_node_fails() {
        let command = Command::Rebalance {
            remove: "z".to_string(),
            keys: 10,
        };
        assert!(command.execute(&config(&["a", "b"])).is_err());
    }

    #[test]
    fn test_visit_shows_stale_cached_count() {
        let result = Command::Visit {
            page: "/home".to_string(),
            times: 3,
        }
        .execute(&config(&["a", "b"]))
        .unwrap();
        let CommandResult::Visit {
            cached_count,
            stored_count,
            ..
        } = result
        else {
            panic!("unexpected command result");
        };
        assert_eq!(cached_count, 0);
        assert_eq!(stored_count, 3);
    }
}
