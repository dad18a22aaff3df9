//! Builder for [`HashRing`].

use crate::error::Result;
use crate::partitioner::{Partitioner, Xxh3Partitioner};
use crate::ring::HashRing;
use crate::vnode::DEFAULT_VNODES;

/// Collects ring parameters and initial members, then builds the ring.
///
/// # Example
///
/// ```rust
/// use corelib::RingBuilder;
///
/// let ring = RingBuilder::new()
///     .with_vnodes(8)
///     .add_nodes(["redis-a", "redis-b"])
///     .build()
///     .unwrap();
/// assert_eq!(ring.node_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RingBuilder<P: Partitioner = Xxh3Partitioner> {
    partitioner: P,
    virtual_nodes: usize,
    nodes: Vec<String>,
}

impl RingBuilder<Xxh3Partitioner> {
    pub fn new() -> Self {
        Self {
            partitioner: Xxh3Partitioner,
            virtual_nodes: DEFAULT_VNODES,
            nodes: Vec::new(),
        }
    }
}

impl Default for RingBuilder<Xxh3Partitioner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Partitioner> RingBuilder<P> {
    /// Swap the partitioner, keeping vnode count and nodes.
    pub fn with_partitioner<Q: Partitioner>(self, partitioner: Q) -> RingBuilder<Q> {
        RingBuilder {
            partitioner,
            virtual_nodes: self.virtual_nodes,
            nodes: self.nodes,
        }
    }

    pub fn with_vnodes(mut self, virtual_nodes: usize) -> Self {
        self.virtual_nodes = virtual_nodes;
        self
    }

    pub fn add_node(mut self, node: impl Into<String>) -> Self {
        self.nodes.push(node.into());
        self
    }

    pub fn add_nodes<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes.extend(nodes.into_iter().map(Into::into));
        self
    }

    /// Build the ring, adding nodes in the order given.
    ///
    /// Fails on a zero vnode count or an empty node identifier.
    pub fn build(self) -> Result<HashRing<P>> {
        let ring = HashRing::with_partitioner(self.partitioner, self.virtual_nodes)?;
        for node in &self.nodes {
            ring.add_node(node)?;
        }
        Ok(ring)
    }
}
