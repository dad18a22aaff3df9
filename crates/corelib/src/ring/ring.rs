//! Hash ring data structure.
//!
//! Ring state is a `BTreeMap<Token, NodeId>`: the ordered position sequence
//! is the map's key order, so positions and owners can never drift apart.
//!
//! # Concurrency
//!
//! The map sits behind a `parking_lot::RwLock`. `add_node` and `remove_node`
//! hold the write lock for their whole mutation, so a concurrent `get_node`
//! sees either the ring before or after a membership change, never a partial
//! one. Hashing of vnode keys happens before the lock is taken.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::partitioner::{Partitioner, Xxh3Partitioner};
use crate::token::Token;
use crate::vnode::{VirtualNode, DEFAULT_VNODES};

/// Consistent hash ring mapping keys to nodes.
///
/// # Example
///
/// ```rust
/// use corelib::HashRing;
///
/// let ring = HashRing::new();
/// ring.add_node("redis-a").unwrap();
/// ring.add_node("redis-b").unwrap();
///
/// let owner = ring.get_node("page:/home").unwrap();
/// assert!(owner.as_str() == "redis-a" || owner.as_str() == "redis-b");
/// ```
pub struct HashRing<P: Partitioner = Xxh3Partitioner> {
    partitioner: P,
    virtual_nodes: usize,
    state: RwLock<BTreeMap<P::TokenType, NodeId>>,
}

impl HashRing<Xxh3Partitioner> {
    /// Empty ring with the default partitioner and [`DEFAULT_VNODES`] per node.
    pub fn new() -> Self {
        Self {
            partitioner: Xxh3Partitioner,
            virtual_nodes: DEFAULT_VNODES,
            state: RwLock::new(BTreeMap::new()),
        }
    }

    /// Empty ring with the default partitioner and `virtual_nodes` per node.
    pub fn with_vnodes(virtual_nodes: usize) -> Result<Self> {
        Self::with_partitioner(Xxh3Partitioner, virtual_nodes)
    }
}

impl Default for HashRing<Xxh3Partitioner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Partitioner> HashRing<P> {
    /// Empty ring using `partitioner` to place vnodes and keys.
    ///
    /// Fails with [`Error::InvalidConfig`] if `virtual_nodes` is zero.
    pub fn with_partitioner(partitioner: P, virtual_nodes: usize) -> Result<Self> {
        if virtual_nodes == 0 {
            return Err(Error::InvalidConfig(
                "virtual_nodes must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            partitioner,
            virtual_nodes,
            state: RwLock::new(BTreeMap::new()),
        })
    }

    /// Add a node's virtual positions to the ring.
    ///
    /// A position that is already taken keeps its current owner (first writer
    /// wins), which also makes repeated adds of the same node a no-op.
    /// Returns the number of positions inserted.
    ///
    /// # Performance
    /// - **Time**: O(V log R), V = virtual nodes, R = ring size
    pub fn add_node(&self, node: &str) -> Result<usize> {
        let node_id = NodeId::parse(node)?;
        let vnodes = VirtualNode::all_for(&self.partitioner, &node_id, self.virtual_nodes);

        let mut inserted = 0;
        let mut state = self.state.write();
        for vnode in vnodes {
            match state.entry(vnode.token) {
                Entry::Vacant(slot) => {
                    slot.insert(vnode.node_id);
                    inserted += 1;
                }
                Entry::Occupied(owner) if owner.get() != &node_id => {
                    debug!(
                        token = %vnode.token,
                        node = %node_id,
                        owner = %owner.get(),
                        "vnode position collision, keeping existing owner"
                    );
                }
                Entry::Occupied(_) => {}
            }
        }
        drop(state);

        debug!(node = %node_id, inserted, "added node to ring");
        Ok(inserted)
    }

    /// Remove a node's virtual positions from the ring.
    ///
    /// Only positions currently owned by `node` are removed; positions lost to
    /// another node through a collision are left alone. Removing an unknown
    /// node is a no-op, and so is removing `""`, which can never have been
    /// added. Returns the number of positions removed.
    pub fn remove_node(&self, node: &str) -> Result<usize> {
        let Ok(node_id) = NodeId::parse(node) else {
            return Ok(0);
        };
        let vnodes = VirtualNode::all_for(&self.partitioner, &node_id, self.virtual_nodes);

        let mut removed = 0;
        let mut state = self.state.write();
        for vnode in vnodes {
            if state.get(&vnode.token) == Some(&node_id) {
                state.remove(&vnode.token);
                removed += 1;
            }
        }
        drop(state);

        debug!(node = %node_id, removed, "removed node from ring");
        Ok(removed)
    }

    /// Node owning `key`: the owner of the first position at or after the
    /// key's hash, wrapping to the smallest position.
    ///
    /// Returns `None` when the ring is empty.
    ///
    /// # Performance
    /// - **Time**: O(log R)
    pub fn get_node(&self, key: &str) -> Option<NodeId> {
        let token = self.partitioner.partition(key.as_bytes());
        let state = self.state.read();
        state
            .range(token..)
            .next()
            .or_else(|| state.iter().next())
            .map(|(_, node)| node.clone())
    }

    /// Like [`get_node`](Self::get_node), with an empty ring reported as
    /// [`Error::NoNodesAvailable`].
    pub fn route(&self, key: &str) -> Result<NodeId> {
        self.get_node(key).ok_or(Error::NoNodesAvailable)
    }

    /// Number of distinct nodes owning at least one position.
    pub fn node_count(&self) -> usize {
        self.state.read().values().collect::<BTreeSet<_>>().len()
    }

    /// Number of positions on the ring.
    pub fn token_count(&self) -> usize {
        self.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// Distinct nodes on the ring, sorted.
    pub fn nodes(&self) -> Vec<NodeId> {
        let state = self.state.read();
        let distinct: BTreeSet<&NodeId> = state.values().collect();
        distinct.into_iter().cloned().collect()
    }

    pub fn contains_node(&self, node: &NodeId) -> bool {
        self.state.read().values().any(|owner| owner == node)
    }

    /// All `(token, node)` pairs in ring order.
    pub fn tokens(&self) -> Vec<(P::TokenType, NodeId)> {
        self.state
            .read()
            .iter()
            .map(|(token, node)| (*token, node.clone()))
            .collect()
    }

    /// Fraction of the keyspace owned by each node.
    ///
    /// A position owns the arc from its predecessor (exclusive) up to itself
    /// (inclusive). Fractions sum to 1 on a non-empty ring.
    pub fn ownership(&self) -> BTreeMap<NodeId, f64> {
        let state = self.state.read();
        let mut shares = BTreeMap::new();

        let Some((last, only_owner)) = state.iter().next_back() else {
            return shares;
        };
        if state.len() == 1 {
            shares.insert(only_owner.clone(), 1.0);
            return shares;
        }

        let mut prev = *last;
        for (token, owner) in state.iter() {
            let arc = prev.distance_to(token).fraction();
            *shares.entry(owner.clone()).or_insert(0.0) += arc;
            prev = *token;
        }
        shares
    }

    pub fn virtual_nodes(&self) -> usize {
        self.virtual_nodes
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }
}

impl<P: Partitioner> fmt::Debug for HashRing<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("partitioner", &self.partitioner.name())
            .field("virtual_nodes", &self.virtual_nodes)
            .field("tokens", &self.token_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Xxh3Token;

    #[test]
    fn test_collision_keeps_first_writer() {
        let ring = HashRing::with_vnodes(4).unwrap();
        ring.add_node("a").unwrap();

        // Claim one of b's positions for a, as if a's vnode had collided.
        let stolen = VirtualNode::from_index(&Xxh3Partitioner, NodeId::parse("b").unwrap(), 0);
        ring.state
            .write()
            .insert(stolen.token, NodeId::parse("a").unwrap());

        assert_eq!(ring.add_node("b").unwrap(), 3);
        assert_eq!(
            ring.state.read().get(&stolen.token).map(NodeId::as_str),
            Some("a")
        );

        // b never owned the stolen position, so removing b leaves it with a.
        assert_eq!(ring.remove_node("b").unwrap(), 3);
        assert_eq!(ring.token_count(), 5);
        assert_eq!(ring.nodes(), vec![NodeId::parse("a").unwrap()]);
    }

    #[test]
    fn test_lookup_wraps_past_largest_token() {
        let ring = HashRing::with_vnodes(1).unwrap();
        let a = NodeId::parse("a").unwrap();
        let b = NodeId::parse("b").unwrap();
        {
            let mut state = ring.state.write();
            state.insert(Xxh3Token(10), a.clone());
            state.insert(Xxh3Token(20), b.clone());
        }

        let key_token = Xxh3Token::from_key("any-key");
        let expected = if key_token <= Xxh3Token(10) || key_token > Xxh3Token(20) {
            a
        } else {
            b
        };
        assert_eq!(ring.get_node("any-key"), Some(expected));
    }

    #[test]
    fn test_ownership_arcs() {
        let ring = HashRing::with_vnodes(1).unwrap();
        let a = NodeId::parse("a").unwrap();
        let b = NodeId::parse("b").unwrap();
        {
            let mut state = ring.state.write();
            state.insert(Xxh3Token(0), a.clone());
            state.insert(Xxh3Token(1u128 << 126), b.clone());
        }

        let shares = ring.ownership();
        assert!((shares[&b] - 0.25).abs() < 1e-9);
        assert!((shares[&a] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_zero_vnodes_rejected() {
        assert!(matches!(
            HashRing::with_vnodes(0),
            Err(Error::InvalidConfig(_))
        ));
    }
}
