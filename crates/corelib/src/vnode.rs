//! Virtual node abstractions.
//!
//! # Virtual Nodes (VNodes) Concept
//!
//! Instead of each physical node having a single token on the ring, each node
//! has multiple tokens (virtual nodes). This gives:
//!
//! 1. **Better Load Distribution**: more tokens give a smoother spread of keys
//! 2. **Gradual Rebalancing**: when nodes join/leave, only a fraction of keys move
//!
//! # Performance Characteristics
//!
//! - **Memory**: O(v) where v = number of vnodes per node
//! - **Lookup**: O(log n) where n = total vnodes
//! - **Rebalancing**: roughly k/N keys move when one of N nodes joins/leaves
//!
//! Virtual nodes are derived, never stored on their own: the ring keeps only
//! `token -> node` pairs and recomputes a node's vnodes from its identifier
//! whenever it needs them.

use crate::node::NodeId;
use crate::partitioner::Partitioner;
use crate::token::Token;

/// Separator between node identifier and vnode index in the hashed key.
pub const VNODE_SEPARATOR: char = '#';

/// Default number of virtual nodes per physical node.
pub const DEFAULT_VNODES: usize = 100;

/// Key hashed to place vnode `index` of `node`, e.g. `"redis-a#7"`.
pub fn vnode_key(node: &NodeId, index: usize) -> String {
    format!("{}{}{}", node, VNODE_SEPARATOR, index)
}

/// A virtual node on the hash ring.
///
/// Represents a single token position owned by a physical node.
///
/// # Example
///
/// ```rust
/// use corelib::{NodeId, VirtualNode};
/// use corelib::partitioner::Xxh3Partitioner;
///
/// let node = NodeId::parse("redis-a").unwrap();
/// let vnode = VirtualNode::from_index(&Xxh3Partitioner, node.clone(), 0);
/// assert_eq!(vnode.node_id(), &node);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode<T: Token> {
    /// Token position on the ring.
    pub token: T,
    /// The physical node that owns this virtual node.
    pub node_id: NodeId,
}

impl<T: Token> VirtualNode<T> {
    #[inline]
    pub fn new(token: T, node_id: NodeId) -> Self {
        Self { token, node_id }
    }

    /// Create vnode `vnode_index` of `node_id` by hashing `"node_id#vnode_index"`.
    pub fn from_index<P>(partitioner: &P, node_id: NodeId, vnode_index: usize) -> Self
    where
        P: Partitioner<TokenType = T>,
    {
        let token = partitioner.partition(vnode_key(&node_id, vnode_index).as_bytes());
        Self::new(token, node_id)
    }

    /// All `count` vnodes of `node_id`, in index order.
    pub fn all_for<P>(partitioner: &P, node_id: &NodeId, count: usize) -> Vec<Self>
    where
        P: Partitioner<TokenType = T>,
    {
        (0..count)
            .map(|i| Self::from_index(partitioner, node_id.clone(), i))
            .collect()
    }

    #[inline]
    pub fn token(&self) -> T {
        self.token
    }

    #[inline]
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Clockwise distance to another virtual node.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> T {
        self.token.distance_to(&other.token)
    }
}

impl<T: Token> std::fmt::Display for VirtualNode<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VNode(token={}, node={})", self.token, self.node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partitioner::{SipPartitioner, Xxh3Partitioner};
    use crate::token::{SipToken, Xxh3Token};

    fn node(name: &str) -> NodeId {
        NodeId::parse(name).unwrap()
    }

    #[test]
    fn test_vnode_key_format() {
        assert_eq!(vnode_key(&node("redis-a"), 7), "redis-a#7");
    }

    #[test]
    fn test_vnode_from_index() {
        let vnode0 = VirtualNode::from_index(&Xxh3Partitioner, node("a"), 0);
        let vnode1 = VirtualNode::from_index(&Xxh3Partitioner, node("a"), 1);

        assert_ne!(vnode0.token(), vnode1.token());
        assert_eq!(vnode0.node_id(), vnode1.node_id());
        assert_eq!(vnode0.token(), Xxh3Token::from_key("a#0"));
    }

    #[test]
    fn test_vnode_from_index_sip() {
        let vnode = VirtualNode::from_index(&SipPartitioner, node("a"), 3);
        assert_eq!(vnode.token(), SipToken::from_key("a#3"));
    }

    #[test]
    fn test_all_for_is_deterministic() {
        let first = VirtualNode::all_for(&Xxh3Partitioner, &node("a"), 16);
        let second = VirtualNode::all_for(&Xxh3Partitioner, &node("a"), 16);
        assert_eq!(first.len(), 16);
        assert_eq!(first, second);
    }

    #[test]
    fn test_vnode_distance_and_ordering() {
        let vnode1 = VirtualNode::new(Xxh3Token(100), node("a"));
        let vnode2 = VirtualNode::new(Xxh3Token(200), node("b"));

        assert_eq!(vnode1.distance_to(&vnode2), Xxh3Token(100));
        assert!(vnode1 < vnode2);
    }
}
