//! Node identifiers for the consistent hash ring.
//!
//! A node is one physical backing-store instance. It has no identity beyond
//! its string value, so `NodeId` wraps an `Arc<str>` to keep clones cheap
//! on the lookup path.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Identifier of a physical node. Never empty.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Parse a node identifier, kept exactly as given.
    ///
    /// Fails with [`Error::InvalidNode`] if `raw` is empty.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::InvalidNode(
                "node identifier must be non-empty".to_string(),
            ));
        }
        Ok(NodeId(Arc::from(raw)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NodeId::parse(s)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NodeId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse a comma-separated node list such as `"redis-a, redis-b,redis-c"`.
///
/// Segments are trimmed, empty ones skipped and duplicates dropped, keeping
/// first-seen order.
pub fn parse_node_list(raw: &str) -> Vec<NodeId> {
    let mut nodes: Vec<NodeId> = Vec::new();
    for segment in raw.split(',') {
        if let Ok(node) = NodeId::parse(segment.trim()) {
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_raw_value() {
        let node = NodeId::parse("redis-a ").unwrap();
        assert_eq!(node.as_str(), "redis-a ");
        assert_ne!(node, NodeId::parse("redis-a").unwrap());
        assert_eq!(NodeId::parse(" ").unwrap().as_str(), " ");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(NodeId::parse(""), Err(Error::InvalidNode(_))));
    }

    #[test]
    fn test_parse_node_list() {
        let nodes = parse_node_list("a, b,,c ,a");
        let names: Vec<&str> = nodes.iter().map(NodeId::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(parse_node_list(" , ").is_empty());
    }
}
