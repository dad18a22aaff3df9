//! Error types for the counter service.

use corelib::NodeId;
use thiserror::Error;

/// Result type alias for the counter service.
pub type Result<T> = std::result::Result<T, CounterError>;

/// Errors surfaced by stores, caches and the sharded service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterError {
    /// Empty or malformed node identifier.
    #[error("Invalid node: {0}")]
    InvalidNode(String),
    /// Unusable service configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The ring is empty; no store was contacted.
    #[error("No nodes available")]
    NoNodesAvailable,
    /// The backing store is unreachable or returned an error.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    /// The ring routed to a node with no registered store.
    #[error("No shard registered for node {0}")]
    UnknownShard(NodeId),
    /// A cache refresh task died before producing a result.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<corelib::Error> for CounterError {
    fn from(err: corelib::Error) -> Self {
        match err {
            corelib::Error::InvalidNode(msg) => CounterError::InvalidNode(msg),
            corelib::Error::InvalidConfig(msg) => CounterError::InvalidConfig(msg),
            corelib::Error::NoNodesAvailable => CounterError::NoNodesAvailable,
        }
    }
}
