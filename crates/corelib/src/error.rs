//! Error types for the core library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Empty or malformed node identifier passed to a ring mutation.
    #[error("Invalid node: {0}")]
    InvalidNode(String),
    /// Ring construction parameters are unusable.
    #[error("Invalid ring configuration: {0}")]
    InvalidConfig(String),
    /// The ring holds no nodes, so no key can be routed.
    #[error("No nodes available")]
    NoNodesAvailable,
}
