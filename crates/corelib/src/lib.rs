//! Core library for consistent hashing.
//!
//! This crate provides the fundamental abstractions for routing keys to
//! backing-store nodes:
//! - Node identifiers
//! - Token types and partitioners (hash functions)
//! - Virtual node derivation
//! - The hash ring and its builder

pub mod error;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod token;
pub mod vnode;

pub use error::{Error, Result};
pub use node::{parse_node_list, NodeId};
pub use partitioner::Partitioner;
pub use ring::{HashRing, Ring, RingBuilder};
pub use token::Token;
pub use vnode::{VirtualNode, DEFAULT_VNODES};
