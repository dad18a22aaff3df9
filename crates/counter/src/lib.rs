//! Sharded page-visit counters.
//!
//! Keys are routed to backing counter stores through a consistent hash ring
//! ([`corelib::HashRing`]); reads go through a per-shard [`LocalCache`] that
//! serves values up to a fixed TTL old and collapses concurrent refreshes of
//! the same key into a single store fetch.
//!
//! # Consistency
//!
//! Increments are written through to the store immediately and do not touch
//! the cache. A read following an increment may therefore return a value that
//! is up to one TTL stale.

pub mod cache;
pub mod config;
pub mod error;
pub mod service;
pub mod store;

pub use cache::{LocalCache, DEFAULT_TTL};
pub use config::ServiceConfig;
pub use error::{CounterError, Result};
pub use service::ShardedCounterService;
pub use store::{CounterStore, MemoryStore};
