//! Core token trait definitions.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Minimal token trait for the hash ring.
///
/// Tokens are immutable, comparable positions on a fixed-width circular
/// keyspace. Implementations must be thread-safe and cheap to compare/hash.
pub trait Token: Copy + Ord + Hash + Send + Sync + Debug + Display + 'static {
    /// Clockwise distance from `self` to `other` on the ring.
    fn distance_to(&self, other: &Self) -> Self;
    /// This token's value as a fraction of the whole keyspace, in `[0, 1)`.
    fn fraction(&self) -> f64;
}
