//! Token abstraction module for consistent hashing.
//!
//! Tokens represent positions on the hash ring and must be comparable,
//! hashable, and thread-safe.

pub mod sip;
pub mod traits;
pub mod xxh3;

pub use sip::SipToken;
pub use traits::Token;
pub use xxh3::Xxh3Token;
