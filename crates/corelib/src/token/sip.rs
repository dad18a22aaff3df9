//! 64-bit SipHash-1-3 token.

use std::fmt;
use std::hash::Hasher;

use crate::token::traits::Token;
use siphasher::sip::SipHasher13;

const KEYSPACE: f64 = 18_446_744_073_709_551_616.0;

/// Token on the 64-bit ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SipToken(pub u64);

impl Token for SipToken {
    fn distance_to(&self, other: &Self) -> Self {
        SipToken(other.0.wrapping_sub(self.0))
    }

    fn fraction(&self) -> f64 {
        self.0 as f64 / KEYSPACE
    }
}

impl SipToken {
    /// Creates a token by hashing a byte slice with fixed zero keys.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = SipHasher13::new();
        hasher.write(data);
        SipToken(hasher.finish())
    }

    /// Creates a token from a string key.
    pub fn from_key(key: &str) -> Self {
        Self::from_bytes(key.as_bytes())
    }
}

impl fmt::Display for SipToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
