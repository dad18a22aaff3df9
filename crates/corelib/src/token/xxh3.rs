//! 128-bit xxh3 token, the default ring position type.

use std::fmt;

use crate::token::traits::Token;
use xxhash_rust::xxh3::xxh3_128;

/// 2^128 as a float, for keyspace fractions.
const KEYSPACE: f64 = 340_282_366_920_938_463_463_374_607_431_768_211_456.0;

/// Token on the 128-bit ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Xxh3Token(pub u128);

impl Token for Xxh3Token {
    fn distance_to(&self, other: &Self) -> Self {
        Xxh3Token(other.0.wrapping_sub(self.0))
    }

    fn fraction(&self) -> f64 {
        self.0 as f64 / KEYSPACE
    }
}

impl Xxh3Token {
    /// Creates a token by hashing a byte slice.
    pub fn from_bytes(data: &[u8]) -> Self {
        Xxh3Token(xxh3_128(data))
    }

    /// Creates a token from a string key.
    pub fn from_key(key: &str) -> Self {
        Self::from_bytes(key.as_bytes())
    }
}

impl fmt::Display for Xxh3Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_is_deterministic() {
        assert_eq!(Xxh3Token::from_key("page-1"), Xxh3Token::from_key("page-1"));
        assert_ne!(Xxh3Token::from_key("page-1"), Xxh3Token::from_key("page-2"));
    }

    #[test]
    fn test_distance_wraps() {
        let a = Xxh3Token(u128::MAX - 1);
        let b = Xxh3Token(2);
        assert_eq!(a.distance_to(&b), Xxh3Token(4));
        assert_eq!(b.distance_to(&a), Xxh3Token(u128::MAX - 3));
    }

    #[test]
    fn test_fraction() {
        assert_eq!(Xxh3Token(0).fraction(), 0.0);
        let half = Xxh3Token(1u128 << 127);
        assert!((half.fraction() - 0.5).abs() < 1e-12);
    }
}
