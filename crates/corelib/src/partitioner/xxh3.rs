//! xxh3-128 partitioner, the ring default.

use crate::partitioner::traits::Partitioner;
use crate::token::xxh3::Xxh3Token;

#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Partitioner;

impl Partitioner for Xxh3Partitioner {
    type TokenType = Xxh3Token;

    fn partition(&self, key: &[u8]) -> Self::TokenType {
        Xxh3Token::from_bytes(key)
    }

    fn name(&self) -> &'static str {
        "Xxh3Partitioner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_matches_token_hash() {
        assert_eq!(
            Xxh3Partitioner.partition(b"page:/home"),
            Xxh3Token::from_key("page:/home")
        );
    }

    #[test]
    fn test_name() {
        assert_eq!(Xxh3Partitioner.name(), "Xxh3Partitioner");
    }
}
