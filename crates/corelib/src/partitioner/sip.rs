//! SipHash-1-3 partitioner over a 64-bit token space.

use crate::partitioner::traits::Partitioner;
use crate::token::sip::SipToken;

#[derive(Clone, Copy, Debug, Default)]
pub struct SipPartitioner;

impl Partitioner for SipPartitioner {
    type TokenType = SipToken;

    fn partition(&self, key: &[u8]) -> Self::TokenType {
        SipToken::from_bytes(key)
    }

    fn name(&self) -> &'static str {
        "SipPartitioner"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_is_deterministic() {
        assert_eq!(SipPartitioner.partition(b"k"), SipPartitioner.partition(b"k"));
        assert_eq!(SipPartitioner.partition(b"k"), SipToken::from_key("k"));
        assert_eq!(SipPartitioner.name(), "SipPartitioner");
    }
}
