//! Bincode Block Codec
//!
//! Implements the `BlockCodec` port with bincode, the node's block
//! serialization format.

use crate::domain::{Block, CodecError};
use crate::ports::outbound::BlockCodec;

/// Default block codec using bincode.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeBlockCodec;

impl BlockCodec for BincodeBlockCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Block, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError {
            message: e.to_string(),
        })
    }

    fn encode(&self, block: &Block) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(block).map_err(|e| CodecError {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlockHeader, ChunkHeader, CryptoHash};

    #[test]
    fn test_decode_encoded_block() {
        let block = Block {
            author: "node0".to_string(),
            header: BlockHeader {
                height: 5,
                hash: CryptoHash([5u8; 32]),
                gas_price: 100_000_000,
                ..Default::default()
            },
            chunks: vec![ChunkHeader {
                shard_id: 1,
                gas_used: 42,
                ..Default::default()
            }],
        };

        let bytes = BincodeBlockCodec.encode(&block).unwrap();
        assert_eq!(BincodeBlockCodec.decode(&bytes).unwrap(), block);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(BincodeBlockCodec.decode(&[0xff, 0x01]).is_err());
    }
}
