//! # Domain Entities
//!
//! Block record decoded from the node's instrumentation stream, plus the
//! chain-agnostic envelope handed to streaming consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base58 form of the all-zero hash, the node's "no such block" marker.
pub const SENTINEL_HASH_BASE58: &str = "11111111111111111111111111111111";

/// 32-byte block hash.
///
/// The canonical string form is base58, which is how the node itself prints
/// hashes and how the metadata cache keys its entries.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CryptoHash(pub [u8; 32]);

impl CryptoHash {
    /// The genesis-predecessor sentinel (all zero bytes).
    pub const SENTINEL: CryptoHash = CryptoHash([0u8; 32]);

    /// Canonical base58 encoding.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    /// True for the "no predecessor" sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CryptoHash({})", self.to_base58())
    }
}

impl From<[u8; 32]> for CryptoHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Canonical base58 encoding of an arbitrary byte string.
///
/// Hashes read off a log line are raw hex, so they are compared against the
/// payload through this encoding rather than as fixed-size arrays.
pub fn encode_hash(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Block header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block height.
    pub height: u64,
    /// Hash of this block.
    pub hash: CryptoHash,
    /// Hash of the parent block.
    pub prev_hash: CryptoHash,
    /// Height of the parent block. Zero when the node did not record it.
    pub prev_height: u64,
    /// Hash of the last final (irreversible) block.
    pub last_final_block: CryptoHash,
    /// Height of the last final block, resolved by the reader.
    pub last_final_block_height: u64,
    /// Block production time, nanoseconds since the Unix epoch.
    pub timestamp_nanosec: u64,
    /// Epoch identifier.
    pub epoch_id: CryptoHash,
    /// Gas price in effect for this block.
    pub gas_price: u128,
}

/// Header of one shard chunk included in a block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkHeader {
    /// Chunk hash.
    pub chunk_hash: CryptoHash,
    /// Shard the chunk belongs to.
    pub shard_id: u64,
    /// Height at which the chunk was produced.
    pub height_created: u64,
    /// Gas consumed by the chunk.
    pub gas_used: u64,
}

/// Full block record as serialized by the node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Account that produced the block.
    pub author: String,
    /// Block header.
    pub header: BlockHeader,
    /// Chunk headers.
    pub chunks: Vec<ChunkHeader>,
}

impl Block {
    /// Block height.
    pub fn number(&self) -> u64 {
        self.header.height
    }

    /// Canonical block id.
    pub fn id(&self) -> String {
        self.header.hash.to_base58()
    }

    /// Canonical parent id.
    pub fn previous_id(&self) -> String {
        self.header.prev_hash.to_base58()
    }

    /// Block production time.
    pub fn time(&self) -> DateTime<Utc> {
        nanos_to_time(self.header.timestamp_nanosec)
    }
}

/// Converts a nanosecond Unix timestamp to a UTC date, saturating at the
/// largest representable instant.
pub fn nanos_to_time(nanos: u64) -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(i64::try_from(nanos).unwrap_or(i64::MAX))
}

/// Chain-agnostic block envelope produced for downstream consumers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedBlock {
    /// Canonical block id.
    pub id: String,
    /// Block height.
    pub number: u64,
    /// Canonical parent id.
    pub parent_id: String,
    /// Resolved parent height.
    pub parent_number: u64,
    /// Resolved last irreversible block height.
    pub lib_number: u64,
    /// Block production time.
    pub timestamp: DateTime<Utc>,
    /// Codec-encoded block.
    pub payload: Vec<u8>,
}

impl EncodedBlock {
    /// Wraps an already encoded block.
    pub fn new(block: &Block, payload: Vec<u8>) -> Self {
        Self {
            id: block.id(),
            number: block.number(),
            parent_id: block.previous_id(),
            parent_number: block.header.prev_height,
            lib_number: block.header.last_final_block_height,
            timestamp: block.time(),
            payload,
        }
    }
}
