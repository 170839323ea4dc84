//! # Outbound Ports
//!
//! Dependencies the console reader needs from its host: a fallback metadata
//! lookup and a block payload codec.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::{Block, BlockMeta, CodecError, FetchError};

/// Block metadata lookup used on a cache miss - outbound port.
///
/// Production: `RpcBlockMetaFetcher` (node JSON-RPC)
/// Testing: `MockBlockMetaFetcher` (below)
#[async_trait]
pub trait BlockMetaFetcher: Send + Sync {
    /// Look up a block by canonical id.
    ///
    /// Returns `Ok(None)` when the block is unknown.
    async fn fetch(&self, id: &str) -> Result<Option<BlockMeta>, FetchError>;
}

/// Block payload codec - outbound port.
pub trait BlockCodec: Send + Sync {
    /// Decode the bytes embedded in a block line.
    fn decode(&self, bytes: &[u8]) -> Result<Block, CodecError>;

    /// Encode a block for downstream consumers.
    fn encode(&self, block: &Block) -> Result<Vec<u8>, CodecError>;
}

/// Fetcher for sessions with no node RPC: every miss is "not found".
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFallbackFetcher;

#[async_trait]
impl BlockMetaFetcher for NoFallbackFetcher {
    async fn fetch(&self, _id: &str) -> Result<Option<BlockMeta>, FetchError> {
        Ok(None)
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock fetcher serving a fixed set of metas and counting calls.
#[derive(Debug, Default)]
pub struct MockBlockMetaFetcher {
    /// Known blocks by id.
    pub metas: HashMap<String, BlockMeta>,
    /// Should return errors?
    pub should_fail: bool,
    /// Number of `fetch` calls.
    pub calls: AtomicUsize,
}

impl MockBlockMetaFetcher {
    /// Mock that knows the given blocks.
    pub fn with_metas(metas: Vec<BlockMeta>) -> Self {
        Self {
            metas: metas.into_iter().map(|m| (m.id.clone(), m)).collect(),
            ..Default::default()
        }
    }

    /// Number of `fetch` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlockMetaFetcher for MockBlockMetaFetcher {
    async fn fetch(&self, id: &str) -> Result<Option<BlockMeta>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(FetchError("Mock failure".to_string()));
        }
        Ok(self.metas.get(id).cloned())
    }
}
