//! # Block Line Decoder
//!
//! Turns the fields of one `BLOCK` line into a validated block with its
//! parent and LIB heights resolved.

use std::sync::Arc;

use crate::algorithms::{parse_block_fields, resolve_heights, validate_linkage, BlockLine};
use crate::domain::{Block, BlockMeta, BlockMetaCache, LineError, ParsingStats};
use crate::ports::outbound::{BlockCodec, BlockMetaFetcher};

/// Decodes block lines for one reader session.
pub struct BlockLineDecoder<C: BlockCodec> {
    /// Block payload codec.
    codec: C,
    /// Recently decoded blocks.
    cache: BlockMetaCache,
    /// Height given to sentinel ancestors.
    first_streamable_block: u64,
}

impl<C: BlockCodec> BlockLineDecoder<C> {
    /// Create a decoder with an empty metadata cache.
    pub fn new(
        codec: C,
        meta_cache_capacity: usize,
        fetcher: Arc<dyn BlockMetaFetcher>,
        first_streamable_block: u64,
    ) -> Self {
        Self {
            codec,
            cache: BlockMetaCache::new(meta_cache_capacity, fetcher),
            first_streamable_block,
        }
    }

    /// Decode the fields following the `BLOCK` keyword.
    ///
    /// # Steps
    /// 1. Split into the current or legacy schema
    /// 2. Deserialize the block bytes
    /// 3. Cross-check declared ancestry (current schema only)
    /// 4. Resolve parent and LIB heights
    /// 5. Record the block in the metadata cache
    pub async fn decode(&mut self, fields: &str) -> Result<Block, LineError> {
        let line = parse_block_fields(fields)?;
        let mut stats = ParsingStats::new(line.height());

        let mut block = self.codec.decode(line.block_bytes())?;

        if let BlockLine::Current(current) = &line {
            validate_linkage(current, &block)?;
        }

        resolve_heights(
            &line,
            &mut block,
            &mut self.cache,
            self.first_streamable_block,
            &mut stats,
        )
        .await?;

        self.cache
            .push(BlockMeta::new(block.id(), block.number(), block.time()));

        stats.log();
        Ok(block)
    }

    /// Block payload codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Metadata cache.
    pub fn cache(&self) -> &BlockMetaCache {
        &self.cache
    }

    /// Mutable metadata cache, for seeding and targeted purges.
    pub fn cache_mut(&mut self) -> &mut BlockMetaCache {
        &mut self.cache
    }
}
