//! # Block Linkage
//!
//! Cross-checks a decoded payload against the ancestry declared on its log
//! line, and fills in the parent and LIB heights.

use crate::domain::{
    encode_hash, Block, BlockMetaCache, CryptoHash, LineError, LinkageField, ParsingStats,
};

use super::line_parser::{BlockLine, CurrentBlockLine};

/// Check the payload's parent height, parent hash and LIB hash against the
/// values declared on a current-schema line.
///
/// `expected` in the error is the line's value, `actual` the payload's.
pub fn validate_linkage(line: &CurrentBlockLine, block: &Block) -> Result<(), LineError> {
    let header = &block.header;

    if header.prev_height != line.parent_height {
        return Err(LineError::LinkageValidation {
            field: LinkageField::ParentHeight,
            expected: line.parent_height.to_string(),
            actual: header.prev_height.to_string(),
        });
    }

    check_hash(LinkageField::ParentHash, &line.parent_hash, &header.prev_hash)?;
    check_hash(LinkageField::LibHash, &line.lib_hash, &header.last_final_block)?;

    Ok(())
}

fn check_hash(field: LinkageField, declared: &[u8], stored: &CryptoHash) -> Result<(), LineError> {
    let expected = encode_hash(declared);
    let actual = stored.to_base58();
    if expected != actual {
        return Err(LineError::LinkageValidation {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Resolve `prev_height` and `last_final_block_height` on `block`.
///
/// - A sentinel hash resolves to `first_streamable_block` without a lookup.
/// - The parent height is looked up when the line is legacy or declared a
///   zero parent height; otherwise the declared value stands.
/// - The LIB height is never on the line, so it is always looked up.
pub async fn resolve_heights(
    line: &BlockLine,
    block: &mut Block,
    cache: &mut BlockMetaCache,
    first_streamable_block: u64,
    stats: &mut ParsingStats,
) -> Result<(), LineError> {
    let header = &mut block.header;

    if header.prev_hash.is_sentinel() {
        header.prev_height = first_streamable_block;
    } else if line.is_legacy() || header.prev_height == 0 {
        stats.inc("meta_lookups", 1);
        let meta = cache
            .get(&header.prev_hash.to_base58())
            .await
            .map_err(|source| LineError::MetadataResolution {
                role: "prev height",
                source,
            })?;
        header.prev_height = meta.height;
    }

    if header.last_final_block.is_sentinel() {
        header.last_final_block_height = first_streamable_block;
    } else {
        stats.inc("meta_lookups", 1);
        let meta = cache
            .get(&header.last_final_block.to_base58())
            .await
            .map_err(|source| LineError::MetadataResolution {
                role: "lib",
                source,
            })?;
        header.last_final_block_height = meta.height;
    }

    Ok(())
}
