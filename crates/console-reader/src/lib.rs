//! # Console Reader
//!
//! Decodes the instrumentation stream a blockchain node prints to stdout into
//! validated, strictly ordered block records.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! The node announces each block on a single line:
//!
//! ```text
//! FIRE BLOCK <height> <hash> <parent_height> <parent_hash> <lib_hash> <timestamp> <block_hex> <reserved>
//! ```
//!
//! The reader checks the embedded block against the ancestry declared on the
//! line and resolves the parent and last irreversible block (LIB) heights,
//! which the line does not always carry, through a bounded cache of recently
//! seen blocks with a node RPC fallback.
//!
//! ## Failure Policy
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | No marker / unknown command | Line skipped |
//! | Bad field count or field encoding | Session fails |
//! | Payload not a block | Session fails |
//! | Ancestry mismatch | Session fails |
//! | Ancestor unknown to cache and RPC | Session fails |
//!
//! ## Module Structure
//!
//! ```text
//! console-reader/
//! ├── domain/          # Block, BlockMeta, BlockMetaCache, errors, stats
//! ├── algorithms/      # Line classification, block line parsing, linkage
//! ├── ports/           # BlockReader (inbound), fetcher + codec (outbound)
//! ├── adapters/        # Bincode codec, RPC fetcher, line scanner
//! ├── application/     # BlockLineDecoder, ConsoleReader
//! └── config.rs        # ConsoleReaderConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{BincodeBlockCodec, LineScanner, RpcBlockMetaFetcher};
pub use algorithms::{
    classify_line, parse_block_fields, BlockLine, LineOutcome, SkipReason, CURRENT_FIELD_COUNT,
    LEGACY_FIELD_COUNT,
};
pub use application::{BlockLineDecoder, ConsoleReader};
pub use config::ConsoleReaderConfig;
pub use domain::{
    Block, BlockHeader, BlockMeta, BlockMetaCache, CacheError, ChunkHeader, CodecError,
    ConfigError, CryptoHash, EncodedBlock, FetchError, LineError, LinkageField, ReaderError,
    ScanError, DEFAULT_META_CACHE_CAPACITY, SENTINEL_HASH_BASE58,
};
pub use ports::{
    BlockCodec, BlockMetaFetcher, BlockReader, MockBlockMetaFetcher, NoFallbackFetcher,
    ReaderState,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
