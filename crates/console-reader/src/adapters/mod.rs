//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits and the line source feeding the reader.

mod bincode_codec;
mod line_scanner;
mod rpc_fetcher;

pub use bincode_codec::BincodeBlockCodec;
pub use line_scanner::LineScanner;
pub use rpc_fetcher::{parse_block_response, RpcBlockMetaFetcher};
