//! # Algorithms Module
//!
//! Line recognition, block line parsing and ancestry resolution.

pub mod line_parser;
pub mod linkage;

pub use line_parser::{
    classify_line, parse_block_fields, BlockLine, CurrentBlockLine, LegacyBlockLine, LineOutcome,
    SkipReason, CURRENT_FIELD_COUNT, LEGACY_FIELD_COUNT,
};
pub use linkage::{resolve_heights, validate_linkage};
