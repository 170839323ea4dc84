//! # Line Parser
//!
//! Recognizes instrumentation lines and splits `BLOCK` lines into typed
//! fields.
//!
//! ## Wire format
//!
//! ```text
//! FIRE BLOCK <height> <hash> <parent_height> <parent_hash> <lib_hash> <timestamp> <block_hex> <reserved>
//! FIRE BLOCK <height> <hash> <block_hex> <reserved>                      (legacy)
//! ```
//!
//! Fields are separated by single spaces. Hashes and block bytes are hex.

use crate::domain::LineError;

/// Field count of the current block line schema.
pub const CURRENT_FIELD_COUNT: usize = 8;

/// Field count of the legacy block line schema.
pub const LEGACY_FIELD_COUNT: usize = 4;

/// Why a line was ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Ordinary process output.
    MarkerNotFound,
    /// Instrumentation line of a category this reader does not handle.
    UnrecognizedCommand(String),
}

/// Result of classifying a raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome<'a> {
    /// The line carries nothing for this reader.
    Skipped(SkipReason),
    /// A block announcement.
    Block {
        /// Line with the marker stripped, command included.
        line: &'a str,
        /// Everything after the command keyword.
        fields: &'a str,
    },
}

/// Classify a raw line.
///
/// Never fails: unknown commands are skipped so newer node versions can add
/// instrumentation categories without breaking the reader.
pub fn classify_line<'a>(raw: &'a str, marker: &str, block_command: &str) -> LineOutcome<'a> {
    let Some(line) = raw.strip_prefix(marker) else {
        return LineOutcome::Skipped(SkipReason::MarkerNotFound);
    };

    let (command, fields) = line.split_once(' ').unwrap_or((line, ""));
    if command != block_command {
        return LineOutcome::Skipped(SkipReason::UnrecognizedCommand(command.to_string()));
    }

    LineOutcome::Block { line, fields }
}

/// Current schema block line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentBlockLine {
    /// Declared block height.
    pub height: u64,
    /// Declared block hash.
    pub hash: Vec<u8>,
    /// Declared parent height.
    pub parent_height: u64,
    /// Declared parent hash.
    pub parent_hash: Vec<u8>,
    /// Declared LIB hash.
    pub lib_hash: Vec<u8>,
    /// Declared block timestamp.
    pub timestamp: u64,
    /// Serialized block.
    pub block_bytes: Vec<u8>,
}

/// Legacy schema block line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyBlockLine {
    /// Declared block height.
    pub height: u64,
    /// Serialized block.
    pub block_bytes: Vec<u8>,
}

/// A parsed block line, tagged by schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockLine {
    /// Current 8-field schema.
    Current(CurrentBlockLine),
    /// Legacy 4-field schema.
    Legacy(LegacyBlockLine),
}

impl BlockLine {
    /// Declared block height.
    pub fn height(&self) -> u64 {
        match self {
            BlockLine::Current(line) => line.height,
            BlockLine::Legacy(line) => line.height,
        }
    }

    /// Serialized block.
    pub fn block_bytes(&self) -> &[u8] {
        match self {
            BlockLine::Current(line) => &line.block_bytes,
            BlockLine::Legacy(line) => &line.block_bytes,
        }
    }

    /// True for the legacy schema.
    pub fn is_legacy(&self) -> bool {
        matches!(self, BlockLine::Legacy(_))
    }
}

/// Parse the fields following the `BLOCK` keyword.
///
/// The schema is picked from the field count; any count other than
/// [`CURRENT_FIELD_COUNT`] or [`LEGACY_FIELD_COUNT`] is an error.
pub fn parse_block_fields(fields: &str) -> Result<BlockLine, LineError> {
    let chunks = split_fields(fields);

    match chunks.len() {
        CURRENT_FIELD_COUNT => parse_current(&chunks).map(BlockLine::Current),
        LEGACY_FIELD_COUNT => parse_legacy(&chunks).map(BlockLine::Legacy),
        actual => Err(LineError::SchemaMismatch {
            expected: CURRENT_FIELD_COUNT,
            actual,
        }),
    }
}

fn split_fields(fields: &str) -> Vec<&str> {
    if fields.is_empty() {
        return Vec::new();
    }
    fields.split(' ').collect()
}

fn parse_current(chunks: &[&str]) -> Result<CurrentBlockLine, LineError> {
    // chunks[7] is reserved
    Ok(CurrentBlockLine {
        height: parse_u64("block num", chunks[0])?,
        hash: parse_hex("block hash", chunks[1])?,
        parent_height: parse_u64("parent height", chunks[2])?,
        parent_hash: parse_hex("parent hash", chunks[3])?,
        lib_hash: parse_hex("lib hash", chunks[4])?,
        timestamp: parse_u64("timestamp", chunks[5])?,
        block_bytes: parse_hex("block bytes", chunks[6])?,
    })
}

fn parse_legacy(chunks: &[&str]) -> Result<LegacyBlockLine, LineError> {
    let height = parse_u64("block num", chunks[0])?;
    parse_hex("block hash", chunks[1])?;

    Ok(LegacyBlockLine {
        height,
        block_bytes: parse_hex("block bytes", chunks[2])?,
    })
}

fn parse_u64(field: &'static str, token: &str) -> Result<u64, LineError> {
    token.parse::<u64>().map_err(|e| LineError::FieldDecode {
        field,
        value: token.to_string(),
        reason: e.to_string(),
    })
}

fn parse_hex(field: &'static str, token: &str) -> Result<Vec<u8>, LineError> {
    hex::decode(token).map_err(|e| LineError::FieldDecode {
        field,
        value: token.to_string(),
        reason: e.to_string(),
    })
}
