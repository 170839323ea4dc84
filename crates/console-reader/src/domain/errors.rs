//! # Domain Errors
//!
//! Error types for the console reader.
//!
//! Skipped lines (no marker, unknown command) are not errors; see
//! [`crate::algorithms::LineOutcome`].

use std::fmt;
use thiserror::Error;

/// Error raised by an external metadata fetcher.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct FetchError(pub String);

/// Block metadata could not be resolved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// Neither the cache nor the fallback fetcher knows the block.
    #[error("block meta not found: {0}")]
    NotFound(String),

    /// The fallback fetcher failed.
    #[error("fetching block meta {id}: {reason}")]
    FetchFailed {
        /// Block id that was looked up
        id: String,
        /// Fetcher error message
        reason: String,
    },
}

/// Block payload (de)serialization failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("codec error: {message}")]
pub struct CodecError {
    /// Underlying error message
    pub message: String,
}

/// Header field cross-checked between the log line and the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkageField {
    /// Parent block height.
    ParentHeight,
    /// Parent block hash.
    ParentHash,
    /// Last irreversible block hash.
    LibHash,
}

impl fmt::Display for LinkageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkageField::ParentHeight => "prev height",
            LinkageField::ParentHash => "prev hash",
            LinkageField::LibHash => "lib hash",
        };
        f.write_str(name)
    }
}

/// A `BLOCK` line that cannot be turned into a block.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LineError {
    /// Field count matches neither the current nor the legacy schema.
    #[error("invalid split, expected {expected} chunks, got {actual}")]
    SchemaMismatch {
        /// Field count of the current schema
        expected: usize,
        /// Field count found on the line
        actual: usize,
    },

    /// A numeric or hex field could not be decoded.
    #[error("invalid {field} {value:?}: {reason}")]
    FieldDecode {
        /// Field name
        field: &'static str,
        /// Offending token
        value: String,
        /// Decoder error
        reason: String,
    },

    /// The block bytes are not a valid block.
    #[error("invalid block: {0}")]
    PayloadDeserialize(#[from] CodecError),

    /// The payload disagrees with the line about its ancestry.
    #[error("invalid block: {field} mismatch, got {actual}, expected {expected}")]
    LinkageValidation {
        /// Field that disagreed
        field: LinkageField,
        /// Value declared on the line
        expected: String,
        /// Value found in the payload
        actual: String,
    },

    /// A referenced block could not be resolved to a height.
    #[error("getting {role} block meta: {source}")]
    MetadataResolution {
        /// "prev height" or "lib"
        role: &'static str,
        /// Cache error
        #[source]
        source: CacheError,
    },
}

/// Errors surfaced by the stream driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReaderError {
    /// A line failed to decode; the session is over.
    #[error("{command}: {source} (line {line:?})")]
    InvalidLine {
        /// Command keyword of the line
        command: String,
        /// Raw line content (marker stripped)
        line: String,
        /// Decode failure
        #[source]
        source: LineError,
    },

    /// A previous line failed; the reader does not resynchronize.
    #[error("reader session failed on an earlier line")]
    SessionFailed,

    /// Encoding a decoded block for downstream consumers failed.
    #[error("encoding block {number}: {source}")]
    Encode {
        /// Block height
        number: u64,
        /// Codec failure
        #[source]
        source: CodecError,
    },
}

/// Errors raised while scanning a byte stream into lines.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Underlying read failed.
    #[error("reading node output: {0}")]
    Io(#[from] std::io::Error),

    /// A single line exceeded the configured buffer size.
    #[error("line exceeds maximum size of {max} bytes")]
    LineTooLong {
        /// Configured maximum line size
        max: usize,
    },

    /// The consuming reader went away.
    #[error("line receiver closed")]
    ReceiverClosed,
}

/// Invalid configuration values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The marker prefix is empty.
    #[error("marker prefix must not be empty")]
    EmptyMarker,

    /// The block command keyword is empty or contains whitespace.
    #[error("invalid block command {0:?}")]
    InvalidCommand(String),

    /// A size setting is zero.
    #[error("{0} must be greater than zero")]
    ZeroSize(&'static str),

    /// A size setting exceeds its upper bound.
    #[error("{field} must be at most {max}, got {actual}")]
    TooLarge {
        /// Offending setting
        field: &'static str,
        /// Upper bound
        max: usize,
        /// Configured value
        actual: usize,
    },
}
