//! # Console Reader Configuration
//!
//! Configuration for the console reader and its line scanner.

use std::env;

use serde::{Deserialize, Serialize};

use crate::domain::{ConfigError, DEFAULT_META_CACHE_CAPACITY};

/// Marker prefix identifying instrumentation lines.
pub const DEFAULT_MARKER: &str = "FIRE ";

/// Command keyword of block announcement lines.
pub const DEFAULT_BLOCK_COMMAND: &str = "BLOCK";

/// Largest accepted line, matching the largest serialized block.
pub const DEFAULT_MAX_LINE_BYTES: usize = 50 * 1024 * 1024;

/// Upper bound accepted for `max_line_bytes`.
pub const MAX_LINE_BYTES_LIMIT: usize = 1024 * 1024 * 1024;

/// Console reader configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleReaderConfig {
    /// Prefix marking a line as instrumentation output.
    pub marker: String,

    /// Command keyword announcing a block.
    pub block_command: String,

    /// Block metadata cache capacity.
    pub meta_cache_capacity: usize,

    /// Height assigned to the sentinel ("no block") parent or LIB.
    pub first_streamable_block: u64,

    /// Node JSON-RPC endpoint for the fallback metadata fetcher.
    pub rpc_url: Option<String>,

    /// Fallback fetch timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Maximum line length accepted by the scanner.
    pub max_line_bytes: usize,

    /// Capacity of the scanner -> reader line channel.
    pub line_channel_capacity: usize,
}

impl Default for ConsoleReaderConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            block_command: DEFAULT_BLOCK_COMMAND.to_string(),
            meta_cache_capacity: DEFAULT_META_CACHE_CAPACITY,
            first_streamable_block: 0,
            rpc_url: None,
            rpc_timeout_secs: 10,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            line_channel_capacity: 100,
        }
    }
}

impl ConsoleReaderConfig {
    /// Create a config for testing (smaller values).
    pub fn for_testing() -> Self {
        Self {
            meta_cache_capacity: 16,
            rpc_timeout_secs: 1,
            max_line_bytes: 64 * 1024,
            line_channel_capacity: 8,
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CONSOLE_READER_MARKER`: Line marker (default: `"FIRE "`)
    /// - `CONSOLE_READER_BLOCK_COMMAND`: Block keyword (default: BLOCK)
    /// - `CONSOLE_READER_META_CACHE_CAPACITY`: Cache capacity (default: 2000)
    /// - `CONSOLE_READER_FIRST_STREAMABLE_BLOCK`: Sentinel height (default: 0)
    /// - `CONSOLE_READER_RPC_URL`: Node RPC endpoint (default: none)
    /// - `CONSOLE_READER_RPC_TIMEOUT_SECS`: RPC timeout (default: 10)
    /// - `CONSOLE_READER_MAX_LINE_BYTES`: Max line size (default: 50 MiB)
    /// - `CONSOLE_READER_LINE_CHANNEL_CAPACITY`: Line channel size (default: 100)
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            marker: env::var("CONSOLE_READER_MARKER").unwrap_or(defaults.marker),
            block_command: env::var("CONSOLE_READER_BLOCK_COMMAND")
                .unwrap_or(defaults.block_command),
            meta_cache_capacity: env_parse("CONSOLE_READER_META_CACHE_CAPACITY")
                .unwrap_or(defaults.meta_cache_capacity),
            first_streamable_block: env_parse("CONSOLE_READER_FIRST_STREAMABLE_BLOCK")
                .unwrap_or(defaults.first_streamable_block),
            rpc_url: env::var("CONSOLE_READER_RPC_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            rpc_timeout_secs: env_parse("CONSOLE_READER_RPC_TIMEOUT_SECS")
                .unwrap_or(defaults.rpc_timeout_secs),
            max_line_bytes: env_parse("CONSOLE_READER_MAX_LINE_BYTES")
                .unwrap_or(defaults.max_line_bytes),
            line_channel_capacity: env_parse("CONSOLE_READER_LINE_CHANNEL_CAPACITY")
                .unwrap_or(defaults.line_channel_capacity),
        }
    }

    /// Reject values the reader cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker.is_empty() {
            return Err(ConfigError::EmptyMarker);
        }
        if self.block_command.is_empty() || self.block_command.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidCommand(self.block_command.clone()));
        }
        if self.meta_cache_capacity == 0 {
            return Err(ConfigError::ZeroSize("meta_cache_capacity"));
        }
        if self.max_line_bytes == 0 {
            return Err(ConfigError::ZeroSize("max_line_bytes"));
        }
        if self.max_line_bytes > MAX_LINE_BYTES_LIMIT {
            return Err(ConfigError::TooLarge {
                field: "max_line_bytes",
                max: MAX_LINE_BYTES_LIMIT,
                actual: self.max_line_bytes,
            });
        }
        if self.line_channel_capacity == 0 {
            return Err(ConfigError::ZeroSize("line_channel_capacity"));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
