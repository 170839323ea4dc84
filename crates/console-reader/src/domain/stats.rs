//! # Parsing Statistics
//!
//! Per-block timing emitted once a block line has been decoded.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::info;

/// Timing and counters for decoding a single block line.
#[derive(Debug, Clone)]
pub struct ParsingStats {
    started_at: Instant,
    block_num: u64,
    data: BTreeMap<&'static str, u64>,
}

impl ParsingStats {
    /// Start timing the decode of `block_num`.
    pub fn new(block_num: u64) -> Self {
        Self {
            started_at: Instant::now(),
            block_num,
            data: BTreeMap::new(),
        }
    }

    /// Add `by` to the counter named `key`.
    pub fn inc(&mut self, key: &'static str, by: u64) {
        *self.data.entry(key).or_insert(0) += by;
    }

    /// Counter value, zero if never incremented.
    pub fn counter(&self, key: &str) -> u64 {
        self.data.get(key).copied().unwrap_or(0)
    }

    /// Block height being decoded.
    pub fn block_num(&self) -> u64 {
        self.block_num
    }

    /// Time since decoding started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Emit the stats.
    pub fn log(&self) {
        info!(
            block_num = self.block_num,
            duration = ?self.elapsed(),
            stats = ?self.data,
            "reader block stats"
        );
    }
}
