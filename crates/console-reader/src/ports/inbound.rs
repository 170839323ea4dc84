//! # Inbound Ports
//!
//! API trait defining what the console reader offers its caller.

use async_trait::async_trait;

use crate::domain::{Block, EncodedBlock, ReaderError};

/// Stream driver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// Pulling lines from the source.
    Reading,
    /// The line source is exhausted.
    Closed,
    /// A line failed to decode; the session must be aborted.
    Failed,
}

/// Block reader - inbound port.
#[async_trait]
pub trait BlockReader: Send {
    /// Read the next decoded block.
    ///
    /// Returns `Ok(None)` once the line source is exhausted.
    async fn read_block(&mut self) -> Result<Option<Block>, ReaderError>;

    /// Read the next block wrapped in a chain-agnostic envelope.
    async fn read_encoded_block(&mut self) -> Result<Option<EncodedBlock>, ReaderError>;

    /// Current driver state.
    fn state(&self) -> ReaderState;
}
