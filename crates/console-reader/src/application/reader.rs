//! # Console Reader
//!
//! Stream driver: pulls lines from the line source until a block is decoded
//! or the source closes.
//!
//! ```text
//!            line            BLOCK line ok
//! Reading ─────────► decode ───────────────► emit block (stay Reading)
//!    │  ▲              │
//!    │  └── skipped ◄──┤ no marker / unknown command
//!    │                 └── decode error ──► Failed (terminal)
//!    └── channel closed ──► Closed
//! ```
//!
//! A corrupt line ends the session: downstream consumers rely on a strictly
//! ordered, gap-free block sequence, so the reader never resynchronizes.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};

use super::decoder::BlockLineDecoder;
use crate::adapters::LineScanner;
use crate::algorithms::{classify_line, LineOutcome, SkipReason};
use crate::config::ConsoleReaderConfig;
use crate::domain::{Block, BlockMetaCache, EncodedBlock, ReaderError, ScanError};
use crate::ports::inbound::{BlockReader, ReaderState};
use crate::ports::outbound::{BlockCodec, BlockMetaFetcher};

/// Console reader - decodes blocks from a channel of node output lines.
pub struct ConsoleReader<C: BlockCodec> {
    /// Marker prefix.
    marker: String,
    /// Block command keyword.
    block_command: String,
    /// Line source.
    lines: mpsc::Receiver<String>,
    /// Block line decoder.
    decoder: BlockLineDecoder<C>,
    /// Driver state.
    state: ReaderState,
    /// Lines ignored so far.
    skipped_lines: u64,
}

impl<C: BlockCodec> ConsoleReader<C> {
    /// Create a reader consuming `lines`.
    pub fn new(
        config: &ConsoleReaderConfig,
        lines: mpsc::Receiver<String>,
        codec: C,
        fetcher: Arc<dyn BlockMetaFetcher>,
    ) -> Self {
        Self {
            marker: config.marker.clone(),
            block_command: config.block_command.clone(),
            lines,
            decoder: BlockLineDecoder::new(
                codec,
                config.meta_cache_capacity,
                fetcher,
                config.first_streamable_block,
            ),
            state: ReaderState::Reading,
            skipped_lines: 0,
        }
    }

    /// Wire a byte stream through a [`LineScanner`] task into a new reader.
    ///
    /// Must be called from within a tokio runtime. The returned handle
    /// resolves once the scanner has closed the line channel.
    ///
    /// A scan failure (I/O error, oversized line) also closes the channel,
    /// so the reader sees a plain end of stream. Callers must await the
    /// handle to tell the two apart; the failure is logged at error level.
    pub fn spawn<R>(
        reader: R,
        config: &ConsoleReaderConfig,
        codec: C,
        fetcher: Arc<dyn BlockMetaFetcher>,
    ) -> (Self, JoinHandle<Result<u64, ScanError>>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(config.line_channel_capacity.max(1));
        let scanner = LineScanner::new(config.max_line_bytes);
        let handle = tokio::spawn(async move {
            let result = scanner.process(reader, tx).await;
            if let Err(e) = &result {
                error!(error = %e, "line scanner stopped, closing lines channel");
            }
            result
        });

        (Self::new(config, rx, codec, fetcher), handle)
    }

    /// Lines ignored so far (plain output and unknown commands).
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    /// Metadata cache of this session.
    pub fn meta_cache(&self) -> &BlockMetaCache {
        self.decoder.cache()
    }

    /// Mutable metadata cache of this session.
    pub fn meta_cache_mut(&mut self) -> &mut BlockMetaCache {
        self.decoder.cache_mut()
    }

    async fn next_block(&mut self) -> Result<Option<Block>, ReaderError> {
        match self.state {
            ReaderState::Failed => return Err(ReaderError::SessionFailed),
            ReaderState::Closed => return Ok(None),
            ReaderState::Reading => {}
        }

        while let Some(raw) = self.lines.recv().await {
            let (line, fields) = match classify_line(&raw, &self.marker, &self.block_command) {
                LineOutcome::Skipped(SkipReason::MarkerNotFound) => {
                    trace!(line = %raw, "skipping non instrumentation line");
                    self.skipped_lines += 1;
                    continue;
                }
                LineOutcome::Skipped(SkipReason::UnrecognizedCommand(command)) => {
                    debug!(command = %command, "skipping unknown instrumentation line");
                    self.skipped_lines += 1;
                    continue;
                }
                LineOutcome::Block { line, fields } => (line, fields),
            };

            return match self.decoder.decode(fields).await {
                Ok(block) => Ok(Some(block)),
                Err(source) => {
                    self.state = ReaderState::Failed;
                    error!(error = %source, "failed to decode block line");
                    Err(ReaderError::InvalidLine {
                        command: self.block_command.clone(),
                        line: line.to_string(),
                        source,
                    })
                }
            };
        }

        info!("lines channel has been closed");
        self.state = ReaderState::Closed;
        Ok(None)
    }
}

#[async_trait]
impl<C: BlockCodec + 'static> BlockReader for ConsoleReader<C> {
    async fn read_block(&mut self) -> Result<Option<Block>, ReaderError> {
        self.next_block().await
    }

    async fn read_encoded_block(&mut self) -> Result<Option<EncodedBlock>, ReaderError> {
        let Some(block) = self.next_block().await? else {
            return Ok(None);
        };

        match self.decoder.codec().encode(&block) {
            Ok(payload) => Ok(Some(EncodedBlock::new(&block, payload))),
            Err(source) => {
                self.state = ReaderState::Failed;
                Err(ReaderError::Encode {
                    number: block.number(),
                    source,
                })
            }
        }
    }

    fn state(&self) -> ReaderState {
        self.state
    }
}
