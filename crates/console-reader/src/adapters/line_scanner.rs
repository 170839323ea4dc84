//! Line Scanner
//!
//! Producer side of the reader pipeline: splits a byte stream (the node's
//! stdout) into lines and publishes them on a channel. Dropping the sender
//! at end of stream is what tells the reader the session is over.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::domain::ScanError;

/// Splits a byte stream into lines.
#[derive(Debug, Clone, Copy)]
pub struct LineScanner {
    max_line_bytes: usize,
}

impl LineScanner {
    /// Scanner rejecting lines longer than `max_line_bytes`.
    pub fn new(max_line_bytes: usize) -> Self {
        Self { max_line_bytes }
    }

    /// Forward every line of `reader` to `lines`.
    ///
    /// Returns the number of lines forwarded. The channel is closed when this
    /// returns, whether or not it succeeded.
    pub async fn process<R>(&self, reader: R, lines: mpsc::Sender<String>) -> Result<u64, ScanError>
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut count = 0u64;
        // One extra byte for the newline.
        let limit = (self.max_line_bytes as u64).saturating_add(1);

        loop {
            buf.clear();
            let read = (&mut reader).take(limit).read_until(b'\n', &mut buf).await?;
            if read == 0 {
                break;
            }

            if buf.last() == Some(&b'\n') {
                buf.pop();
            } else if buf.len() as u64 == limit {
                return Err(ScanError::LineTooLong {
                    max: self.max_line_bytes,
                });
            }
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }

            let line = String::from_utf8_lossy(&buf).into_owned();
            if lines.send(line).await.is_err() {
                debug!(lines = count, "line receiver dropped, stopping scanner");
                return Err(ScanError::ReceiverClosed);
            }
            count += 1;
        }

        info!(lines = count, "node output reached end of stream");
        Ok(count)
    }
}
