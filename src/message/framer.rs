//! Newline-delimited JSON framing for server output
//!
//! The framer owns a carry-over buffer for the primary output stream. Each
//! chunk read from the pipe is appended with [`MessageFramer::feed`], which
//! returns every message completed by that chunk. Chunk boundaries are
//! irrelevant: a message split across many reads, down to single bytes,
//! is only parsed once its terminating newline arrives.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec};

use crate::control::protocol::IncomingMessage;

use super::parser::parse_line;

/// Reassembles newline-delimited messages across arbitrary chunk boundaries
///
/// Malformed lines are logged and dropped; they never stop the lines that
/// follow them. No maximum line length is enforced.
#[derive(Debug)]
pub struct MessageFramer {
    codec: LinesCodec,
    buffer: BytesMut,
    label: String,
}

impl MessageFramer {
    /// Create a framer with an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::with_label("framer")
    }

    /// Create a framer whose log lines are prefixed with `label`
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            codec: LinesCodec::new(),
            buffer: BytesMut::new(),
            label: label.into(),
        }
    }

    /// Append a chunk and return every message it completes, in stream order
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<IncomingMessage> {
        self.buffer.extend_from_slice(chunk);

        let mut messages = Vec::new();
        loop {
            match self.codec.decode(&mut self.buffer) {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_line(&line) {
                        Ok(message) => messages.push(message),
                        Err(e) => {
                            log::warn!("[{}] Discarding malformed line: {e}", self.label);
                            log::debug!("[{}] Malformed line content: {line}", self.label);
                        }
                    }
                }
                Ok(None) => break,
                // The offending line has already been consumed from the buffer.
                Err(e) => {
                    log::warn!("[{}] Discarding undecodable line: {e}", self.label);
                }
            }
        }
        messages
    }

    /// Number of bytes held for an incomplete trailing line
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for MessageFramer {
    fn default() -> Self {
        Self::new()
    }
}
