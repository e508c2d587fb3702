//! Startup readiness detection
//!
//! The server announces readiness by printing a sentinel substring on
//! either of its output streams. Each stream gets its own
//! [`StartupScanner`]; both share one [`ReadyLatch`] so that whichever
//! stream shows the sentinel first resolves startup and later matches are
//! ignored. Process exit and `stop()` race on the same latch.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Which child stream a chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Standard output, the protocol stream
    Stdout,
    /// Standard error, diagnostics only
    Stderr,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// What resolved the startup wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadySignal {
    /// The sentinel appeared on the given stream
    Sentinel(StreamKind),
    /// The process exited first
    Exited(Option<i32>),
    /// `stop()` was called first
    Stopped,
}

/// Single-shot latch resolved by the first readiness event
pub struct ReadyLatch {
    tx: Mutex<Option<oneshot::Sender<ReadySignal>>>,
}

impl ReadyLatch {
    /// Create a latch and the receiver the starter waits on
    #[must_use]
    pub fn channel() -> (Arc<Self>, oneshot::Receiver<ReadySignal>) {
        let (tx, rx) = oneshot::channel();
        let latch = Arc::new(Self {
            tx: Mutex::new(Some(tx)),
        });
        (latch, rx)
    }

    /// Resolve the latch; returns false if it had already fired
    pub fn fire(&self, signal: ReadySignal) -> bool {
        let Some(tx) = self.tx.lock().take() else {
            return false;
        };
        // The starter may have given up already; the latch still counts as fired.
        let _ = tx.send(signal);
        true
    }

    /// Whether any signal has resolved the latch
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.tx.lock().is_none()
    }
}

/// Searches one stream's startup output for the ready sentinel
///
/// Output is accumulated until the sentinel is found, so a sentinel split
/// across reads is still detected. Only the window that could contain a new
/// match is searched on each chunk.
#[derive(Debug)]
pub struct StartupScanner {
    sentinel: Vec<u8>,
    buffer: BytesMut,
}

impl StartupScanner {
    /// Create a scanner for `sentinel`
    #[must_use]
    pub fn new(sentinel: &str) -> Self {
        Self {
            sentinel: sentinel.as_bytes().to_vec(),
            buffer: BytesMut::new(),
        }
    }

    /// Append a chunk and look for the sentinel
    ///
    /// On a match the startup buffer is discarded and the bytes following
    /// the first newline after the sentinel are returned; those belong to
    /// the protocol stream. An unterminated banner line yields an empty
    /// remainder.
    pub fn scan(&mut self, chunk: &[u8]) -> Option<Bytes> {
        if self.sentinel.is_empty() {
            return None;
        }

        let search_from = self
            .buffer
            .len()
            .saturating_sub(self.sentinel.len().saturating_sub(1));
        self.buffer.extend_from_slice(chunk);

        let found = find(&self.buffer[search_from..], &self.sentinel)?;
        let after = search_from + found + self.sentinel.len();
        let rest = match self.buffer[after..].iter().position(|b| *b == b'\n') {
            Some(newline) => Bytes::copy_from_slice(&self.buffer[after + newline + 1..]),
            None => Bytes::new(),
        };
        self.buffer.clear();
        Some(rest)
    }

    /// Drop everything accumulated so far
    pub fn discard(&mut self) {
        self.buffer.clear();
    }

    /// Number of startup bytes held
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
