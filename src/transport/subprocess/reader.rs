//! Output pumps for the server's stdout and stderr
//!
//! Both pumps read raw chunks as they arrive. Until the ready latch fires,
//! chunks go to a [`StartupScanner`]; after that, stdout chunks go to the
//! [`MessageFramer`] and every completed message is routed through the
//! [`RequestCorrelator`], while stderr chunks only go to the log.

use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::control::protocol::RequestCorrelator;
use crate::message::MessageFramer;

use super::config::READ_CHUNK_SIZE;
use super::readiness::{ReadyLatch, ReadySignal, StartupScanner, StreamKind};

/// Reader for the protocol stream
pub struct PrimaryPump {
    label: String,
    scanner: StartupScanner,
    latch: Arc<ReadyLatch>,
    framer: MessageFramer,
    correlator: Arc<RequestCorrelator>,
    handed_off: bool,
}

impl PrimaryPump {
    /// Create a pump that waits for `sentinel` before framing
    pub fn new(
        label: impl Into<String>,
        sentinel: &str,
        latch: Arc<ReadyLatch>,
        correlator: Arc<RequestCorrelator>,
    ) -> Self {
        let label = label.into();
        Self {
            framer: MessageFramer::with_label(label.clone()),
            label,
            scanner: StartupScanner::new(sentinel),
            latch,
            correlator,
            handed_off: false,
        }
    }

    /// Read until EOF or a read error
    pub async fn run<R>(mut self, mut reader: R)
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = BytesMut::with_capacity(READ_CHUNK_SIZE);
        loop {
            chunk.clear();
            match reader.read_buf(&mut chunk).await {
                Ok(0) => {
                    log::debug!("[{}] stdout closed", self.label);
                    break;
                }
                Ok(_) => self.process_chunk(&chunk),
                Err(e) => {
                    log::warn!("[{}] stdout read failed: {e}", self.label);
                    break;
                }
            }
        }
        if self.framer.buffered_len() > 0 {
            log::debug!(
                "[{}] Discarding {} bytes of unterminated output",
                self.label,
                self.framer.buffered_len()
            );
        }
    }

    fn process_chunk(&mut self, chunk: &[u8]) {
        if self.handed_off {
            self.dispatch(chunk);
            return;
        }

        // Readiness came from stderr: this chunk starts the protocol stream
        // and is never searched for the sentinel.
        if self.latch.is_fired() {
            self.scanner.discard();
            self.handed_off = true;
            self.dispatch(chunk);
            return;
        }

        if let Some(rest) = self.scanner.scan(chunk) {
            if self.latch.fire(ReadySignal::Sentinel(StreamKind::Stdout)) {
                log::info!("[{}] Ready sentinel seen on stdout", self.label);
            }
            self.handed_off = true;
            self.dispatch(&rest);
            return;
        }

        log::debug!(
            "[{}] stdout (startup): {}",
            self.label,
            String::from_utf8_lossy(chunk).trim_end()
        );
    }

    fn dispatch(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        for message in self.framer.feed(bytes) {
            self.correlator.handle_message(message);
        }
    }
}

/// Read stderr until EOF, watching for the sentinel and logging everything
pub async fn pump_secondary<R>(reader: R, label: String, sentinel: String, latch: Arc<ReadyLatch>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = reader;
    let mut scanner = StartupScanner::new(&sentinel);
    let mut chunk = BytesMut::with_capacity(READ_CHUNK_SIZE);
    loop {
        chunk.clear();
        match reader.read_buf(&mut chunk).await {
            Ok(0) => {
                log::debug!("[{label}] stderr closed");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("[{label}] stderr read failed: {e}");
                break;
            }
        }

        if !latch.is_fired() && scanner.scan(&chunk).is_some() {
            if latch.fire(ReadySignal::Sentinel(StreamKind::Stderr)) {
                log::info!("[{label}] Ready sentinel seen on stderr");
            }
            scanner.discard();
        }

        for line in String::from_utf8_lossy(&chunk).lines() {
            if !line.trim().is_empty() {
                log::debug!("[{label}] stderr: {line}");
            }
        }
    }
}
