//! Request correlator matching responses to in-flight requests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{AutomationError, Result};
use crate::types::identifiers::RequestId;

use super::messages::{IncomingMessage, OutgoingRequest, ResponseOutcome, ServerRequest};

/// Writer half of the server's standard input
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Why a correlator stopped accepting requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// `stop()` was called
    Stopped,
    /// The server process exited on its own
    Exited {
        /// Exit code, if any
        code: Option<i32>,
    },
}

impl CloseReason {
    /// Error handed to every request rejected for this reason
    #[must_use]
    pub fn to_error(self) -> AutomationError {
        match self {
            Self::Stopped => AutomationError::Stopped,
            Self::Exited { code } => AutomationError::PrematureExit { code },
        }
    }
}

/// Pending request awaiting response
struct PendingRequest {
    /// Method, kept for diagnostics
    method: String,
    /// When the request was registered
    created_at: DateTime<Utc>,
    /// Single-use settlement channel
    response_tx: oneshot::Sender<Result<serde_json::Value>>,
}

#[derive(Default)]
struct PendingTable {
    entries: HashMap<RequestId, PendingRequest>,
    closed: Option<CloseReason>,
}

/// One serialized request queued for the writer task
struct OutboundLine {
    id: RequestId,
    line: String,
}

/// Removes the entry if the caller's future is dropped before settlement
struct PendingGuard<'a> {
    table: &'a Mutex<PendingTable>,
    id: RequestId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.table.lock().entries.remove(&self.id);
    }
}

/// Correlates requests written to the server with responses read from it
///
/// One correlator serves one server session. Ids come from a counter that
/// starts at 1 and is never reused. Callers only enqueue their line; a
/// single writer task owns the server's stdin and writes each line whole,
/// so a caller that times out or is cancelled never leaves a partial line
/// behind and a stalled pipe never holds up another caller's timeout.
/// Every pending request is settled exactly once: by its response, by its
/// timeout, by a failed write, or by [`RequestCorrelator::close`].
pub struct RequestCorrelator {
    /// Log prefix
    label: String,
    /// Protocol version stamped on requests
    protocol_version: String,
    /// Timeout used when the caller passes none
    default_timeout: Duration,
    /// Request ID counter
    next_request_id: AtomicU64,
    /// Pending requests awaiting responses
    pending: Arc<Mutex<PendingTable>>,
    /// Queue feeding the writer task; `None` once stdin is being closed
    outbound: Mutex<Option<mpsc::UnboundedSender<OutboundLine>>>,
    /// Writer task owning the server's stdin
    writer_task: Mutex<Option<JoinHandle<()>>>,
    /// Destination for server-initiated requests
    request_tx: Option<mpsc::UnboundedSender<ServerRequest>>,
}

impl RequestCorrelator {
    /// Create a correlator writing to `writer`, logging with `label`
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime; the writer task is
    /// spawned here.
    pub fn new(
        label: impl Into<String>,
        writer: BoxedWriter,
        protocol_version: impl Into<String>,
        default_timeout: Duration,
    ) -> Self {
        let label = label.into();
        let pending = Arc::new(Mutex::new(PendingTable::default()));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(writer_task(
            writer,
            outbound_rx,
            pending.clone(),
            label.clone(),
        ));
        Self {
            label,
            protocol_version: protocol_version.into(),
            default_timeout,
            next_request_id: AtomicU64::new(1),
            pending,
            outbound: Mutex::new(Some(outbound_tx)),
            writer_task: Mutex::new(Some(writer_task)),
            request_tx: None,
        }
    }

    /// Forward server-initiated requests to `tx`
    #[must_use]
    pub fn with_request_channel(mut self, tx: mpsc::UnboundedSender<ServerRequest>) -> Self {
        self.request_tx = Some(tx);
        self
    }

    /// Number of requests awaiting settlement
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().entries.len()
    }

    /// Reason given to the first [`close`](Self::close) call, if any
    #[must_use]
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.pending.lock().closed
    }

    /// Default request timeout
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Send a request and wait for its settlement
    ///
    /// # Errors
    /// - the close reason's error if the correlator is closed (nothing is written)
    /// - `Transport` if writing fails
    /// - `RemoteTool` if the server answers with an error object
    /// - `RequestTimeout` if the request is not written and answered within
    ///   `timeout`
    /// - `Stopped` / `PrematureExit` if the session ends first
    pub async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let (id, mut response_rx) = self.register(method)?;
        let _guard = PendingGuard {
            table: &*self.pending,
            id,
        };

        let request = OutgoingRequest {
            protocol_version: self.protocol_version.clone(),
            id,
            method: method.to_string(),
            params,
        };
        let line = request.to_line()?;
        self.enqueue(OutboundLine { id, line })?;
        log::debug!("[{}] -> {method} (id {id})", self.label);

        match tokio::time::timeout(timeout, &mut response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(AutomationError::Stopped),
            Err(_) => {
                let expired = self.pending.lock().entries.remove(&id);
                match expired {
                    Some(entry) => {
                        let waited = Utc::now().signed_duration_since(entry.created_at);
                        log::warn!(
                            "[{}] Request {id} ({}) timed out after {}ms",
                            self.label,
                            entry.method,
                            waited.num_milliseconds()
                        );
                        Err(AutomationError::RequestTimeout {
                            id,
                            method: method.to_string(),
                            timeout,
                        })
                    }
                    // Settled between the timer firing and the removal above.
                    None => response_rx.try_recv().unwrap_or(Err(AutomationError::Stopped)),
                }
            }
        }
    }

    /// Allocate an id and register its pending entry
    fn register(
        &self,
        method: &str,
    ) -> Result<(RequestId, oneshot::Receiver<Result<serde_json::Value>>)> {
        let mut table = self.pending.lock();
        if let Some(reason) = table.closed {
            return Err(reason.to_error());
        }

        let id = RequestId::new(self.next_request_id.fetch_add(1, Ordering::SeqCst));
        let (response_tx, response_rx) = oneshot::channel();
        table.entries.insert(
            id,
            PendingRequest {
                method: method.to_string(),
                created_at: Utc::now(),
                response_tx,
            },
        );
        Ok((id, response_rx))
    }

    /// Hand a line to the writer task
    fn enqueue(&self, outbound: OutboundLine) -> Result<()> {
        let sent = match self.outbound.lock().as_ref() {
            Some(tx) => tx.send(outbound).is_ok(),
            None => false,
        };
        if sent {
            Ok(())
        } else {
            Err(self.close_reason().map_or(AutomationError::Stopped, CloseReason::to_error))
        }
    }

    /// Route one framed message
    ///
    /// Responses settle their pending request; responses for unknown or
    /// already settled ids are dropped. Server requests go to the request
    /// channel when one is set.
    pub fn handle_message(&self, message: IncomingMessage) {
        match message {
            IncomingMessage::Response { id, outcome } => {
                let pending = self.pending.lock().entries.remove(&id);
                let Some(pending) = pending else {
                    log::debug!("[{}] Dropping response for unknown id {id}", self.label);
                    return;
                };

                let elapsed = Utc::now().signed_duration_since(pending.created_at);
                log::debug!(
                    "[{}] <- {} (id {id}) after {}ms",
                    self.label,
                    pending.method,
                    elapsed.num_milliseconds()
                );

                let result = match outcome {
                    ResponseOutcome::Result(value) => Ok(value),
                    ResponseOutcome::Error(error) => Err(AutomationError::remote_tool(
                        error.message,
                        error.code,
                        error.data,
                    )),
                };
                let _ = pending.response_tx.send(result);
            }
            IncomingMessage::Request { id, method, params } => match self.request_tx {
                Some(ref tx) => {
                    if tx.send(ServerRequest { id, method, params }).is_err() {
                        log::debug!("[{}] Server request receiver dropped", self.label);
                    }
                }
                None => {
                    log::debug!("[{}] Ignoring server request {method}", self.label);
                }
            },
        }
    }

    /// Stop accepting requests and reject every pending one
    ///
    /// Only the first call has an effect; its reason is reported to later
    /// callers. Returns the number of requests rejected.
    pub fn close(&self, reason: CloseReason) -> usize {
        let drained: Vec<(RequestId, PendingRequest)> = {
            let mut table = self.pending.lock();
            if table.closed.is_some() {
                return 0;
            }
            table.closed = Some(reason);
            table.entries.drain().collect()
        };

        let count = drained.len();
        for (_, pending) in drained {
            let _ = pending.response_tx.send(Err(reason.to_error()));
        }
        if count > 0 {
            log::info!(
                "[{}] Rejected {count} pending request(s): {:?}",
                self.label,
                reason
            );
        }
        count
    }

    /// Close the server's standard input
    ///
    /// Lines already queued are written first. If the writer task does not
    /// finish within `wait` (the server stopped reading) it is aborted.
    pub async fn shutdown_writer(&self, wait: Duration) {
        self.outbound.lock().take();
        let task = self.writer_task.lock().take();
        let Some(mut task) = task else {
            return;
        };
        if tokio::time::timeout(wait, &mut task).await.is_err() {
            log::warn!("[{}] Timed out closing stdin", self.label);
            task.abort();
        }
    }
}

/// Writer task: owns stdin and writes queued lines one at a time
///
/// Lines whose request already settled (timed out, abandoned, or closed)
/// are skipped. A failed write rejects only the request it carried.
async fn writer_task(
    mut writer: BoxedWriter,
    mut outbound: mpsc::UnboundedReceiver<OutboundLine>,
    pending: Arc<Mutex<PendingTable>>,
    label: String,
) {
    while let Some(OutboundLine { id, line }) = outbound.recv().await {
        if !pending.lock().entries.contains_key(&id) {
            log::debug!("[{label}] Skipping write for settled request {id}");
            continue;
        }

        let written = match writer.write_all(line.as_bytes()).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            log::warn!("[{label}] Failed to write request {id} to stdin: {e}");
            let failed = pending.lock().entries.remove(&id);
            if let Some(entry) = failed {
                let _ = entry.response_tx.send(Err(AutomationError::transport(format!(
                    "Failed to write to stdin: {e}"
                ))));
            }
        }
    }

    if let Err(e) = writer.shutdown().await {
        log::debug!("[{label}] Closing stdin: {e}");
    }
}
