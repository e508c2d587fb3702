//! `AutomationClient`: supervised session with an automation server
//!
//! The client owns the whole life of one server process at a time: spawn,
//! readiness, request traffic, and shutdown.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    AutomationClient                       │
//! │                                                           │
//! │  send_request ──→ RequestCorrelator ──→ child stdin       │
//! │                        ↑                                  │
//! │  stdout pump ──→ MessageFramer ──→ handle_message         │
//! │  stderr pump ──→ log                                      │
//! │        │                                                  │
//! │        └──→ ReadyLatch ←── exit monitor ←── child.wait()  │
//! │                 │                                         │
//! │  start() waits ─┘                                         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! - Both pumps scan startup output for the sentinel; the first match on
//!   either stream resolves `start()`
//! - The exit monitor owns the child; an unexpected exit rejects every
//!   pending request and moves the state to `Stopped` (or `Failed` while
//!   starting)
//! - `stop()` rejects pending requests, closes stdin and kills the child
//!
//! # Example
//!
//! ```no_run
//! use kodegen_automation_client::{AutomationClient, BrowserTools, ClientOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ClientOptions::builder()
//!     .command("node")
//!     .arg("server.js")
//!     .build();
//! let client = AutomationClient::new(options);
//!
//! client.start().await?;
//! client.navigate("https://example.com").await?;
//! let title = client.get_text("h1").await?;
//! log::info!("{:?}", title.as_text());
//! client.stop().await;
//! # Ok(())
//! # }
//! ```

mod client_impl;
mod tasks;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::control::protocol::{RequestCorrelator, ServerRequest};
use crate::transport::ReadyLatch;
use crate::types::identifiers::SessionId;
use crate::types::options::ClientOptions;
use crate::types::state::ReadinessState;

/// Client supervising one automation server process at a time
///
/// All methods take `&self`; share the client behind an `Arc` to issue
/// requests from several tasks.
pub struct AutomationClient {
    /// Configuration used for every session
    options: ClientOptions,
    /// Current readiness state, observable through [`subscribe_state`](Self::subscribe_state)
    state_tx: Arc<watch::Sender<ReadinessState>>,
    /// Serializes `start()` calls
    lifecycle: tokio::sync::Mutex<()>,
    /// Live session, if any
    session: parking_lot::Mutex<Option<ActiveSession>>,
    /// Sender handed to each session's correlator
    request_tx: mpsc::UnboundedSender<ServerRequest>,
    /// Receiver for server-initiated requests, until taken
    request_rx: parking_lot::Mutex<Option<mpsc::UnboundedReceiver<ServerRequest>>>,
}

/// Resources of one spawned server
struct ActiveSession {
    id: SessionId,
    pid: Option<u32>,
    correlator: Arc<RequestCorrelator>,
    latch: Arc<ReadyLatch>,
    shutdown: CancellationToken,
    monitor: JoinHandle<()>,
    pumps: Vec<JoinHandle<()>>,
}

impl Drop for AutomationClient {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session
                .correlator
                .close(crate::control::protocol::CloseReason::Stopped);
            session.shutdown.cancel();
            for pump in &session.pumps {
                pump.abort();
            }
        }
    }
}
