//! `AutomationClient` implementation
//!
//! This module contains the constructor and public API methods for `AutomationClient`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::control::protocol::{CloseReason, RequestCorrelator, ServerRequest};
use crate::error::{AutomationError, Result};
use crate::transport::subprocess::{PrimaryPump, ProcessParts, pump_secondary};
use crate::transport::{ReadyLatch, ReadySignal, ServerProcess};
use crate::types::identifiers::SessionId;
use crate::types::options::ClientOptions;
use crate::types::state::ReadinessState;

use super::tasks::ExitContext;
use super::{ActiveSession, AutomationClient};

/// Extra time granted to the exit monitor beyond `stop_timeout`
const MONITOR_GRACE: Duration = Duration::from_millis(500);

impl AutomationClient {
    /// Create a client; no process is spawned until [`start`](Self::start)
    #[must_use]
    pub fn new(options: ClientOptions) -> Self {
        let (state_tx, _) = watch::channel(ReadinessState::NotStarted);
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        Self {
            options,
            state_tx: Arc::new(state_tx),
            lifecycle: tokio::sync::Mutex::new(()),
            session: parking_lot::Mutex::new(None),
            request_tx,
            request_rx: parking_lot::Mutex::new(Some(request_rx)),
        }
    }

    /// Spawn the server and wait until it announces readiness
    ///
    /// Resolves once the ready sentinel appears on stdout or stderr. A no-op
    /// when already `Ready`.
    ///
    /// # Errors
    /// - `InvalidConfig` if the options do not validate
    /// - `InvalidState` if another `start()` is in progress
    /// - `Spawn` if the process cannot be created
    /// - `ReadinessTimeout` if the sentinel does not appear in time
    /// - `PrematureExit` if the process exits first
    /// - `Stopped` if `stop()` is called first
    pub async fn start(&self) -> Result<()> {
        let Ok(lifecycle) = self.lifecycle.try_lock() else {
            return Err(AutomationError::invalid_state("start() already in progress"));
        };
        match self.state() {
            ReadinessState::Ready => return Ok(()),
            state if !state.can_start() => {
                return Err(AutomationError::invalid_state(format!(
                    "cannot start from state {state}"
                )));
            }
            _ => {}
        }
        self.options.validate()?;

        // Leftovers of a session whose process exited on its own.
        let stale = self.session.lock().take();
        if let Some(stale) = stale {
            self.shutdown_session(stale, CloseReason::Stopped).await;
        }

        let session_id = SessionId::generate();
        let label = session_id.short().to_string();
        self.state_tx.send_replace(ReadinessState::Starting);

        let process = match ServerProcess::spawn(&self.options) {
            Ok(process) => process,
            Err(e) => {
                log::error!("[{label}] {e}");
                self.mark_failed();
                return Err(e);
            }
        };
        let pid = process.pid();
        log::info!(
            "[{label}] Started {} (pid {})",
            self.options.command,
            pid.map_or_else(|| "unknown".to_string(), |pid| pid.to_string())
        );

        let ProcessParts {
            child,
            stdin,
            stdout,
            stderr,
        } = process.into_parts();

        let correlator = Arc::new(
            RequestCorrelator::new(
                label.clone(),
                Box::new(stdin),
                self.options.protocol_version.clone(),
                self.options.request_timeout,
            )
            .with_request_channel(self.request_tx.clone()),
        );
        let (latch, ready_rx) = ReadyLatch::channel();
        let shutdown = CancellationToken::new();

        let stdout_pump = PrimaryPump::new(
            label.clone(),
            &self.options.ready_sentinel,
            latch.clone(),
            correlator.clone(),
        );
        let pumps = vec![
            tokio::spawn(stdout_pump.run(stdout)),
            tokio::spawn(pump_secondary(
                stderr,
                label.clone(),
                self.options.ready_sentinel.clone(),
                latch.clone(),
            )),
        ];
        let monitor = tokio::spawn(Self::exit_monitor_task(
            child,
            ExitContext {
                label: label.clone(),
                state_tx: self.state_tx.clone(),
                correlator: correlator.clone(),
                latch: latch.clone(),
                shutdown: shutdown.clone(),
                stop_timeout: self.options.stop_timeout,
            },
        ));

        *self.session.lock() = Some(ActiveSession {
            id: session_id.clone(),
            pid,
            correlator: correlator.clone(),
            latch,
            shutdown,
            monitor,
            pumps,
        });

        if self.state() == ReadinessState::Stopped {
            self.fail_session(&session_id).await;
            return Err(AutomationError::Stopped);
        }

        let result = match tokio::time::timeout(self.options.ready_timeout, ready_rx).await {
            Ok(Ok(ReadySignal::Sentinel(stream))) => {
                let promoted = self.state_tx.send_if_modified(|state| {
                    if *state == ReadinessState::Starting {
                        *state = ReadinessState::Ready;
                        true
                    } else {
                        false
                    }
                });
                if promoted {
                    log::info!("[{label}] Ready (sentinel on {stream})");
                    return Ok(());
                }
                Err(match correlator.close_reason() {
                    Some(reason) => reason.to_error(),
                    None if self.state() == ReadinessState::Failed => {
                        AutomationError::PrematureExit { code: None }
                    }
                    None => AutomationError::Stopped,
                })
            }
            Ok(Ok(ReadySignal::Exited(code))) => Err(AutomationError::PrematureExit { code }),
            // stop() has already torn the session down.
            Ok(Ok(ReadySignal::Stopped)) => return Err(AutomationError::Stopped),
            Ok(Err(_)) => Err(AutomationError::transport("Readiness signal dropped")),
            Err(_) => {
                log::warn!(
                    "[{label}] Sentinel {:?} not seen within {}ms",
                    self.options.ready_sentinel,
                    self.options.ready_timeout.as_millis()
                );
                Err(AutomationError::ReadinessTimeout {
                    timeout: self.options.ready_timeout,
                })
            }
        };

        self.fail_session(&session_id).await;
        drop(lifecycle);
        result
    }

    /// Stop the server
    ///
    /// Rejects every pending request with `Stopped`, kills the process, and
    /// waits (bounded by `stop_timeout`) for it to exit. Idempotent.
    pub async fn stop(&self) {
        // State first, so a start() that has not registered its session yet
        // sees the stop once it does.
        self.state_tx.send_if_modified(|state| {
            if matches!(*state, ReadinessState::Starting | ReadinessState::Ready) {
                *state = ReadinessState::Stopped;
                true
            } else {
                false
            }
        });

        let session = self.session.lock().take();
        let Some(session) = session else {
            return;
        };
        log::info!("[{}] Stopping server", session.id.short());
        self.shutdown_session(session, CloseReason::Stopped).await;
    }

    /// Stop, then start a fresh session
    ///
    /// # Errors
    /// Same as [`start`](Self::start)
    pub async fn restart(&self) -> Result<()> {
        self.stop().await;
        self.start().await
    }

    /// Send a request and wait for its response
    ///
    /// `timeout` overrides the configured request timeout.
    ///
    /// # Errors
    /// - `NotReady` before the server is ready
    /// - `Stopped` after the session ended
    /// - any error from [`RequestCorrelator::send_request`]
    pub async fn send_request(
        &self,
        method: &str,
        params: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value> {
        let state = self.state();
        if !state.accepts_requests() {
            return Err(match state {
                ReadinessState::Stopped => AutomationError::Stopped,
                other => AutomationError::not_ready(other),
            });
        }

        let correlator = self.correlator().ok_or(AutomationError::Stopped)?;
        correlator.send_request(method, params, timeout).await
    }

    /// Current readiness state
    #[must_use]
    pub fn state(&self) -> ReadinessState {
        *self.state_tx.borrow()
    }

    /// Watch readiness state changes
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ReadinessState> {
        self.state_tx.subscribe()
    }

    /// Identifier of the current session, if a process is running
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.lock().as_ref().map(|session| session.id.clone())
    }

    /// OS process id of the current server, if known
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.session.lock().as_ref().and_then(|session| session.pid)
    }

    /// Number of requests awaiting a response
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.correlator()
            .map_or(0, |correlator| correlator.pending_count())
    }

    /// Take the receiver for server-initiated requests
    ///
    /// Returns `None` after the first call.
    pub fn take_request_receiver(&self) -> Option<mpsc::UnboundedReceiver<ServerRequest>> {
        self.request_rx.lock().take()
    }

    /// Configuration in use
    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    fn correlator(&self) -> Option<Arc<RequestCorrelator>> {
        self.session
            .lock()
            .as_ref()
            .map(|session| session.correlator.clone())
    }

    /// Tear down the session `id` after a failed start, if it is still current
    async fn fail_session(&self, id: &SessionId) {
        let session = {
            let mut guard = self.session.lock();
            if guard.as_ref().is_some_and(|session| session.id == *id) {
                guard.take()
            } else {
                None
            }
        };
        let Some(session) = session else {
            return;
        };

        self.mark_failed();
        self.shutdown_session(session, CloseReason::Stopped).await;
    }

    /// `Starting` → `Failed`; any other state is left alone
    fn mark_failed(&self) {
        self.state_tx.send_if_modified(|state| {
            if *state == ReadinessState::Starting {
                *state = ReadinessState::Failed;
                true
            } else {
                false
            }
        });
    }

    async fn shutdown_session(&self, mut session: ActiveSession, reason: CloseReason) {
        let label = session.id.short().to_string();

        session.correlator.close(reason);
        session.latch.fire(ReadySignal::Stopped);
        session.shutdown.cancel();

        let grace = self.options.stop_timeout + MONITOR_GRACE;
        if tokio::time::timeout(grace, &mut session.monitor)
            .await
            .is_err()
        {
            log::warn!("[{label}] Exit monitor did not finish, aborting");
            session.monitor.abort();
        }

        session
            .correlator
            .shutdown_writer(self.options.stop_timeout)
            .await;

        for pump in session.pumps {
            pump.abort();
        }
        log::debug!("[{label}] Session closed");
    }
}
