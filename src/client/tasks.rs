//! Background tasks for `AutomationClient`
//!
//! Each session runs three tasks: the stdout pump, the stderr pump, and the
//! exit monitor defined here.

use std::sync::Arc;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::control::protocol::{CloseReason, RequestCorrelator};
use crate::transport::subprocess::supervise;
use crate::transport::{ExitOutcome, ReadyLatch, ReadySignal};
use crate::types::state::ReadinessState;

/// Everything the exit monitor touches when the process goes away
pub(super) struct ExitContext {
    pub label: String,
    pub state_tx: Arc<watch::Sender<ReadinessState>>,
    pub correlator: Arc<RequestCorrelator>,
    pub latch: Arc<ReadyLatch>,
    pub shutdown: CancellationToken,
    pub stop_timeout: Duration,
}

impl super::AutomationClient {
    /// Exit monitor task - owns the child until it exits or is killed
    pub(super) async fn exit_monitor_task(child: Child, ctx: ExitContext) {
        let outcome = supervise(child, ctx.shutdown.clone(), ctx.stop_timeout, &ctx.label).await;

        let ExitOutcome::Exited(code) = outcome else {
            // stop() already settled state, latch, and pending requests.
            return;
        };

        if ctx.latch.fire(ReadySignal::Exited(code)) {
            log::warn!("[{}] Server exited before becoming ready", ctx.label);
        }

        ctx.state_tx.send_if_modified(|state| match *state {
            ReadinessState::Ready => {
                *state = ReadinessState::Stopped;
                true
            }
            ReadinessState::Starting => {
                *state = ReadinessState::Failed;
                true
            }
            _ => false,
        });

        let rejected = ctx.correlator.close(CloseReason::Exited { code });
        if rejected > 0 {
            log::warn!(
                "[{}] Server exited with {rejected} request(s) in flight",
                ctx.label
            );
        }
    }
}
