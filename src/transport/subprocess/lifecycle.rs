//! Lifecycle management for the server process (spawn, supervise, kill)

use std::time::Duration;

use tokio::process::Child;
use tokio_util::sync::CancellationToken;

use crate::error::{AutomationError, Result};
use crate::types::options::ClientOptions;

use super::command::CommandBuilder;
use super::process::{ExitOutcome, ServerProcess};

impl ServerProcess {
    /// Spawn the server described by `options`
    ///
    /// # Errors
    /// Returns `Spawn` if the command cannot be resolved, the working
    /// directory is missing, the OS refuses to start the process, or a
    /// stdio handle is unavailable
    pub fn spawn(options: &ClientOptions) -> Result<Self> {
        let mut cmd = CommandBuilder::new(options).build()?;

        let mut child = cmd.spawn().map_err(|e| {
            AutomationError::spawn(format!("Failed to start {}: {e}", options.command))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AutomationError::spawn("Failed to get stdin handle"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AutomationError::spawn("Failed to get stdout handle"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AutomationError::spawn("Failed to get stderr handle"))?;
        let pid = child.id();

        Ok(Self {
            child,
            stdin,
            stdout,
            stderr,
            pid,
        })
    }
}

/// Wait for `child` to exit, or kill it once `cancel` fires
///
/// After a kill the child is given `stop_timeout` to be reaped; past that
/// it is abandoned to `kill_on_drop`.
pub async fn supervise(
    mut child: Child,
    cancel: CancellationToken,
    stop_timeout: Duration,
    label: &str,
) -> ExitOutcome {
    tokio::select! {
        status = child.wait() => {
            let code = match status {
                Ok(status) => status.code(),
                Err(e) => {
                    log::warn!("[{label}] Failed to wait for server: {e}");
                    None
                }
            };
            log::info!("[{label}] Server exited with code {code:?}");
            ExitOutcome::Exited(code)
        }
        () = cancel.cancelled() => {
            if let Err(e) = child.start_kill() {
                log::debug!("[{label}] Kill failed (already exited?): {e}");
            }
            match tokio::time::timeout(stop_timeout, child.wait()).await {
                Ok(Ok(status)) => log::debug!("[{label}] Server terminated: {status}"),
                Ok(Err(e)) => log::warn!("[{label}] Failed to reap server: {e}"),
                Err(_) => log::warn!(
                    "[{label}] Server did not exit within {}ms",
                    stop_timeout.as_millis()
                ),
            }
            ExitOutcome::Killed
        }
    }
}
