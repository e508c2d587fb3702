//! Lifecycle state of the automation server session

use serde::Serialize;

/// Readiness of the supervised server process
///
/// Transitions only move forward within one session:
/// `NotStarted | Failed | Stopped -> Starting -> Ready | Failed | Stopped`
/// and `Ready -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessState {
    /// `start()` has never been called
    #[default]
    NotStarted,
    /// The process is spawned and the sentinel has not been seen yet
    Starting,
    /// The sentinel was seen; requests are accepted
    Ready,
    /// Spawn or readiness failed
    Failed,
    /// The session was stopped or the process exited
    Stopped,
}

impl ReadinessState {
    /// Whether `start()` may begin a new session from this state
    #[must_use]
    pub const fn can_start(self) -> bool {
        matches!(self, Self::NotStarted | Self::Failed | Self::Stopped)
    }

    /// Whether requests are accepted in this state
    #[must_use]
    pub const fn accepts_requests(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// String form used in logs and error messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
