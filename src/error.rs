//! Error types for the automation client

use std::time::Duration;

use thiserror::Error;

use crate::types::identifiers::RequestId;

/// Main error type for the automation client
#[derive(Error, Debug)]
pub enum AutomationError {
    /// The server process could not be created
    #[error("Failed to spawn automation server: {0}")]
    Spawn(String),

    /// The readiness sentinel was not observed in time
    #[error("Automation server not ready after {timeout:?}")]
    ReadinessTimeout {
        /// Configured readiness timeout
        timeout: Duration,
    },

    /// No matching response arrived in time
    #[error("Request {id} ({method}) timed out after {timeout:?}")]
    RequestTimeout {
        /// Identifier of the timed out request
        id: RequestId,
        /// Method of the timed out request
        method: String,
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// A line from the server could not be interpreted as a protocol message
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server answered a request with an error object
    #[error("Remote tool error: {message}")]
    RemoteTool {
        /// Error message reported by the server
        message: String,
        /// Optional error code reported by the server
        code: Option<serde_json::Value>,
        /// Optional structured details reported by the server
        data: Option<serde_json::Value>,
    },

    /// The server process exited while the session was live
    #[error("Automation server exited unexpectedly (exit code {code:?})")]
    PrematureExit {
        /// Exit code, if the process exited normally
        code: Option<i32>,
    },

    /// The session was stopped before or while the request was in flight
    #[error("Automation client stopped")]
    Stopped,

    /// The session has not reached the ready state
    #[error("Automation client is not ready (state: {0})")]
    NotReady(String),

    /// Operation not allowed in the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Writing to the server failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for automation client operations
pub type Result<T> = std::result::Result<T, AutomationError>;

impl AutomationError {
    /// Create a spawn error
    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::Spawn(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a remote tool error
    pub fn remote_tool(
        msg: impl Into<String>,
        code: Option<serde_json::Value>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self::RemoteTool {
            message: msg.into(),
            code,
            data,
        }
    }

    /// Create a not ready error
    pub fn not_ready(state: impl std::fmt::Display) -> Self {
        Self::NotReady(state.to_string())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Whether the error ended the whole session rather than a single request
    #[must_use]
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            Self::Stopped | Self::PrematureExit { .. } | Self::Spawn(_) | Self::ReadinessTimeout { .. }
        )
    }
}
