//! Automation client options and configuration
//!
//! This module contains the configuration for launching and talking to an
//! automation server, including a builder pattern and JSON file loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{AutomationError, Result};

/// Default time allowed for the readiness sentinel to appear
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time allowed for a single request to be answered
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time allowed for the process to exit after being killed
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Protocol version stamped on every outgoing request
pub const DEFAULT_PROTOCOL_VERSION: &str = "2.0";

/// Default readiness sentinel
pub const DEFAULT_READY_SENTINEL: &str = "Server running";

// ============================================================================
// Client Options
// ============================================================================

/// Options for launching and talking to an automation server
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Executable to launch (bare names are resolved through `PATH`)
    pub command: String,
    /// Arguments passed to the executable
    pub args: Vec<String>,
    /// Working directory for the server process
    pub cwd: Option<PathBuf>,
    /// Extra environment variables for the server process
    pub env: HashMap<String, String>,
    /// Literal substring that signals readiness on stdout or stderr
    pub ready_sentinel: String,
    /// Time allowed for the sentinel to appear
    #[serde(rename = "ready_timeout_ms", deserialize_with = "duration_from_millis")]
    pub ready_timeout: Duration,
    /// Default per-request timeout
    #[serde(rename = "request_timeout_ms", deserialize_with = "duration_from_millis")]
    pub request_timeout: Duration,
    /// Time allowed for the process to exit during `stop()`
    #[serde(rename = "stop_timeout_ms", deserialize_with = "duration_from_millis")]
    pub stop_timeout: Duration,
    /// Protocol version stamped on outgoing requests
    pub protocol_version: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            ready_sentinel: DEFAULT_READY_SENTINEL.to_string(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
        }
    }
}

impl ClientOptions {
    /// Create a new builder for `ClientOptions`
    #[must_use]
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::default()
    }

    /// Load options from a JSON file
    ///
    /// Missing fields take their defaults; durations are given in milliseconds
    /// (`ready_timeout_ms`, `request_timeout_ms`, `stop_timeout_ms`).
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the file cannot be read, parsed or validated
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AutomationError::invalid_config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse options from a JSON document
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the document cannot be parsed or validated
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(raw)
            .map_err(|e| AutomationError::invalid_config(format!("Invalid options JSON: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    /// Check the options for values that can never work
    ///
    /// # Errors
    /// Returns `InvalidConfig` describing the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(AutomationError::invalid_config("command must not be empty"));
        }
        if self.ready_sentinel.is_empty() {
            return Err(AutomationError::invalid_config(
                "ready_sentinel must not be empty",
            ));
        }
        if self.ready_timeout.is_zero() {
            return Err(AutomationError::invalid_config("ready_timeout must be non-zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(AutomationError::invalid_config(
                "request_timeout must be non-zero",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("command", &self.command)
            .field("args", &self.args)
            .field("cwd", &self.cwd)
            .field("env", &format!("[{} variables]", self.env.len()))
            .field("ready_sentinel", &self.ready_sentinel)
            .field("ready_timeout", &self.ready_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("stop_timeout", &self.stop_timeout)
            .field("protocol_version", &self.protocol_version)
            .finish()
    }
}

fn duration_from_millis<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

// ============================================================================
// Builder for ClientOptions
// ============================================================================

/// Builder for `ClientOptions`
#[derive(Debug, Default)]
pub struct ClientOptionsBuilder {
    options: ClientOptions,
}

impl ClientOptionsBuilder {
    /// Set the executable to launch
    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.options.command = command.into();
        self
    }

    /// Set the argument list
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.options.args.push(arg.into());
        self
    }

    /// Set working directory
    #[must_use]
    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(path.into());
        self
    }

    /// Add an environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    /// Set the readiness sentinel
    #[must_use]
    pub fn ready_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.options.ready_sentinel = sentinel.into();
        self
    }

    /// Set the readiness timeout
    #[must_use]
    pub const fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.options.ready_timeout = timeout;
        self
    }

    /// Set the default request timeout
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = timeout;
        self
    }

    /// Set the stop timeout
    #[must_use]
    pub const fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.options.stop_timeout = timeout;
        self
    }

    /// Set the protocol version
    #[must_use]
    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.options.protocol_version = version.into();
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> ClientOptions {
        self.options
    }
}
