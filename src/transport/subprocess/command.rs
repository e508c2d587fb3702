//! Command building logic for subprocess transport

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use crate::VERSION;
use crate::error::{AutomationError, Result};
use crate::types::options::ClientOptions;

use super::config::{CLIENT_VERSION_ENV, DANGEROUS_ENV_VARS};

/// Command builder for the automation server
pub struct CommandBuilder<'a> {
    options: &'a ClientOptions,
}

impl<'a> CommandBuilder<'a> {
    /// Create a new command builder
    #[must_use]
    pub const fn new(options: &'a ClientOptions) -> Self {
        Self { options }
    }

    /// Build the server command with all three standard streams piped
    ///
    /// # Errors
    /// Returns `Spawn` if the program cannot be resolved or the working
    /// directory does not exist
    pub fn build(&self) -> Result<Command> {
        let cwd = self.options.cwd.as_deref();
        if let Some(dir) = cwd
            && !dir.is_dir()
        {
            return Err(AutomationError::spawn(format!(
                "Working directory does not exist: {}",
                dir.display()
            )));
        }

        let program = resolve_program(&self.options.command, cwd)?;
        let mut cmd = Command::new(program);
        cmd.args(&self.options.args);

        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        for (key, value) in &self.options.env {
            if DANGEROUS_ENV_VARS.contains(&key.as_str()) {
                log::warn!("Ignoring blocked environment variable {key}");
                continue;
            }
            cmd.env(key, value);
        }
        cmd.env(CLIENT_VERSION_ENV, VERSION);

        // Every stream is piped: stdin carries requests, stdout carries the
        // banner and responses, stderr may carry the banner and diagnostics.
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        Ok(cmd)
    }
}

/// Resolve the program to execute
///
/// Paths with more than one component are used as given (relative ones are
/// anchored at `cwd`); bare names are looked up in `PATH`.
///
/// # Errors
/// Returns `Spawn` if a bare name is not found in `PATH`
pub fn resolve_program(command: &str, cwd: Option<&Path>) -> Result<PathBuf> {
    let path = Path::new(command);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    if path.components().count() > 1 {
        return Ok(cwd.map_or_else(|| path.to_path_buf(), |dir| dir.join(path)));
    }

    which::which(command)
        .map_err(|e| AutomationError::spawn(format!("Command '{command}' not found: {e}")))
}
