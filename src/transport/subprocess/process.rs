//! Spawned automation server process

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};

/// A running server process with its three pipes
///
/// Created by [`ServerProcess::spawn`]. The pipes are handed to the reader
/// tasks and the correlator with [`ServerProcess::into_parts`]; the
/// [`Child`] goes to the task that supervises its exit.
#[derive(Debug)]
pub struct ServerProcess {
    pub(super) child: Child,
    pub(super) stdin: ChildStdin,
    pub(super) stdout: ChildStdout,
    pub(super) stderr: ChildStderr,
    pub(super) pid: Option<u32>,
}

/// Owned pieces of a [`ServerProcess`]
#[derive(Debug)]
pub struct ProcessParts {
    /// Process handle, killed on drop
    pub child: Child,
    /// Request stream
    pub stdin: ChildStdin,
    /// Banner and response stream
    pub stdout: ChildStdout,
    /// Diagnostic stream
    pub stderr: ChildStderr,
}

/// How supervision of a process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The process exited on its own
    Exited(Option<i32>),
    /// Supervision was cancelled and the process was killed
    Killed,
}

impl ServerProcess {
    /// OS process id, if the platform reported one
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Split into owned parts
    #[must_use]
    pub fn into_parts(self) -> ProcessParts {
        ProcessParts {
            child: self.child,
            stdin: self.stdin,
            stdout: self.stdout,
            stderr: self.stderr,
        }
    }
}
