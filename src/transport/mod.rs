//! Transport layer for communicating with the automation server
//!
//! The server is a child process speaking newline-delimited JSON over its
//! standard streams. See [`subprocess`] for spawning, readiness detection,
//! and the output pumps.

pub mod subprocess;

pub use subprocess::{
    ExitOutcome, ReadyLatch, ReadySignal, ServerProcess, StartupScanner, StreamKind,
};
