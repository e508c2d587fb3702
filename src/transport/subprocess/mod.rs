//! Subprocess transport for the automation server
//!
//! Spawns the server with piped stdio, watches its startup output for the
//! ready sentinel, and pumps its output streams once it is running.

mod command;
mod config;
mod lifecycle;
mod process;
pub mod reader;
pub mod readiness;

pub use command::{CommandBuilder, resolve_program};
pub use config::{CLIENT_VERSION_ENV, DANGEROUS_ENV_VARS, READ_CHUNK_SIZE};
pub use lifecycle::supervise;
pub use process::{ExitOutcome, ProcessParts, ServerProcess};
pub use reader::{PrimaryPump, pump_secondary};
pub use readiness::{ReadyLatch, ReadySignal, StartupScanner, StreamKind};
