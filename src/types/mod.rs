//! Type definitions for the automation client
//!
//! - [`identifiers`] - Type-safe ID wrappers (`RequestId`, `SessionId`)
//! - [`options`] - Client configuration and builder
//! - [`state`] - Session lifecycle state
//! - [`tool_result`] - Unwrapped tool call results

pub mod identifiers;
pub mod options;
pub mod state;
pub mod tool_result;

// Re-export commonly used types
pub use identifiers::{RequestId, SessionId};
pub use options::{ClientOptions, ClientOptionsBuilder};
pub use state::ReadinessState;
pub use tool_result::ToolResult;
