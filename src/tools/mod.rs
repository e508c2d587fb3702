//! Tool invocation over the automation server's `tools/call` method
//!
//! [`ToolInvoker`] wraps a [`RequestSender`] and unwraps the server's result
//! envelope into a [`ToolResult`](crate::ToolResult). [`BrowserTools`] adds
//! typed operations that only shape parameters.

pub mod browser;
mod invoker;

pub use browser::{BrowserTools, ScreenshotOptions, tool_names};
pub use invoker::{RequestSender, TOOLS_CALL_METHOD, ToolInvoker};
