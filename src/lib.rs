//! # Automation Client for Rust
//!
//! Drives a browser-automation server that runs as a child process and
//! speaks newline-delimited JSON-RPC over its standard streams. The client
//! spawns the server, waits for it to announce readiness, correlates
//! concurrent requests with their responses, and shapes typed browser
//! operations into `tools/call` requests.
//!
//! ## Quick Start
//!
//! ```no_run
//! use kodegen_automation_client::{AutomationClient, BrowserTools, ClientOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ClientOptions::builder()
//!         .command("node")
//!         .arg("automation-server.js")
//!         .ready_sentinel("Server running")
//!         .build();
//!
//!     let client = AutomationClient::new(options);
//!     client.start().await?;
//!
//!     client.navigate("http://localhost:8080").await?;
//!     client.click("#start").await?;
//!     let score = client.get_text("#score").await?;
//!     log::info!("score: {:?}", score.as_text());
//!
//!     client.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Core Features
//!
//! ### 1. Process supervision
//!
//! [`AutomationClient::start`] resolves when the configured sentinel shows
//! up on stdout or stderr, and fails with a distinct error on spawn failure,
//! readiness timeout, or early exit. [`AutomationClient::stop`] rejects every
//! in-flight request and kills the process.
//!
//! ### 2. Concurrent requests
//!
//! Any number of requests may be in flight. Each gets a unique id and its
//! own timeout; responses are matched by id regardless of order.
//!
//! ```no_run
//! # use kodegen_automation_client::{AutomationClient, ClientOptions, ToolInvoker};
//! # use serde_json::json;
//! # async fn example(client: &AutomationClient) -> kodegen_automation_client::Result<()> {
//! let (a, b) = tokio::join!(
//!     client.call_tool("get_text", json!({ "selector": "#a" })),
//!     client.call_tool("get_text", json!({ "selector": "#b" })),
//! );
//! # let _ = (a?, b?);
//! # Ok(())
//! # }
//! ```
//!
//! ### 3. Tool results
//!
//! Tool responses are unwrapped into a [`ToolResult`]: JSON embedded in the
//! first content item becomes [`ToolResult::Structured`], other text becomes
//! [`ToolResult::Text`], and anything else is passed through as
//! [`ToolResult::Raw`].
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], whose error type is
//! [`AutomationError`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod control;
pub mod error;
pub mod message;
pub mod tools;
pub mod transport;
pub mod types;

// Re-export commonly used types for external API
pub use client::AutomationClient;
pub use control::protocol::{
    CloseReason, IncomingMessage, OutgoingRequest, RemoteError, RequestCorrelator,
    ResponseOutcome, ServerRequest,
};
pub use error::{AutomationError, Result};
pub use message::{MessageFramer, parse_line, parse_message};
pub use tools::{BrowserTools, RequestSender, ScreenshotOptions, ToolInvoker};
pub use types::identifiers::{RequestId, SessionId};
pub use types::options::{ClientOptions, ClientOptionsBuilder};
pub use types::state::ReadinessState;
pub use types::tool_result::ToolResult;

/// Version of the client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
