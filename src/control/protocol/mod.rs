//! Request/response protocol spoken with the automation server
//!
//! This module provides the wire message types and the [`RequestCorrelator`]
//! that pairs outgoing requests with incoming responses.
//!
//! # Overview
//!
//! - one JSON object per line, in both directions
//! - numeric correlation ids, allocated per session starting at 1
//! - responses may arrive in any order; matching is by id only
//! - per-request timeouts, independent of each other
//!
//! # Example: Serialization
//!
//! ```rust
//! use kodegen_automation_client::control::OutgoingRequest;
//! use kodegen_automation_client::RequestId;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let request = OutgoingRequest {
//!     protocol_version: "2.0".to_string(),
//!     id: RequestId::new(1),
//!     method: "tools/call".to_string(),
//!     params: serde_json::json!({"name": "ping", "arguments": {}}),
//! };
//!
//! let line = request.to_line()?;
//! assert!(line.starts_with(r#"{"protocolVersion":"2.0","id":1,"#));
//! assert!(line.ends_with('\n'));
//! # Ok(())
//! # }
//! ```

mod correlator;
mod messages;

// Re-export public types
pub use correlator::{BoxedWriter, CloseReason, RequestCorrelator};
pub use messages::{
    IncomingMessage, OutgoingRequest, RemoteError, ResponseOutcome, ServerRequest,
};
