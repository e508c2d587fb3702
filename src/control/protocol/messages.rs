//! Wire message types
//!
//! Requests travel to the server as one JSON object per line:
//! `{"protocolVersion":"2.0","id":1,"method":"tools/call","params":{...}}`.
//! The server answers with `{"id":1,"result":...}` or
//! `{"id":1,"error":{"message":"..."}}` and may also send its own requests.

use serde::{Deserialize, Serialize};

use crate::types::identifiers::RequestId;

/// Request from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingRequest {
    /// Protocol version
    pub protocol_version: String,
    /// Correlation id
    pub id: RequestId,
    /// Method name
    pub method: String,
    /// Method parameters
    pub params: serde_json::Value,
}

impl OutgoingRequest {
    /// Serialize to a single newline-terminated line
    ///
    /// # Errors
    /// Returns error if JSON serialization fails
    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self).map(|s| format!("{s}\n"))
    }
}

/// Error object carried by an error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Human-readable message
    pub message: String,
    /// Optional machine-readable code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<serde_json::Value>,
    /// Optional extra data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Outcome carried by a response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// `result` field, any JSON value including `null`
    Result(serde_json::Value),
    /// `error` field
    Error(RemoteError),
}

/// Message received from the server
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMessage {
    /// Server-initiated request or notification
    Request {
        /// Correlation id, absent for notifications
        id: Option<RequestId>,
        /// Method name
        method: String,
        /// Method parameters (`null` when absent)
        params: serde_json::Value,
    },
    /// Response to one of our requests
    Response {
        /// Correlation id of the answered request
        id: RequestId,
        /// Result or error
        outcome: ResponseOutcome,
    },
}

impl IncomingMessage {
    /// Correlation id, if the message carries one
    #[must_use]
    pub const fn id(&self) -> Option<RequestId> {
        match self {
            Self::Request { id, .. } => *id,
            Self::Response { id, .. } => Some(*id),
        }
    }
}

/// Request or notification initiated by the server
#[derive(Debug, Clone, PartialEq)]
pub struct ServerRequest {
    /// Correlation id, absent for notifications
    pub id: Option<RequestId>,
    /// Method name
    pub method: String,
    /// Method parameters
    pub params: serde_json::Value,
}
