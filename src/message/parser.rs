//! Message parser for automation server output

use serde_json::Value;

use crate::control::protocol::{IncomingMessage, RemoteError, ResponseOutcome};
use crate::error::{AutomationError, Result};
use crate::types::identifiers::RequestId;

/// Parse one line of server output into a typed message
///
/// # Errors
/// Returns `AutomationError::Protocol` if the line is not JSON or not a
/// request/response shaped object
pub fn parse_line(line: &str) -> Result<IncomingMessage> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| AutomationError::protocol(format!("invalid JSON: {e}")))?;
    parse_message(value)
}

/// Parse a JSON value into a typed message
///
/// A `method` string makes the message a server request; otherwise an
/// integer `id` plus `error` or `result` makes it a response. `error` wins
/// when both are present. A present-but-`null` `result` is a valid result.
///
/// # Errors
/// Returns `AutomationError::Protocol` if the value has neither shape
pub fn parse_message(data: Value) -> Result<IncomingMessage> {
    let Value::Object(mut obj) = data else {
        return Err(AutomationError::protocol("expected a JSON object"));
    };

    if let Some(Value::String(method)) = obj.remove("method") {
        let id = match obj.remove("id") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(parse_id(&raw)?),
        };
        let params = obj.remove("params").unwrap_or(Value::Null);
        return Ok(IncomingMessage::Request { id, method, params });
    }

    let Some(raw_id) = obj.remove("id") else {
        return Err(AutomationError::protocol(
            "message has neither a method nor an id",
        ));
    };
    let id = parse_id(&raw_id)?;

    if let Some(error) = obj.remove("error") {
        return Ok(IncomingMessage::Response {
            id,
            outcome: ResponseOutcome::Error(parse_remote_error(error)),
        });
    }

    match obj.remove("result") {
        Some(result) => Ok(IncomingMessage::Response {
            id,
            outcome: ResponseOutcome::Result(result),
        }),
        None => Err(AutomationError::protocol(format!(
            "response {id} has neither result nor error"
        ))),
    }
}

fn parse_id(raw: &Value) -> Result<RequestId> {
    raw.as_u64()
        .map(RequestId::new)
        .ok_or_else(|| AutomationError::protocol(format!("id must be a non-negative integer, got {raw}")))
}

fn parse_remote_error(error: Value) -> RemoteError {
    match error {
        Value::Object(mut fields) => {
            let message = match fields.remove("message") {
                Some(Value::String(message)) => message,
                Some(other) => other.to_string(),
                None => Value::Object(fields.clone()).to_string(),
            };
            RemoteError {
                message,
                code: fields.remove("code"),
                data: fields.remove("data"),
            }
        }
        Value::String(message) => RemoteError {
            message,
            code: None,
            data: None,
        },
        other => RemoteError {
            message: other.to_string(),
            code: None,
            data: None,
        },
    }
}
