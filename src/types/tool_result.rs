//! Unwrapped tool call results
//!
//! Servers answer `tools/call` with an envelope that optionally carries a
//! `content` list whose first element holds a `text` field. The text is often
//! a JSON document itself. [`ToolResult::from_result`] is the single place
//! that decides how such an envelope is presented to callers.

use serde::Serialize;
use serde_json::Value;

/// Caller-facing value of a tool call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolResult {
    /// First content text, which did not parse as JSON
    Text(String),
    /// First content text, parsed as JSON
    Structured(Value),
    /// Result without a usable content list, unchanged
    Raw(Value),
}

impl ToolResult {
    /// Apply the unwrap policy to a raw `tools/call` result
    ///
    /// - `content` is a non-empty array whose first element has a string
    ///   `text`: the text is parsed as JSON ([`ToolResult::Structured`]) or
    ///   kept as is when parsing fails ([`ToolResult::Text`]).
    /// - anything else is returned untouched as [`ToolResult::Raw`].
    #[must_use]
    pub fn from_result(result: Value) -> Self {
        let first_text = result
            .get("content")
            .and_then(Value::as_array)
            .and_then(|content| content.first())
            .and_then(|block| block.get("text"))
            .and_then(Value::as_str);

        match first_text {
            Some(text) => match serde_json::from_str::<Value>(text) {
                Ok(parsed) => Self::Structured(parsed),
                Err(_) => Self::Text(text.to_string()),
            },
            None => Self::Raw(result),
        }
    }

    /// Text content, if the result was unparseable text
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether the text content parsed as JSON
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Collapse into a JSON value (text becomes a JSON string)
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Text(text) => Value::String(text),
            Self::Structured(value) | Self::Raw(value) => value,
        }
    }
}
