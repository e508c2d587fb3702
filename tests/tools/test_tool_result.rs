//! Unit tests for `ToolResult`
//!
//! Tests the unwrap policy applied to `tools/call` results

use kodegen_automation_client::ToolResult;
use serde_json::json;

#[test]
fn test_json_text_becomes_structured() {
    let result = ToolResult::from_result(json!({
        "content": [{"type": "text", "text": "{\"pong\":true}"}]
    }));
    assert_eq!(result, ToolResult::Structured(json!({"pong": true})));
    assert!(result.is_structured());
    assert_eq!(result.into_value(), json!({"pong": true}));
}

#[test]
fn test_plain_text_stays_text() {
    let result = ToolResult::from_result(json!({
        "content": [{"type": "text", "text": "Navigated to /game"}]
    }));
    assert_eq!(result.as_text(), Some("Navigated to /game"));
    assert_eq!(result.into_value(), json!("Navigated to /game"));
}

#[test]
fn test_only_first_content_item_is_used() {
    let result = ToolResult::from_result(json!({
        "content": [{"type": "text", "text": "42"}, {"type": "text", "text": "ignored"}]
    }));
    assert_eq!(result, ToolResult::Structured(json!(42)));
}

#[test]
fn test_unusable_content_is_raw() {
    for raw in [
        json!({"status": "ok"}),
        json!({"content": []}),
        json!({"content": "not a list"}),
        json!({"content": [{"type": "image", "data": "aGk="}]}),
        json!({"content": [{"type": "text", "text": 5}]}),
        json!(null),
    ] {
        assert_eq!(ToolResult::from_result(raw.clone()), ToolResult::Raw(raw));
    }
}

#[test]
fn test_serialized_form() {
    let value = serde_json::to_value(ToolResult::Text("hi".to_string())).unwrap();
    assert_eq!(value, json!({"kind": "text", "value": "hi"}));
}
