//! Unit tests for message parser
//!
//! Tests the classification of server output lines into requests and responses

use kodegen_automation_client::{
    AutomationError, IncomingMessage, RequestId, ResponseOutcome, parse_line, parse_message,
};
use serde_json::json;

#[test]
fn test_parse_result_response() {
    let message = parse_message(json!({"id": 1, "result": {"value": 42}})).unwrap();
    assert_eq!(
        message,
        IncomingMessage::Response {
            id: RequestId::new(1),
            outcome: ResponseOutcome::Result(json!({"value": 42})),
        }
    );
}

#[test]
fn test_null_result_is_a_result() {
    let message = parse_message(json!({"id": 9, "result": null})).unwrap();
    assert_eq!(
        message,
        IncomingMessage::Response {
            id: RequestId::new(9),
            outcome: ResponseOutcome::Result(serde_json::Value::Null),
        }
    );
}

#[test]
fn test_error_wins_over_result() {
    let message = parse_message(json!({
        "id": 2,
        "result": "ignored",
        "error": {"message": "element not found", "code": -32001}
    }))
    .unwrap();

    let IncomingMessage::Response {
        outcome: ResponseOutcome::Error(error),
        ..
    } = message
    else {
        panic!("expected error response");
    };
    assert_eq!(error.message, "element not found");
    assert_eq!(error.code, Some(json!(-32001)));
}

#[test]
fn test_string_error() {
    let message = parse_message(json!({"id": 3, "error": "boom"})).unwrap();
    let IncomingMessage::Response {
        outcome: ResponseOutcome::Error(error),
        ..
    } = message
    else {
        panic!("expected error response");
    };
    assert_eq!(error.message, "boom");
    assert!(error.code.is_none());
}

#[test]
fn test_parse_server_request() {
    let message = parse_line(r#"{"id":5,"method":"dialog","params":{"text":"ok?"}}"#).unwrap();
    assert_eq!(
        message,
        IncomingMessage::Request {
            id: Some(RequestId::new(5)),
            method: "dialog".to_string(),
            params: json!({"text": "ok?"}),
        }
    );
}

#[test]
fn test_parse_notification_without_params() {
    let message = parse_line(r#"{"method":"ping"}"#).unwrap();
    assert_eq!(
        message,
        IncomingMessage::Request {
            id: None,
            method: "ping".to_string(),
            params: serde_json::Value::Null,
        }
    );
}

#[test]
fn test_parse_invalid_message() {
    for line in [
        "not json",
        "[1,2,3]",
        r#"{"id":1}"#,
        r#"{"result":true}"#,
        r#"{"id":"abc","result":true}"#,
        r#"{"id":-1,"result":true}"#,
    ] {
        let result = parse_line(line);
        assert!(
            matches!(result, Err(AutomationError::Protocol(_))),
            "{line} should be rejected"
        );
    }
}
