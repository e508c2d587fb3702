//! Unit tests for `ClientOptions`
//!
//! Tests defaults, JSON loading and validation

use std::io::Write;
use std::time::Duration;

use kodegen_automation_client::types::options::{
    DEFAULT_PROTOCOL_VERSION, DEFAULT_READY_SENTINEL, DEFAULT_READY_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_STOP_TIMEOUT,
};
use kodegen_automation_client::{AutomationError, ClientOptions};

#[test]
fn test_defaults() {
    let options = ClientOptions::default();
    assert_eq!(options.ready_sentinel, DEFAULT_READY_SENTINEL);
    assert_eq!(options.ready_timeout, DEFAULT_READY_TIMEOUT);
    assert_eq!(options.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    assert_eq!(options.stop_timeout, DEFAULT_STOP_TIMEOUT);
    assert_eq!(options.protocol_version, DEFAULT_PROTOCOL_VERSION);
    assert!(options.args.is_empty());
}

#[test]
fn test_builder() {
    let options = ClientOptions::builder()
        .command("node")
        .args(["server.js", "--headless"])
        .arg("--port=0")
        .env("DEBUG", "1")
        .ready_timeout(Duration::from_secs(2))
        .build();

    assert_eq!(options.command, "node");
    assert_eq!(options.args, vec!["server.js", "--headless", "--port=0"]);
    assert_eq!(options.env.get("DEBUG").map(String::as_str), Some("1"));
    assert_eq!(options.ready_timeout, Duration::from_secs(2));
    assert!(options.validate().is_ok());
}

#[test]
fn test_from_json_millisecond_fields() {
    let options = ClientOptions::from_json_str(
        r#"{
            "command": "node",
            "args": ["automation.js"],
            "ready_sentinel": "listening",
            "ready_timeout_ms": 1500,
            "request_timeout_ms": 250
        }"#,
    )
    .unwrap();

    assert_eq!(options.args, vec!["automation.js"]);
    assert_eq!(options.ready_sentinel, "listening");
    assert_eq!(options.ready_timeout, Duration::from_millis(1500));
    assert_eq!(options.request_timeout, Duration::from_millis(250));
    assert_eq!(options.stop_timeout, DEFAULT_STOP_TIMEOUT);
}

#[test]
fn test_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"command": "python3", "stop_timeout_ms": 100}}"#).unwrap();

    let options = ClientOptions::from_json_file(file.path()).unwrap();
    assert_eq!(options.command, "python3");
    assert_eq!(options.stop_timeout, Duration::from_millis(100));
}

#[test]
fn test_invalid_configurations() {
    let cases = [
        r#"{}"#,
        r#"{"command": "   "}"#,
        r#"{"command": "node", "ready_sentinel": ""}"#,
        r#"{"command": "node", "ready_timeout_ms": 0}"#,
        r#"{"command": "node", "request_timeout_ms": 0}"#,
        r#"{"command": "node", "ready_timeout_ms": "soon"}"#,
        r#"not json"#,
    ];
    for raw in cases {
        assert!(
            matches!(
                ClientOptions::from_json_str(raw),
                Err(AutomationError::InvalidConfig(_))
            ),
            "{raw} should be rejected"
        );
    }
}

#[test]
fn test_missing_file() {
    let result = ClientOptions::from_json_file("/nonexistent/automation.json");
    assert!(matches!(result, Err(AutomationError::InvalidConfig(_))));
}
