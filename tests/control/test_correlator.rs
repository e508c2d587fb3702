//! Unit tests for `RequestCorrelator`
//!
//! Tests id allocation, response matching, timeouts and shutdown

#[path = "../common/mod.rs"]
mod common;

use std::collections::HashSet;
use std::time::Duration;

use kodegen_automation_client::{AutomationError, CloseReason, ServerRequest, parse_line};
use serde_json::json;
use tokio::sync::mpsc;

use common::{correlator_pair, respond, respond_error};

#[tokio::test]
async fn test_request_line_shape() {
    let (correlator, mut server) = correlator_pair(Duration::from_secs(5));

    let c = correlator.clone();
    let call = tokio::spawn(async move { c.send_request("tools/call", json!({"a": 1}), None).await });

    let request = server.next_request().await;
    assert_eq!(request["protocolVersion"], "2.0");
    assert_eq!(request["id"], 1);
    assert_eq!(request["method"], "tools/call");
    assert_eq!(request["params"], json!({"a": 1}));

    respond(&correlator, 1, json!("ok"));
    assert_eq!(call.await.unwrap().unwrap(), json!("ok"));
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_out_of_order_responses() {
    let (correlator, mut server) = correlator_pair(Duration::from_secs(5));

    let mut calls = Vec::new();
    for n in 0..3 {
        let c = correlator.clone();
        calls.push((
            n,
            tokio::spawn(async move { c.send_request("echo", json!({ "n": n }), None).await }),
        ));
    }

    let mut requests = Vec::new();
    for _ in 0..3 {
        requests.push(server.next_request().await);
    }
    assert_eq!(correlator.pending_count(), 3);

    // Answer in the order 3, 1, 2.
    requests.sort_by_key(|r| r["id"].as_u64());
    for index in [2, 0, 1] {
        let request = &requests[index];
        let id = request["id"].as_u64().unwrap();
        respond(&correlator, id, request["params"].clone());
    }

    for (n, call) in calls {
        let result = call.await.unwrap().unwrap();
        assert_eq!(result, json!({ "n": n }));
    }
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_concurrent_requests_get_unique_ids() {
    let (correlator, mut server) = correlator_pair(Duration::from_secs(5));

    let calls: Vec<_> = (0..50)
        .map(|_| {
            let c = correlator.clone();
            tokio::spawn(async move { c.send_request("noop", json!({}), None).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for _ in 0..50 {
        let request = server.next_request().await;
        ids.insert(request["id"].as_u64().unwrap());
    }
    assert_eq!(ids.len(), 50);

    for id in &ids {
        respond(&correlator, *id, json!(id));
    }
    for result in futures::future::join_all(calls).await {
        assert!(result.unwrap().is_ok());
    }
}

#[tokio::test]
async fn test_timeout_then_stale_response() {
    common::init_logging();
    let (correlator, mut server) = correlator_pair(Duration::from_secs(5));

    let result = correlator
        .send_request("slow", json!({}), Some(Duration::from_millis(50)))
        .await;
    match result {
        Err(AutomationError::RequestTimeout { id, method, .. }) => {
            assert_eq!(id.get(), 1);
            assert_eq!(method, "slow");
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(correlator.pending_count(), 0);
    let _ = server.next_request().await;

    // A late answer for the expired id is ignored.
    respond(&correlator, 1, json!("late"));
    assert_eq!(correlator.pending_count(), 0);

    let c = correlator.clone();
    let call = tokio::spawn(async move { c.send_request("fast", json!({}), None).await });
    let request = server.next_request().await;
    assert_eq!(request["id"], 2);
    respond(&correlator, 2, json!("fresh"));
    assert_eq!(call.await.unwrap().unwrap(), json!("fresh"));
}

#[tokio::test]
async fn test_remote_error() {
    let (correlator, mut server) = correlator_pair(Duration::from_secs(5));

    let c = correlator.clone();
    let call = tokio::spawn(async move { c.send_request("click", json!({}), None).await });
    let request = server.next_request().await;
    let id = request["id"].as_u64().unwrap();
    respond_error(
        &correlator,
        id,
        json!({"message": "no such element", "code": 404, "data": {"selector": "#missing"}}),
    );

    match call.await.unwrap() {
        Err(AutomationError::RemoteTool { message, code, data }) => {
            assert_eq!(message, "no such element");
            assert_eq!(code, Some(json!(404)));
            assert_eq!(data, Some(json!({"selector": "#missing"})));
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_close_rejects_pending_and_later_requests() {
    common::init_logging();
    let (correlator, mut server) = correlator_pair(Duration::from_secs(5));

    let calls: Vec<_> = (0..2)
        .map(|_| {
            let c = correlator.clone();
            tokio::spawn(async move { c.send_request("hang", json!({}), None).await })
        })
        .collect();
    let _ = server.next_request().await;
    let _ = server.next_request().await;

    assert_eq!(correlator.close(CloseReason::Exited { code: Some(1) }), 2);
    for call in calls {
        assert!(matches!(
            call.await.unwrap(),
            Err(AutomationError::PrematureExit { code: Some(1) })
        ));
    }

    // The first reason sticks.
    assert_eq!(correlator.close(CloseReason::Stopped), 0);
    assert_eq!(
        correlator.close_reason(),
        Some(CloseReason::Exited { code: Some(1) })
    );

    let late = correlator.send_request("after", json!({}), None).await;
    assert!(matches!(late, Err(AutomationError::PrematureExit { .. })));
    assert!(!server.receives_within(Duration::from_millis(50)).await);
}

#[tokio::test]
async fn test_abandoned_request_is_removed() {
    let (correlator, mut server) = correlator_pair(Duration::from_secs(5));

    let c = correlator.clone();
    let call = tokio::spawn(async move { c.send_request("hang", json!({}), None).await });
    let _ = server.next_request().await;
    assert_eq!(correlator.pending_count(), 1);

    call.abort();
    let _ = call.await;
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_server_requests_are_forwarded() {
    let (client_io, _server_io) = tokio::io::duplex(1024);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let correlator = kodegen_automation_client::RequestCorrelator::new(
        "test",
        Box::new(client_io),
        "2.0",
        Duration::from_secs(1),
    )
    .with_request_channel(tx);

    correlator.handle_message(parse_line(r#"{"id":3,"method":"confirm","params":{}}"#).unwrap());
    let ServerRequest { id, method, .. } = rx.recv().await.unwrap();
    assert_eq!(id.map(|id| id.get()), Some(3));
    assert_eq!(method, "confirm");
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_timeout_covers_blocked_write() {
    // The pipe holds 64 KiB and the server side is not reading.
    let (correlator, _server) = correlator_pair(Duration::from_secs(5));
    let script = "x".repeat(200 * 1024);

    let big = correlator.send_request(
        "evaluate",
        json!({"script": script}),
        Some(Duration::from_millis(100)),
    );
    let small = correlator.send_request("ping", json!({}), Some(Duration::from_millis(100)));
    let (big, small) = tokio::time::timeout(Duration::from_secs(2), async {
        tokio::join!(big, small)
    })
    .await
    .expect("request timeouts did not fire");

    assert!(matches!(big, Err(AutomationError::RequestTimeout { .. })));
    assert!(matches!(small, Err(AutomationError::RequestTimeout { .. })));
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test]
async fn test_abandoned_write_leaves_whole_lines() {
    let (correlator, mut server) = correlator_pair(Duration::from_secs(5));
    let script = "x".repeat(200 * 1024);

    // Dropped while its line is still being written.
    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        correlator.send_request("evaluate", json!({"script": script.clone()}), None),
    )
    .await;
    assert!(abandoned.is_err());

    let c = correlator.clone();
    let call = tokio::spawn(async move { c.send_request("ping", json!({}), None).await });

    let first = server.next_request().await;
    assert_eq!(first["method"], "evaluate");
    assert_eq!(first["params"]["script"].as_str().map(str::len), Some(script.len()));

    let second = server.next_request().await;
    assert_eq!(second["method"], "ping");
    let id = second["id"].as_u64().unwrap();
    respond(&correlator, id, json!("pong"));
    assert_eq!(call.await.unwrap().unwrap(), json!("pong"));
}

#[tokio::test]
async fn test_shutdown_writer_closes_stdin() {
    let (correlator, mut server) = correlator_pair(Duration::from_secs(5));

    correlator.shutdown_writer(Duration::from_secs(1)).await;
    assert!(!server.receives_within(Duration::from_millis(50)).await);

    let late = correlator.send_request("after", json!({}), None).await;
    assert!(matches!(late, Err(AutomationError::Stopped)));
}
