//! End-to-end call scenarios over a scripted transport: retry decisions,
//! exhaustion, DNS wrapping, body rewinding and after-call events.

mod integration;

use integration::fixtures::{storage_model, table_model};
use integration::scripted::{harness, harness_with_config, Step};
use serde_json::json;
use std::io::Cursor;
use std::time::Duration;
use svc_lib_rust::model::ModelError;
use svc_lib_rust::{ClientConfig, Error, StreamBody, TransportError};
use tokio_test::{assert_err, assert_ok};

const ITEM: &str = r#"{"Item": {"id": {"S": "42"}, "name": {"S": "ada"}}}"#;
const SERVER_ERROR: &str = r#"{"__type": "InternalServerError", "message": "try again"}"#;

#[tokio::test]
async fn get_item_success_emits_one_after_call_event() {
    let h = harness(table_model(), 3, vec![Step::Respond(200, ITEM)]);

    let out = assert_ok!(
        h.client
            .invoke("GetItem", json!({"TableName": "users", "Key": {"id": {"S": "42"}}}))
            .await
    );

    assert_eq!(out["Item"]["name"]["S"], "ada");
    assert_eq!(out["ResponseMetadata"]["HTTPStatusCode"], 200);
    assert_eq!(out["ResponseMetadata"]["RequestId"], "SCRIPTED-ID");
    assert_eq!(out["ResponseMetadata"]["RetryAttempts"], 0);
    assert_eq!(h.transport.send_count(), 1);
    assert_eq!(h.events.names(), vec!["after-call.dynamodb.GetItem".to_string()]);

    let sent = &h.transport.sent()[0];
    assert_eq!(sent.header("x-amz-target"), Some("DynamoDB_20120810.GetItem"));
    assert_eq!(sent.url, "https://dynamodb.us-east-1.example.com/");
}

#[tokio::test]
async fn put_item_recovers_after_two_server_errors() {
    let h = harness(
        table_model(),
        3,
        vec![
            Step::Respond(500, SERVER_ERROR),
            Step::Respond(500, SERVER_ERROR),
            Step::Respond(200, "{}"),
        ],
    );

    let out = h
        .client
        .invoke("PutItem", json!({"TableName": "users", "Item": {"id": {"S": "1"}}}))
        .await
        .unwrap();

    assert_eq!(out["ResponseMetadata"]["RetryAttempts"], 2);
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent.iter().map(|s| s.attempt).collect::<Vec<_>>(), vec![1, 2, 3]);

    // Each attempt is rebuilt and re-signed
    assert_eq!(sent[2].header("amz-sdk-request"), Some("attempt=3"));
    assert_ne!(sent[0].header("amz-sdk-invocation-id"), sent[1].header("amz-sdk-invocation-id"));
    assert!(sent.iter().all(|s| s.body == sent[0].body));

    // Only the final response reaches the hooks
    assert_eq!(h.events.len(), 1);
    assert_eq!(h.events.get_events()[0].http_response.status_code, 200);
}

#[tokio::test]
async fn query_validation_error_is_not_retried() {
    let h = harness(
        table_model(),
        5,
        vec![Step::Respond(
            400,
            r#"{"__type": "com.amazonaws.dynamodb.v20120810#ValidationException", "message": "Query condition missed key schema element"}"#,
        )],
    );

    let err = assert_err!(h.client.invoke("Query", json!({"TableName": "users"})).await);
    let client_err = err.as_client_error().expect("client error");
    assert_eq!(client_err.code(), "ValidationException");
    assert_eq!(client_err.operation_name, "Query");
    assert_eq!(client_err.status_code, 400);
    assert_eq!(client_err.response["ResponseMetadata"]["HTTPStatusCode"], 400);
    assert_eq!(h.transport.send_count(), 1);
    // The event fires even when the call ends in an error
    assert_eq!(h.events.len(), 1);
}

#[tokio::test]
async fn throttling_code_is_retried() {
    let h = harness(
        table_model(),
        3,
        vec![
            Step::Respond(400, r#"{"__type": "ThrottlingException", "message": "Rate exceeded"}"#),
            Step::Respond(200, ITEM),
        ],
    );

    let out = h.client.invoke("GetItem", json!({"TableName": "users"})).await.unwrap();
    assert_eq!(out["ResponseMetadata"]["RetryAttempts"], 1);
    assert_eq!(h.transport.send_count(), 2);
}

#[tokio::test]
async fn malformed_body_is_retried_like_a_transport_failure() {
    let h = harness(
        table_model(),
        3,
        vec![
            Step::Respond(200, r#"{"Item": {trunc"#),
            Step::Respond(200, r#"{"Item": {}}"#),
        ],
    );

    let out = assert_ok!(h.client.invoke("GetItem", json!({"TableName": "users"})).await);
    assert_eq!(out["ResponseMetadata"]["RetryAttempts"], 1);
    assert_eq!(h.transport.send_count(), 2);
    assert_eq!(h.events.len(), 1);
}

#[tokio::test]
async fn persistently_malformed_body_returns_decode_error() {
    let h = harness(table_model(), 2, vec![Step::Respond(200, "<html>oops</html>")]);

    let err = assert_err!(h.client.invoke("GetItem", json!({})).await);
    assert!(matches!(err, Error::Transport(TransportError::Decode(_))));
    assert_eq!(h.transport.send_count(), 2);
    assert!(h.events.is_empty());
}

#[tokio::test]
async fn persistent_server_error_stops_at_max_attempts() {
    let h = harness(table_model(), 3, vec![Step::Respond(503, SERVER_ERROR)]);

    let err = h.client.invoke("GetItem", json!({})).await.unwrap_err();
    let client_err = err.as_client_error().expect("client error");
    assert_eq!(client_err.status_code, 503);
    assert_eq!(client_err.code(), "InternalServerError");
    assert_eq!(client_err.response["ResponseMetadata"]["RetryAttempts"], 2);
    assert_eq!(h.transport.send_count(), 3);
}

#[tokio::test]
async fn persistent_connection_failure_returns_last_error() {
    let h = harness(table_model(), 3, vec![Step::Refuse("Connection refused (os error 111)")]);

    let err = h.client.invoke("GetItem", json!({})).await.unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::Connect(_))));
    assert_eq!(h.transport.send_count(), 3);
    assert!(h.events.is_empty());
}

#[tokio::test]
async fn dns_failure_wraps_endpoint_url_without_retry() {
    let h = harness(
        table_model(),
        1,
        vec![Step::Refuse("error trying to connect: dns error: failed to lookup address information")],
    );

    let err = h.client.invoke("GetItem", json!({})).await.unwrap_err();
    match &err {
        Error::EndpointConnection { endpoint_url, .. } => {
            assert_eq!(endpoint_url, "https://dynamodb.us-east-1.example.com");
        }
        other => panic!("expected EndpointConnection, got {:?}", other),
    }
    assert!(err.to_string().contains("https://dynamodb.us-east-1.example.com"));
    assert_eq!(h.transport.send_count(), 1);
}

#[tokio::test]
async fn unknown_operation_sends_nothing() {
    let h = harness(table_model(), 3, vec![Step::Respond(200, "{}")]);

    let err = h.client.invoke("DeleteTable", json!({})).await.unwrap_err();
    assert!(err.is_unknown_operation());
    assert!(matches!(err, Error::Model(ModelError::UnknownOperation { .. })));
    assert_eq!(h.transport.send_count(), 0);
}

#[tokio::test]
async fn seekable_body_is_resent_byte_for_byte() {
    let h = harness(
        storage_model(),
        3,
        vec![
            Step::Respond(500, SERVER_ERROR),
            Step::Respond(500, SERVER_ERROR),
            Step::Respond(200, r#"{"ETag": "abc"}"#),
        ],
    );
    let payload = b"0123456789abcdef".repeat(64);
    let body = StreamBody::seekable(Cursor::new(payload.clone())).unwrap();

    let model = h.client.service_model().operation_model("PutObject").unwrap();
    let dict = svc_lib_rust::RequestDict::new("PUT", "/bucket/key").with_body(body);
    let (http, parsed) = h.client.endpoint().make_request(&model, &dict).await.unwrap();

    assert_eq!(http.status_code, 200);
    assert_eq!(parsed["ETag"], "abc");
    assert_eq!(parsed["ResponseMetadata"]["RetryAttempts"], 2);
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 3);
    for s in &sent {
        assert_eq!(s.body.as_ref(), payload.as_slice(), "attempt {}", s.attempt);
    }
}

#[tokio::test]
async fn one_shot_body_fails_fast_instead_of_resending() {
    let h = harness(
        storage_model(),
        3,
        vec![Step::Respond(500, SERVER_ERROR), Step::Respond(200, "{}")],
    );
    let body = StreamBody::one_shot(Cursor::new(b"cannot rewind".to_vec()));

    let model = h.client.service_model().operation_model("PutObject").unwrap();
    let dict = svc_lib_rust::RequestDict::new("PUT", "/bucket/key").with_body(body);
    let err = h.client.endpoint().make_request(&model, &dict).await.unwrap_err();

    assert!(matches!(err, Error::BodyNotRewindable { attempt: 2 }));
    assert_eq!(h.transport.send_count(), 1);
}

#[tokio::test]
async fn clones_run_concurrently() {
    let h = harness(table_model(), 2, vec![Step::Respond(200, ITEM)]);
    let a = h.client.clone();
    let b = h.client.clone();

    let (ra, rb) = tokio::join!(
        a.invoke("GetItem", json!({"TableName": "a"})),
        b.invoke("GetItem", json!({"TableName": "b"})),
    );
    assert!(ra.is_ok() && rb.is_ok());
    assert_eq!(h.transport.send_count(), 2);
    assert_eq!(h.events.len(), 2);
}

#[tokio::test]
async fn cancelled_call_returns_nothing_and_fires_no_event() {
    let h = harness(table_model(), 3, vec![Step::Stall]);

    let call = h.client.invoke("GetItem", json!({"TableName": "users"}));
    let res = tokio::time::timeout(Duration::from_millis(50), call).await;

    assert!(res.is_err(), "call should still be in flight when cancelled");
    assert_eq!(h.transport.send_count(), 1);
    assert!(h.events.is_empty());
}

#[tokio::test]
async fn aborted_task_releases_the_attempt() {
    let h = harness(table_model(), 3, vec![Step::Stall]);
    let client = h.client.clone();

    let task = tokio::spawn(async move { client.invoke("GetItem", json!({})).await });
    while h.transport.send_count() == 0 {
        tokio::task::yield_now().await;
    }
    task.abort();

    let joined = task.await;
    assert!(joined.unwrap_err().is_cancelled());
    assert_eq!(h.transport.send_count(), 1);
    assert!(h.events.is_empty());
}

#[tokio::test]
async fn configured_attempt_timeout_bounds_each_attempt() {
    let config = ClientConfig::default()
        .with_max_attempts(2)
        .with_attempt_timeout(Duration::from_millis(30));
    let h = harness_with_config(table_model(), config, vec![Step::Stall, Step::Respond(200, ITEM)]);

    let out = assert_ok!(
        tokio::time::timeout(
            Duration::from_secs(5),
            h.client.invoke("GetItem", json!({"TableName": "users"})),
        )
        .await
        .expect("attempt timeout should cut the stalled attempt short")
    );
    assert_eq!(out["ResponseMetadata"]["RetryAttempts"], 1);
    assert_eq!(h.transport.send_count(), 2);
}

#[tokio::test]
async fn attempt_timeout_exhaustion_surfaces_timeout_error() {
    let config = ClientConfig::default()
        .with_max_attempts(2)
        .with_attempt_timeout(Duration::from_millis(20));
    let h = harness_with_config(table_model(), config, vec![Step::Stall]);

    let err = assert_err!(h.client.invoke("GetItem", json!({})).await);
    assert!(matches!(err, Error::Transport(TransportError::Timeout(_))));
    assert_eq!(h.transport.send_count(), 2);
    assert!(h.events.is_empty());
}
