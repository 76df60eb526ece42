use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::credentials::credentials_router;
use crate::identity::CALLER_HEADER;

fn post(uri: &str, caller: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(caller) = caller {
        builder = builder.header(CALLER_HEADER, caller);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn batch_route_returns_summary_json() {
    let router = credentials_router(build_service(Arc::new(RecordingTransport::rejecting(&[
        "v2@example.edu",
    ]))));

    let response = router
        .oneshot(post(
            "/api/voters/send-credentials",
            Some(ADMIN_ID),
            json!({ "voterIds": ["v1", "v2"] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total"], 2);
    assert_eq!(payload["successful"], 1);
    assert_eq!(payload["failed"], 1);
    assert!(payload["message"].is_string());
    assert_eq!(payload["keyUsageStats"][0]["limit"], 2);
}

#[tokio::test]
async fn batch_route_rejects_missing_caller_and_empty_ids() {
    let router = credentials_router(build_service(Arc::new(RecordingTransport::default())));

    let response = router
        .clone()
        .oneshot(post(
            "/api/voters/send-credentials",
            None,
            json!({ "voterIds": ["v1"] }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(post(
            "/api/voters/send-credentials",
            Some(ADMIN_ID),
            json!({ "voterIds": [] }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "Voter IDs are required");
}

#[tokio::test]
async fn stream_route_emits_ndjson_events() {
    let router = credentials_router(build_service(Arc::new(RecordingTransport::default())));

    let response = router
        .oneshot(post(
            "/api/voters/send-credentials/stream",
            Some(ADMIN_ID),
            json!({ "voterIds": ["v1", "v2", "v3"] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("application/x-ndjson")
    );

    let body = read_body(response).await;
    let events: Vec<Value> = body
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();

    assert_eq!(events.len(), 7);
    assert_eq!(events[0]["status"], "pending");
    assert_eq!(events[1]["status"], "success");
    assert_eq!(events[1]["message"], "[1/3] Sent successfully to v1@example.edu");
    let summary = events.last().expect("summary");
    assert_eq!(summary["type"], "summary");
    assert_eq!(summary["total"], 3);
    assert_eq!(summary["successful"], 3);
    assert_eq!(summary["failed"], 0);
}

#[tokio::test]
async fn stream_route_validates_before_streaming() {
    let router = credentials_router(build_service(Arc::new(RecordingTransport::default())));

    let response = router
        .oneshot(post(
            "/api/voters/send-credentials/stream",
            Some(ADMIN_ID),
            json!({ "voterIds": ["outsider"] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "No voters found");
}

#[tokio::test]
async fn stream_route_ends_with_one_error_line_when_an_identity_is_revoked() {
    let router = credentials_router(build_service(Arc::new(RecordingTransport::revoking(&[
        "xkeysib-backup-111",
    ]))));

    let response = router
        .oneshot(post(
            "/api/voters/send-credentials/stream",
            Some(ADMIN_ID),
            json!({ "voterIds": ["v1", "v2", "v3"] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_body(response).await;
    let events: Vec<Value> = body
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();

    let types: Vec<&str> = events
        .iter()
        .map(|event| event["type"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(types, vec!["progress", "progress", "progress", "error"]);
    assert_eq!(events[1]["status"], "success");
    assert_eq!(
        events[3]["message"],
        "mail identity xkeysib-ba... was revoked: key disabled by provider"
    );
}

#[tokio::test]
async fn batch_route_returns_500_when_an_identity_is_revoked() {
    let router = credentials_router(build_service(Arc::new(RecordingTransport::revoking(&[
        "xkeysib-primary-000",
    ]))));

    let response = router
        .oneshot(post(
            "/api/voters/send-credentials",
            Some(ADMIN_ID),
            json!({ "voterIds": ["v1"] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "Failed to send credentials");
}
