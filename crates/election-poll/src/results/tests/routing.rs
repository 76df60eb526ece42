use super::common::*;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use crate::identity::CALLER_HEADER;
use crate::repository::InMemoryPollRepository;
use crate::results::router::export_handler;
use crate::results::{ExportQuery, ExportService};

fn export_request(query: &str, caller: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(format!("/api/election/{ELECTION_ID}/export{query}"));
    if let Some(caller) = caller {
        builder = builder.header(CALLER_HEADER, caller);
    }
    builder.body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn export_route_streams_csv_attachment() {
    let response = router()
        .oneshot(export_request("?type=results&format=csv", Some(ADMIN_ID)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE),
        Some(&HeaderValue::from_static("text/csv"))
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION),
        Some(&HeaderValue::from_static(
            "attachment; filename=\"SRC Election 2025_Results.csv\""
        ))
    );

    let body = String::from_utf8(read_bytes(response).await).expect("utf8");
    assert!(body.starts_with("\"Election Results Report\""));
}

#[tokio::test]
async fn export_route_treats_blank_format_as_csv() {
    let response = router()
        .oneshot(export_request("?type=candidates&format=", Some(ADMIN_ID)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE),
        Some(&HeaderValue::from_static("text/csv"))
    );
}

#[tokio::test]
async fn export_route_serves_pdf() {
    let response = router()
        .oneshot(export_request("?type=voters&format=pdf", Some(ADMIN_ID)))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE),
        Some(&HeaderValue::from_static("application/pdf"))
    );
    assert!(read_bytes(response).await.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn export_route_maps_error_taxonomy() {
    let cases = [
        ("?type=results", None, StatusCode::UNAUTHORIZED, "Unauthorized"),
        (
            "?type=results",
            Some(FOREIGN_ADMIN_ID),
            StatusCode::FORBIDDEN,
            "Insufficient permissions",
        ),
        (
            "?type=ballots",
            Some(ADMIN_ID),
            StatusCode::BAD_REQUEST,
            "Invalid export type",
        ),
        (
            "?type=results&format=docx",
            Some(ADMIN_ID),
            StatusCode::BAD_REQUEST,
            "Invalid format",
        ),
    ];

    for (query, caller, status, message) in cases {
        let response = router()
            .oneshot(export_request(query, caller))
            .await
            .expect("route executes");
        assert_eq!(response.status(), status, "query {query}");
        let payload = read_json_body(response).await;
        assert_eq!(
            payload.get("error").and_then(Value::as_str),
            Some(message),
            "query {query}"
        );
    }
}

#[tokio::test]
async fn export_handler_reports_unknown_election() {
    let (service, _) = build_service();
    let mut headers = HeaderMap::new();
    headers.insert(CALLER_HEADER, HeaderValue::from_static(ADMIN_ID));

    let response = export_handler::<InMemoryPollRepository>(
        State(service),
        Path("missing".to_string()),
        Query(ExportQuery {
            report: Some("results".to_string()),
            format: None,
        }),
        headers,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_handler_hides_repository_detail() {
    let service = Arc::new(ExportService::new(Arc::new(UnavailableRepository), zone()));
    let mut headers = HeaderMap::new();
    headers.insert(CALLER_HEADER, HeaderValue::from_static(ADMIN_ID));

    let response = export_handler::<UnavailableRepository>(
        State(service),
        Path(ELECTION_ID.to_string()),
        Query(ExportQuery::default()),
        headers,
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload.get("error").and_then(Value::as_str),
        Some("Failed to generate export")
    );
}

#[tokio::test]
async fn latest_results_route_returns_ranked_positions() {
    let response = router()
        .oneshot(
            Request::get("/api/results/latest")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload
            .pointer("/election/association/name")
            .and_then(Value::as_str),
        Some("Computer Science Association")
    );
    assert_eq!(
        payload
            .pointer("/positions/0/candidates/0/isWinner")
            .and_then(Value::as_bool),
        Some(true)
    );
    assert_eq!(
        payload
            .pointer("/positions/1/outcome/status")
            .and_then(Value::as_str),
        Some("tied")
    );
}
