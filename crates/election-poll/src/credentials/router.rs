use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use futures::StreamExt;

use super::service::{CredentialRequest, CredentialService};
use super::transport::MailTransport;
use crate::identity::caller_identity;
use crate::repository::PollRepository;

pub const NDJSON: &str = "application/x-ndjson";

/// Router exposing batch and streaming credential dispatch.
pub fn credentials_router<R, T>(service: Arc<CredentialService<R, T>>) -> Router
where
    R: PollRepository + 'static,
    T: MailTransport + 'static,
{
    Router::new()
        .route(
            "/api/voters/send-credentials",
            post(send_batch_handler::<R, T>),
        )
        .route(
            "/api/voters/send-credentials/stream",
            post(send_stream_handler::<R, T>),
        )
        .with_state(service)
}

pub(crate) async fn send_batch_handler<R, T>(
    State(service): State<Arc<CredentialService<R, T>>>,
    headers: HeaderMap,
    payload: Option<Json<CredentialRequest>>,
) -> Response
where
    R: PollRepository + 'static,
    T: MailTransport + 'static,
{
    let caller = caller_identity(&headers);
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    match service.send_batch(caller.as_ref(), &request, Utc::now()).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn send_stream_handler<R, T>(
    State(service): State<Arc<CredentialService<R, T>>>,
    headers: HeaderMap,
    payload: Option<Json<CredentialRequest>>,
) -> Response
where
    R: PollRepository + 'static,
    T: MailTransport + 'static,
{
    let caller = caller_identity(&headers);
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    let events = match service.stream(caller.as_ref(), &request, Utc::now()) {
        Ok(events) => events,
        Err(error) => return error.into_response(),
    };

    let lines = events.map(|event| {
        serde_json::to_string(&event).map(|mut line| {
            line.push('\n');
            line
        })
    });

    let mut response = Body::from_stream(lines).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(NDJSON));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}
