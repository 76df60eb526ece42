use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;

use super::export::ExportDocument;
use super::service::{ExportQuery, ExportService};
use crate::domain::ElectionId;
use crate::error::ApiError;
use crate::identity::caller_identity;
use crate::repository::PollRepository;

/// Router exposing report downloads and the public results view.
pub fn results_router<R>(service: Arc<ExportService<R>>) -> Router
where
    R: PollRepository + 'static,
{
    Router::new()
        .route(
            "/api/election/:election_id/export",
            get(export_handler::<R>),
        )
        .route("/api/results/latest", get(latest_results_handler::<R>))
        .with_state(service)
}

pub(crate) async fn export_handler<R>(
    State(service): State<Arc<ExportService<R>>>,
    Path(election_id): Path<String>,
    Query(query): Query<ExportQuery>,
    headers: HeaderMap,
) -> Response
where
    R: PollRepository + 'static,
{
    let caller = caller_identity(&headers);
    let election_id = ElectionId(election_id);

    match service.export(caller.as_ref(), &election_id, &query, Utc::now()) {
        Ok(document) => attachment(document),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn latest_results_handler<R>(
    State(service): State<Arc<ExportService<R>>>,
) -> Response
where
    R: PollRepository + 'static,
{
    match service.latest_results(Utc::now()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error.into_response(),
    }
}

fn attachment(document: ExportDocument) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    let disposition = match HeaderValue::from_str(&disposition) {
        Ok(value) => value,
        Err(err) => return ApiError::unexpected("Failed to generate export", err).into_response(),
    };
    let content_type = match HeaderValue::from_str(document.content_type.as_ref()) {
        Ok(value) => value,
        Err(err) => return ApiError::unexpected("Failed to generate export", err).into_response(),
    };

    let mut response = (StatusCode::OK, document.bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    response
}
