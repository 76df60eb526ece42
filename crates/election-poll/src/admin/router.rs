use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::put,
    Json, Router,
};

use super::service::{
    AdminService, ProfileUpdateRequest, RoleUpdateRequest, PROFILE_UPDATE_FAILED,
};
use crate::error::ApiError;
use crate::identity::caller_identity;
use crate::repository::PollRepository;

pub fn admin_router<R>(service: Arc<AdminService<R>>) -> Router
where
    R: PollRepository + 'static,
{
    Router::new()
        .route("/api/admin/update", put(update_profile_handler::<R>))
        .route("/api/admin/update-role", put(update_role_handler::<R>))
        .with_state(service)
}

pub(crate) async fn update_role_handler<R>(
    State(service): State<Arc<AdminService<R>>>,
    headers: HeaderMap,
    payload: Option<Json<RoleUpdateRequest>>,
) -> Response
where
    R: PollRepository + 'static,
{
    let caller = caller_identity(&headers);
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    match service.update_role(caller.as_ref(), &request) {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn update_profile_handler<R>(
    State(service): State<Arc<AdminService<R>>>,
    headers: HeaderMap,
    payload: Option<Json<ProfileUpdateRequest>>,
) -> Response
where
    R: PollRepository + 'static,
{
    let caller = caller_identity(&headers);
    let request = payload.map(|Json(request)| request).unwrap_or_default();

    // bcrypt work stays off the async workers
    let outcome =
        tokio::task::spawn_blocking(move || service.update_profile(caller.as_ref(), &request))
            .await
            .unwrap_or_else(|join| Err(ApiError::unexpected(PROFILE_UPDATE_FAILED, join)));

    match outcome {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(error) => error.into_response(),
    }
}
