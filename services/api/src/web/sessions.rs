//! services/api/src/web/sessions.rs
//!
//! Axum handlers for the study session endpoints.

use crate::error::ApiError;
use crate::web::protocol::{SessionResponse, SessionUpdate, StartSessionRequest, UpdateSessionRequest};
use crate::web::rest::json_body;
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use uuid::Uuid;

/// Start a new study session.
///
/// Fails with `409 conflict` when the user already has an active or paused session.
#[utoipa::path(
    post,
    path = "/api/study-sessions",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session started", body = SessionResponse),
        (status = 400, description = "Invalid request body", body = crate::error::ErrorBody),
        (status = 409, description = "The user already has an open session", body = crate::error::ErrorBody)
    ),
    tag = "Study Sessions"
)]
pub async fn start_session_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StartSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let new_session = json_body(payload)?.into_domain()?;
    let session = state.tracker.start_session(new_session).await?;
    let now = state.tracker.now();
    Ok((StatusCode::CREATED, Json(SessionResponse::new(session, now))))
}

/// Apply a lifecycle action or edit the descriptive fields of a session.
#[utoipa::path(
    patch,
    path = "/api/study-sessions/{id}",
    request_body = UpdateSessionRequest,
    params(("id" = Uuid, Path, description = "The study session id.")),
    responses(
        (status = 200, description = "Updated session", body = SessionResponse),
        (status = 400, description = "Invalid request body", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody),
        (status = 409, description = "Transition not allowed from the current status", body = crate::error::ErrorBody)
    ),
    tag = "Study Sessions"
)]
pub async fn update_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    payload: Result<Json<UpdateSessionRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = match json_body(payload)?.into_update()? {
        SessionUpdate::Transition(action) => {
            state.tracker.transition_session(session_id, action).await?
        }
        SessionUpdate::Edit(patch) => state.tracker.update_session(session_id, patch).await?,
    };
    Ok(Json(SessionResponse::new(session, state.tracker.now())))
}

/// Fetch a single study session.
#[utoipa::path(
    get,
    path = "/api/study-sessions/{id}",
    params(("id" = Uuid, Path, description = "The study session id.")),
    responses(
        (status = 200, description = "The session", body = SessionResponse),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody)
    ),
    tag = "Study Sessions"
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.tracker.get_session(session_id).await?;
    Ok(Json(SessionResponse::new(session, state.tracker.now())))
}

/// List a user's study sessions, most recent first.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/study-sessions",
    params(("user_id" = Uuid, Path, description = "The unique ID of the user.")),
    responses((status = 200, description = "Session history", body = [SessionResponse])),
    tag = "Study Sessions"
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<SessionResponse>>, ApiError> {
    let now = state.tracker.now();
    let sessions = state.tracker.list_sessions(user_id).await?;
    Ok(Json(
        sessions
            .into_iter()
            .map(|s| SessionResponse::new(s, now))
            .collect(),
    ))
}

/// The user's active or paused session, or `null`.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/study-sessions/active",
    params(("user_id" = Uuid, Path, description = "The unique ID of the user.")),
    responses((status = 200, description = "The open session, or null when there is none", body = SessionResponse)),
    tag = "Study Sessions"
)]
pub async fn active_session_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Option<SessionResponse>>, ApiError> {
    let now = state.tracker.now();
    let session = state.tracker.active_session(user_id).await?;
    Ok(Json(session.map(|s| SessionResponse::new(s, now))))
}
