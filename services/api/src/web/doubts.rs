//! services/api/src/web/doubts.rs
//!
//! The doubt board: questions, answers, upvotes and acceptance.

use crate::error::ApiError;
use crate::web::protocol::{
    DoubtAnswerResponse, DoubtQuery, DoubtResponse, PostAnswerRequest, PostDoubtRequest,
};
use crate::web::rest::json_body;
use crate::web::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use study_tracker_core::PortError;
use uuid::Uuid;

/// Post a doubt, optionally asking the AI tutor for a draft answer.
///
/// A failing or slow tutor never fails the request: the doubt is returned
/// without `aiAnswer`.
#[utoipa::path(
    post,
    path = "/api/doubts",
    request_body = PostDoubtRequest,
    responses(
        (status = 201, description = "Doubt posted", body = DoubtResponse),
        (status = 400, description = "Invalid request body", body = crate::error::ErrorBody)
    ),
    tag = "Doubts"
)]
pub async fn post_doubt_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PostDoubtRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DoubtResponse>), ApiError> {
    let (new, ask_tutor) = json_body(payload)?.into_domain();
    let tutor = state.tutor.as_deref().filter(|_| ask_tutor);
    let doubt = state.tracker.post_doubt(new, tutor).await?;
    Ok((StatusCode::CREATED, Json(doubt.into())))
}

/// List doubts, most recently posted first.
#[utoipa::path(
    get,
    path = "/api/doubts",
    params(DoubtQuery),
    responses(
        (status = 200, description = "Matching doubts", body = [DoubtResponse]),
        (status = 400, description = "Unknown status filter", body = crate::error::ErrorBody)
    ),
    tag = "Doubts"
)]
pub async fn list_doubts_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DoubtQuery>, QueryRejection>,
) -> Result<Json<Vec<DoubtResponse>>, ApiError> {
    let Query(query) =
        query.map_err(|rejection| PortError::validation("query", rejection.body_text()))?;
    let doubts = state.tracker.list_doubts(&query.into_filter()?).await?;
    Ok(Json(doubts.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/doubts/{id}",
    params(("id" = Uuid, Path, description = "The doubt id.")),
    responses(
        (status = 200, description = "The doubt", body = DoubtResponse),
        (status = 404, description = "Unknown doubt", body = crate::error::ErrorBody)
    ),
    tag = "Doubts"
)]
pub async fn get_doubt_handler(
    State(state): State<Arc<AppState>>,
    Path(doubt_id): Path<Uuid>,
) -> Result<Json<DoubtResponse>, ApiError> {
    Ok(Json(state.tracker.get_doubt(doubt_id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/doubts/{id}/upvote",
    params(("id" = Uuid, Path, description = "The doubt id.")),
    responses(
        (status = 200, description = "The upvoted doubt", body = DoubtResponse),
        (status = 404, description = "Unknown doubt", body = crate::error::ErrorBody)
    ),
    tag = "Doubts"
)]
pub async fn upvote_doubt_handler(
    State(state): State<Arc<AppState>>,
    Path(doubt_id): Path<Uuid>,
) -> Result<Json<DoubtResponse>, ApiError> {
    Ok(Json(state.tracker.upvote_doubt(doubt_id).await?.into()))
}

/// Answer a doubt. The first answer moves an open doubt to `in_progress`.
#[utoipa::path(
    post,
    path = "/api/doubts/{id}/answers",
    request_body = PostAnswerRequest,
    params(("id" = Uuid, Path, description = "The doubt id.")),
    responses(
        (status = 201, description = "Answer posted", body = DoubtAnswerResponse),
        (status = 400, description = "Invalid request body", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown doubt", body = crate::error::ErrorBody)
    ),
    tag = "Doubts"
)]
pub async fn post_answer_handler(
    State(state): State<Arc<AppState>>,
    Path(doubt_id): Path<Uuid>,
    payload: Result<Json<PostAnswerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DoubtAnswerResponse>), ApiError> {
    let new = json_body(payload)?.into_domain(doubt_id);
    let answer = state.tracker.answer_doubt(new).await?;
    Ok((StatusCode::CREATED, Json(answer.into())))
}

/// A doubt's answers, most upvoted first.
#[utoipa::path(
    get,
    path = "/api/doubts/{id}/answers",
    params(("id" = Uuid, Path, description = "The doubt id.")),
    responses(
        (status = 200, description = "The answers", body = [DoubtAnswerResponse]),
        (status = 404, description = "Unknown doubt", body = crate::error::ErrorBody)
    ),
    tag = "Doubts"
)]
pub async fn list_answers_handler(
    State(state): State<Arc<AppState>>,
    Path(doubt_id): Path<Uuid>,
) -> Result<Json<Vec<DoubtAnswerResponse>>, ApiError> {
    let answers = state.tracker.list_answers(doubt_id).await?;
    Ok(Json(answers.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/doubt-answers/{id}/upvote",
    params(("id" = Uuid, Path, description = "The answer id.")),
    responses(
        (status = 200, description = "The upvoted answer", body = DoubtAnswerResponse),
        (status = 404, description = "Unknown answer", body = crate::error::ErrorBody)
    ),
    tag = "Doubts"
)]
pub async fn upvote_answer_handler(
    State(state): State<Arc<AppState>>,
    Path(answer_id): Path<Uuid>,
) -> Result<Json<DoubtAnswerResponse>, ApiError> {
    Ok(Json(state.tracker.upvote_answer(answer_id).await?.into()))
}

/// Accept an answer. The doubt becomes `solved` and the answer's author is
/// credited with a solved doubt. Accepting the same answer again is a no-op.
#[utoipa::path(
    post,
    path = "/api/doubt-answers/{id}/accept",
    params(("id" = Uuid, Path, description = "The answer id.")),
    responses(
        (status = 200, description = "The accepted answer", body = DoubtAnswerResponse),
        (status = 404, description = "Unknown answer", body = crate::error::ErrorBody),
        (status = 409, description = "Another answer is already accepted", body = crate::error::ErrorBody)
    ),
    tag = "Doubts"
)]
pub async fn accept_answer_handler(
    State(state): State<Arc<AppState>>,
    Path(answer_id): Path<Uuid>,
) -> Result<Json<DoubtAnswerResponse>, ApiError> {
    Ok(Json(state.tracker.accept_answer(answer_id).await?.into()))
}
