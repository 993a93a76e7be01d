//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and helpers shared by
//! the REST handlers.

use crate::error::{ApiError, ErrorBody};
use crate::web::protocol::{
    CreateTaskRequest, DoubtAnswerResponse, DoubtResponse, PostAnswerRequest, PostDoubtRequest,
    SessionResponse, StartSessionRequest, StatsResponse, SuggestionsResponse, TaskResponse,
    UpdateSessionRequest, UpdateTaskRequest,
};
use crate::web::{doubts, sessions, tasks, users};
use axum::{extract::rejection::JsonRejection, Json};
use study_tracker_core::PortError;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        sessions::start_session_handler,
        sessions::update_session_handler,
        sessions::get_session_handler,
        sessions::list_sessions_handler,
        sessions::active_session_handler,
        tasks::create_task_handler,
        tasks::get_task_handler,
        tasks::update_task_handler,
        tasks::delete_task_handler,
        tasks::list_tasks_handler,
        users::stats_handler,
        users::recommendations_handler,
        doubts::post_doubt_handler,
        doubts::list_doubts_handler,
        doubts::get_doubt_handler,
        doubts::upvote_doubt_handler,
        doubts::post_answer_handler,
        doubts::list_answers_handler,
        doubts::upvote_answer_handler,
        doubts::accept_answer_handler,
    ),
    components(
        schemas(
            StartSessionRequest,
            UpdateSessionRequest,
            SessionResponse,
            CreateTaskRequest,
            UpdateTaskRequest,
            TaskResponse,
            StatsResponse,
            SuggestionsResponse,
            PostDoubtRequest,
            DoubtResponse,
            PostAnswerRequest,
            DoubtAnswerResponse,
            ErrorBody
        )
    ),
    tags(
        (name = "Study Sessions", description = "Start, pause, resume, complete and abandon study sessions."),
        (name = "Tasks", description = "The per-user task ledger."),
        (name = "Users", description = "Derived statistics and study recommendations."),
        (name = "Doubts", description = "Questions and peer answers, with optional AI tutor drafts.")
    )
)]
pub struct ApiDoc;

/// Unwraps a JSON body, reporting a malformed payload as a validation error.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| PortError::validation("body", rejection.body_text()).into())
}
