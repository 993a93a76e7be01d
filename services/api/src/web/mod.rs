pub mod doubts;
pub mod protocol;
pub mod rest;
pub mod sessions;
pub mod state;
pub mod tasks;
pub mod users;

use crate::error::ApiError;
use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use rest::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the complete application: the REST API under `/api` plus the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS origin: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let api_router = Router::new()
        .route("/study-sessions", post(sessions::start_session_handler))
        .route(
            "/study-sessions/{id}",
            get(sessions::get_session_handler).patch(sessions::update_session_handler),
        )
        .route("/tasks", post(tasks::create_task_handler))
        .route(
            "/tasks/{id}",
            get(tasks::get_task_handler)
                .patch(tasks::update_task_handler)
                .delete(tasks::delete_task_handler),
        )
        .route(
            "/users/{user_id}/study-sessions",
            get(sessions::list_sessions_handler),
        )
        .route(
            "/users/{user_id}/study-sessions/active",
            get(sessions::active_session_handler),
        )
        .route("/users/{user_id}/tasks", get(tasks::list_tasks_handler))
        .route(
            "/doubts",
            get(doubts::list_doubts_handler).post(doubts::post_doubt_handler),
        )
        .route("/doubts/{id}", get(doubts::get_doubt_handler))
        .route("/doubts/{id}/upvote", post(doubts::upvote_doubt_handler))
        .route(
            "/doubts/{id}/answers",
            get(doubts::list_answers_handler).post(doubts::post_answer_handler),
        )
        .route(
            "/doubt-answers/{id}/upvote",
            post(doubts::upvote_answer_handler),
        )
        .route(
            "/doubt-answers/{id}/accept",
            post(doubts::accept_answer_handler),
        )
        .route("/users/{user_id}/stats", get(users::stats_handler))
        .route(
            "/users/{user_id}/study-recommendations",
            get(users::recommendations_handler),
        )
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .nest("/api", api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
