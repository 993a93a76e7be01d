//! services/api/src/web/users.rs
//!
//! Per-user statistics and study recommendations.

use crate::error::ApiError;
use crate::web::protocol::{StatsResponse, SuggestionsResponse};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    response::Json,
};
use std::sync::Arc;
use study_tracker_core::StudySuggestions;
use tracing::warn;
use uuid::Uuid;

/// The user's statistics. An all-zero row is created on first access.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/stats",
    params(("user_id" = Uuid, Path, description = "The unique ID of the user.")),
    responses((status = 200, description = "The user's statistics", body = StatsResponse)),
    tag = "Users"
)]
pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StatsResponse>, ApiError> {
    Ok(Json(state.tracker.stats(user_id).await?.into()))
}

/// Personalised study suggestions.
///
/// Gateway failures never surface here: the fixed generic suggestions are
/// returned instead.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/study-recommendations",
    params(("user_id" = Uuid, Path, description = "The unique ID of the user.")),
    responses((status = 200, description = "Study suggestions", body = SuggestionsResponse)),
    tag = "Users"
)]
pub async fn recommendations_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let summary = state.tracker.study_summary(user_id).await?;
    let suggestions = state
        .recommender
        .summarize(&summary)
        .await
        .unwrap_or_else(|e| {
            warn!(%user_id, "Recommendation gateway failed, using fallback: {}", e);
            StudySuggestions::fallback()
        });
    Ok(Json(suggestions.into()))
}
