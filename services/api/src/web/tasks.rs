//! services/api/src/web/tasks.rs
//!
//! Axum handlers for the task ledger endpoints.

use crate::error::ApiError;
use crate::web::protocol::{CreateTaskRequest, TaskResponse, UpdateTaskRequest};
use crate::web::rest::json_body;
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use uuid::Uuid;

/// Create a task.
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Invalid request body", body = crate::error::ErrorBody)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let new_task = json_body(payload)?.into_domain()?;
    let task = state.tracker.create_task(new_task).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "The task id.")),
    responses(
        (status = 200, description = "The task", body = TaskResponse),
        (status = 404, description = "Unknown task", body = crate::error::ErrorBody)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<TaskResponse>, ApiError> {
    Ok(Json(state.tracker.get_task(task_id).await?.into()))
}

/// Edit a task or toggle its status.
///
/// Setting `status` to `completed` on a task that is already completed
/// returns it unchanged.
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}",
    request_body = UpdateTaskRequest,
    params(("id" = Uuid, Path, description = "The task id.")),
    responses(
        (status = 200, description = "Updated task", body = TaskResponse),
        (status = 400, description = "Invalid request body", body = crate::error::ErrorBody),
        (status = 404, description = "Unknown task", body = crate::error::ErrorBody)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let patch = json_body(payload)?.into_patch()?;
    let task = state.tracker.update_task(task_id, patch).await?;
    Ok(Json(task.into()))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "The task id.")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Unknown task", body = crate::error::ErrorBody)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.tracker.delete_task(task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a user's tasks, most recently created first.
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/tasks",
    params(("user_id" = Uuid, Path, description = "The unique ID of the user.")),
    responses((status = 200, description = "The user's tasks", body = [TaskResponse])),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = state.tracker.list_tasks(user_id).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}
