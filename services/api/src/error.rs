//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! rendered as an HTTP response.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use study_tracker_core::ports::PortError;
use tracing::error;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the engine or one of the core ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to apply the database migrations at startup.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The JSON body of every error response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    /// Machine readable error code.
    pub error: String,
    pub message: String,
    /// The request field at fault, for validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        match self {
            ApiError::Port(PortError::Validation { field, message }) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "validation".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            ApiError::Port(PortError::NotFound(message)) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "not_found".to_string(),
                    message: message.clone(),
                    field: None,
                },
            ),
            ApiError::Port(PortError::Conflict(message)) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: "conflict".to_string(),
                    message: message.clone(),
                    field: None,
                },
            ),
            ApiError::Port(PortError::InvalidState(message)) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: "invalid_state".to_string(),
                    message: message.clone(),
                    field: None,
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "internal".to_string(),
                    message: "An internal error occurred".to_string(),
                    field: None,
                },
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_client_statuses() {
        let cases = [
            (PortError::validation("title", "must not be empty"), StatusCode::BAD_REQUEST),
            (PortError::NotFound("task".into()), StatusCode::NOT_FOUND),
            (PortError::Conflict("slot taken".into()), StatusCode::CONFLICT),
            (PortError::InvalidState("paused".into()), StatusCode::CONFLICT),
            (PortError::Unexpected("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let (status, _) = ApiError::from(err).status_and_body();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn validation_body_names_the_field() {
        let (_, body) = ApiError::from(PortError::validation("subject", "must not be empty"))
            .status_and_body();
        assert_eq!(body.error, "validation");
        assert_eq!(body.field.as_deref(), Some("subject"));
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let (_, body) = ApiError::Internal("db password wrong".into()).status_and_body();
        assert_eq!(body.message, "An internal error occurred");
    }
}
