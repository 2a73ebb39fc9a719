use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::AppError;

/// One entry of the error array returned by every failing route.
#[derive(Debug, Serialize)]
struct ErrorIssue {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

impl ErrorIssue {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }
}

/// API-specific error wrapper that converts AppError into HTTP responses.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, issues) = match self {
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                vec![ErrorIssue::new("not_found", format!("{resource} not found"))],
            ),
            AppError::Validation(issues) => (
                StatusCode::BAD_REQUEST,
                issues
                    .into_iter()
                    .map(|issue| ErrorIssue {
                        code: "invalid_input",
                        message: issue.message,
                        path: Some(issue.path),
                    })
                    .collect(),
            ),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                vec![ErrorIssue::new("unauthorized", msg)],
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                vec![ErrorIssue::new("conflict", msg)],
            ),
            AppError::Database(msg) => {
                tracing::error!("database error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![ErrorIssue::new("internal_error", "Database error")],
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![ErrorIssue::new("internal_error", "Internal server error")],
                )
            }
        };

        (status, axum::Json(issues)).into_response()
    }
}
