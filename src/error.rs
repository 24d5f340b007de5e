use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized")]
    Unauthorized,

    /// A half-committed state was observed, e.g. a matched ride with no
    /// chair id. The commit-atomicity contract was broken somewhere.
    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),

    /// Storage-layer failure. The current pass is aborted without
    /// partial effect; the next scheduled pass retries.
    #[error("storage unavailable: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            AppError::ConsistencyViolation(msg) => {
                tracing::error!(error = %msg, "consistency violation observed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Storage(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
