use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use reelflow_core::error::CoreError;
use reelflow_store::StoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps domain and store errors and implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `reelflow_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A persistence error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Store(store) => classify_store_error(store),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

/// Classify a store error into an HTTP status, error code, and message.
///
/// Database and serialization failures surface as 500 with the
/// `STORE_ERROR` code so callers can distinguish persistence outages
/// from their own mistakes.
fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::NotFound { project_id, job_id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Job {project_id}/{job_id} not found"),
        ),
        StoreError::InvalidTransition { from, to } => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Invalid status transition: {from} -> {to}"),
        ),
        StoreError::Core(core) => classify_core_error(core),
        StoreError::Database(db_err) => {
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Job store unavailable".to_string(),
            )
        }
        StoreError::Serialization(ser_err) => {
            tracing::error!(error = %ser_err, "Job serialization error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "Job store unavailable".to_string(),
            )
        }
    }
}
