// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::{
    cache::CacheError, session::SessionError, store::StoreError, wizard::WizardError,
};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., duplicate quiz code, submitting twice)
    Conflict(String),

    // 503 Service Unavailable (store faults the caller may retry)
    ServiceUnavailable(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Backend(msg) => {
                tracing::error!("Store failure: {}", msg);
                AppError::ServiceUnavailable(
                    "The quiz store is unavailable. Please try again.".to_string(),
                )
            }
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidQuiz(msg)
            | SessionError::Validation(msg) => AppError::BadRequest(msg),
            e @ SessionError::OutOfRange { .. } => AppError::BadRequest(e.to_string()),
            e @ SessionError::InvalidState { .. } => AppError::Conflict(e.to_string()),
            e @ SessionError::TimeUp(_) => AppError::Conflict(e.to_string()),
            SessionError::SubmissionFailed(msg) => {
                tracing::error!("Quiz submission failed: {}", msg);
                AppError::ServiceUnavailable(
                    "Failed to submit quiz results. Your answers are kept, please retry."
                        .to_string(),
                )
            }
            SessionError::Store(e) => e.into(),
            SessionError::Cache(e) => e.into(),
        }
    }
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Validation(msg) => AppError::BadRequest(msg),
            e @ WizardError::InvalidState(_) => AppError::Conflict(e.to_string()),
            WizardError::Store(e) => e.into(),
            WizardError::Cache(e) => e.into(),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
