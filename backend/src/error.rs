//! Error handling for the PrepPal forecasting service
//!
//! Every failure a caller can see is one `AppError` variant with a stable code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::InvalidField;
use thiserror::Error;

use crate::services::scorer::ScoreError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Caller input errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Forecasting errors
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Feature resolution failed: {0}")]
    UnresolvableFeature(String),

    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),

    // Retraining errors
    #[error("Retrain data not found: {0}")]
    DataNotFound(String),

    #[error("A retrain job is already in progress: {0}")]
    RetrainInProgress(uuid::Uuid),

    // Infrastructure errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<InvalidField> for AppError {
    fn from(err: InvalidField) -> Self {
        AppError::Validation {
            field: err.field.to_string(),
            message: err.message,
        }
    }
}

impl From<ScoreError> for AppError {
    fn from(err: ScoreError) -> Self {
        match err {
            ScoreError::ModelUnavailable(msg) => AppError::ModelUnavailable(msg),
            ScoreError::FeatureCount(mismatch) => AppError::InternalInvariant(mismatch.to_string()),
            ScoreError::NonFinite => {
                AppError::InternalInvariant("scorer produced a non-finite estimate".to_string())
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(format!("invalid JSON: {}", err))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {}", err))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Storage(format!("invalid CSV: {}", err))
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        let detail = |code: &str, message: String| ErrorDetail {
            code: code.to_string(),
            message,
            field: None,
        };

        match self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                detail("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::ModelUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                detail("MODEL_UNAVAILABLE", format!("Model unavailable: {}", msg)),
            ),
            AppError::UnresolvableFeature(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail("UNRESOLVABLE_FEATURE", msg.clone()),
            ),
            AppError::InternalInvariant(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail(
                    "INTERNAL_INVARIANT",
                    "An internal consistency check failed".to_string(),
                ),
            ),
            AppError::DataNotFound(reference) => (
                StatusCode::NOT_FOUND,
                detail(
                    "DATA_NOT_FOUND",
                    format!("Retrain data not found: {}", reference),
                ),
            ),
            AppError::RetrainInProgress(job_id) => (
                StatusCode::CONFLICT,
                detail(
                    "RETRAIN_IN_PROGRESS",
                    format!("Retrain job {} is still running", job_id),
                ),
            ),
            AppError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail("STORAGE_ERROR", format!("Storage error: {}", msg)),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail("CONFIGURATION_ERROR", format!("Configuration error: {}", msg)),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail("INTERNAL_ERROR", msg.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                detail(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                ),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        (
            status,
            Json(ErrorResponse {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
