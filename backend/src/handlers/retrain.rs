//! HTTP handlers for retrain jobs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{RetrainJob, RetrainTrigger};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::ApiResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RetrainInput {
    pub new_data_path: String,
}

#[derive(Debug, Serialize)]
pub struct RetrainPayload {
    pub message: String,
    pub job: RetrainJob,
}

/// Start a retrain job; poll it at `/api/retrain/:job_id`
pub async fn trigger_retrain(
    State(state): State<AppState>,
    Json(input): Json<RetrainInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<RetrainPayload>>)> {
    if input.new_data_path.trim().is_empty() {
        return Err(AppError::Validation {
            field: "new_data_path".to_string(),
            message: "Data path is required".to_string(),
        });
    }
    let job = state
        .retrain
        .trigger(input.new_data_path.trim(), RetrainTrigger::Manual)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(RetrainPayload {
            message: format!("Retraining started. Poll /api/retrain/{} for progress.", job.id),
            job,
        })),
    ))
}

/// Get a retrain job by ID
pub async fn get_retrain_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RetrainPayload>>> {
    let job = state.retrain.job(job_id)?;
    Ok(Json(ApiResponse::ok(RetrainPayload {
        message: format!("Retrain job is {}", job.state),
        job,
    })))
}

/// Abandon a retrain job that has not reached evaluation
pub async fn abandon_retrain_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RetrainPayload>>> {
    let job = state.retrain.abandon(job_id)?;
    Ok(Json(ApiResponse::ok(RetrainPayload {
        message: "Retrain job abandoned".to_string(),
        job,
    })))
}
