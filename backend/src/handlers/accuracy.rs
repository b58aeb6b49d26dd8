//! HTTP handlers for accuracy monitoring

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use shared::{
    validate_prediction_batch, validate_window, AccuracyAggregate, AccuracyFilter,
    AccuracyRecord, BusinessType, RetrainJob,
};

use crate::error::AppResult;
use crate::handlers::ApiResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AccuracyInput {
    pub item_name: Option<String>,
    pub business_type: Option<BusinessType>,
    #[serde(default = "default_window")]
    pub n_recent: i64,
}

fn default_window() -> i64 {
    shared::DEFAULT_WINDOW as i64
}

#[derive(Debug, Serialize)]
pub struct AccuracyPayload {
    #[serde(flatten)]
    pub aggregate: AccuracyAggregate,
    /// Started because accuracy degraded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrain_job: Option<RetrainJob>,
}

#[derive(Debug, Deserialize)]
pub struct LogPredictionsInput {
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    pub business_type: Option<BusinessType>,
    pub item_name: Option<String>,
}

/// Rolling accuracy of recent evaluations
pub async fn get_accuracy(
    State(state): State<AppState>,
    Json(input): Json<AccuracyInput>,
) -> AppResult<Json<ApiResponse<AccuracyPayload>>> {
    let n = validate_window(input.n_recent)?;
    let filter = AccuracyFilter {
        item_name: input.item_name,
        business_type: input.business_type,
    };
    let monitor = state.monitor.clone();
    let aggregate =
        tokio::task::spawn_blocking(move || monitor.accuracy(&filter, Some(n))).await??;
    let retrain_job = state.retrain.auto_retrain(&aggregate);
    Ok(Json(ApiResponse::ok(AccuracyPayload {
        aggregate,
        retrain_job,
    })))
}

/// Record realized demand against earlier predictions
pub async fn log_predictions(
    State(state): State<AppState>,
    Json(input): Json<LogPredictionsInput>,
) -> AppResult<Json<ApiResponse<AccuracyRecord>>> {
    validate_prediction_batch(&input.actual, &input.predicted)?;
    let monitor = state.monitor.clone();
    let record = tokio::task::spawn_blocking(move || {
        monitor.log_predictions(
            &input.actual,
            &input.predicted,
            input.business_type,
            input.item_name,
        )
    })
    .await??;
    Ok(Json(ApiResponse::ok(record)))
}
