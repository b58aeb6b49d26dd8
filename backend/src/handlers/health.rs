//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;
use shared::RetrainJob;

use crate::services::{ModelHealth, ScorerStatus};
use crate::AppState;

/// Overall service status; transport success does not imply a healthy model
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub scorer: ScorerStatus,
    pub history_rows: usize,
    pub history_items: usize,
    pub latest_retrain: Option<RetrainJob>,
    pub version: String,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let scorer = state.scorer.status();
    let history = state.history.snapshot();
    let status = match scorer.health {
        ModelHealth::Healthy => ServiceStatus::Healthy,
        ModelHealth::Degraded | ModelHealth::Error => ServiceStatus::Degraded,
    };

    Json(HealthResponse {
        status,
        model_loaded: scorer.model_loaded,
        error: scorer.error.clone(),
        scorer,
        history_rows: history.len(),
        history_items: history.item_count(),
        latest_retrain: state.retrain.latest(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
