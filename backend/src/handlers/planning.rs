//! HTTP handlers for waste-risk alerts and production recommendations

use axum::Json;
use serde::Deserialize;
use shared::{classify_waste_risk, recommend, validate_quantity, Recommendation, RiskAssessment};

use crate::error::AppResult;
use crate::handlers::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct RiskAlertInput {
    pub predicted_demand: i64,
    pub planned_quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RecommendInput {
    pub predicted_demand: i64,
    #[serde(default)]
    pub current_plan: i64,
}

/// Classify the waste risk of a production plan
pub async fn risk_alert(
    Json(input): Json<RiskAlertInput>,
) -> AppResult<Json<ApiResponse<RiskAssessment>>> {
    let demand = validate_quantity("predicted_demand", input.predicted_demand)?;
    let planned = validate_quantity("planned_quantity", input.planned_quantity)?;
    Ok(Json(ApiResponse::ok(classify_waste_risk(demand, planned))))
}

/// Recommend a production quantity
pub async fn recommend_quantity(
    Json(input): Json<RecommendInput>,
) -> AppResult<Json<ApiResponse<Recommendation>>> {
    let demand = validate_quantity("predicted_demand", input.predicted_demand)?;
    let plan = validate_quantity("current_plan", input.current_plan)?;
    Ok(Json(ApiResponse::ok(recommend(demand, plan))))
}
