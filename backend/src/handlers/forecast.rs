//! HTTP handlers for demand forecasts

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{
    validate_forecast_request, week_conditions, BusinessType, ForecastRequest, ForecastResult,
    WeatherCondition,
};

use crate::error::AppResult;
use crate::handlers::ApiResponse;
use crate::AppState;

/// Input for a seven-day forecast
#[derive(Debug, Deserialize)]
pub struct WeekForecastInput {
    pub item_name: String,
    pub business_type: BusinessType,
    pub price: f64,
    pub shelf_life_hours: f64,
    pub starting_date: NaiveDate,
    pub weather_forecast: Vec<WeatherCondition>,
    pub holiday_flags: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct ForecastPayload<T: Serialize> {
    /// At least one result came from the fallback path
    pub fallback: bool,
    pub forecast: T,
}

/// Forecast a single day
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<ForecastRequest>,
) -> AppResult<Json<ApiResponse<ForecastPayload<ForecastResult>>>> {
    validate_forecast_request(&request)?;
    let result = state.engine.forecast(&request)?;
    Ok(Json(ApiResponse::ok(ForecastPayload {
        fallback: result.fallback,
        forecast: result,
    })))
}

/// Forecast seven consecutive days
pub async fn predict_week(
    State(state): State<AppState>,
    Json(input): Json<WeekForecastInput>,
) -> AppResult<Json<ApiResponse<ForecastPayload<Vec<ForecastResult>>>>> {
    let week = week_conditions(&input.weather_forecast, &input.holiday_flags)?;
    let request = ForecastRequest {
        item_name: input.item_name,
        business_type: input.business_type,
        date: input.starting_date,
        price: input.price,
        shelf_life_hours: input.shelf_life_hours,
        weather: week[0].weather,
        is_holiday: week[0].is_holiday,
    };
    validate_forecast_request(&request)?;

    let days = state.engine.forecast_week(&request, &week)?;
    Ok(Json(ApiResponse::ok(ForecastPayload {
        fallback: days.iter().any(|d| d.fallback),
        forecast: days,
    })))
}
