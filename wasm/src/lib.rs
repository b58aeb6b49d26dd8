//! WebAssembly module for PrepPal
//!
//! Provides client-side computation for:
//! - Waste-risk classification of a production plan
//! - Production quantity recommendations
//! - Forecast confidence by horizon
//! - Offline validation of weekly forecast inputs

use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
}

fn quantity(field: &'static str, value: f64) -> Result<u32, JsValue> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(JsValue::from_str(&format!("{} must be a whole number", field)));
    }
    validate_quantity(field, value as i64).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Classify the waste risk of a plan; returns the assessment as JSON
#[wasm_bindgen]
pub fn waste_risk(predicted_demand: f64, planned_quantity: f64) -> Result<String, JsValue> {
    let demand = quantity("predicted_demand", predicted_demand)?;
    let planned = quantity("planned_quantity", planned_quantity)?;
    to_json(&classify_waste_risk(demand, planned))
}

/// Recommend a production quantity; returns the recommendation as JSON
#[wasm_bindgen]
pub fn recommend_quantity(predicted_demand: f64, current_plan: f64) -> Result<String, JsValue> {
    let demand = quantity("predicted_demand", predicted_demand)?;
    let plan = quantity("current_plan", current_plan)?;
    to_json(&recommend(demand, plan))
}

/// Production quantity with the safety buffer applied
#[wasm_bindgen]
pub fn buffered_production(predicted_demand: u32) -> u32 {
    buffered_quantity(predicted_demand)
}

/// Confidence tier ("High", "Medium", "Low") for a forecast `days_ahead` out
#[wasm_bindgen]
pub fn forecast_confidence_tier(days_ahead: u8, is_new_item: bool) -> Result<String, JsValue> {
    let horizon = Horizon::new(days_ahead)
        .ok_or_else(|| JsValue::from_str("days_ahead must be between 1 and 7"))?;
    Ok(confidence(horizon, is_new_item).tier.to_string())
}

/// Check the weather and holiday arrays of a weekly forecast before sending it
#[wasm_bindgen]
pub fn validate_week_inputs(weather_json: &str, holidays_json: &str) -> Result<bool, JsValue> {
    let weather: Vec<WeatherCondition> = serde_json::from_str(weather_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid weather JSON: {}", e)))?;
    let holidays: Vec<u8> = serde_json::from_str(holidays_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid holiday JSON: {}", e)))?;
    week_conditions(&weather, &holidays)
        .map(|_| true)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
