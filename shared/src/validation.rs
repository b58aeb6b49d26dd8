//! Input validation for the PrepPal forecasting platform
//!
//! Requests are rejected here, before any forecasting service sees them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{
    DayConditions, ForecastRequest, Horizon, SalesRecord, WeekConditions, REQUIRED_SALES_COLUMNS,
};
use crate::types::WeatherCondition;

/// A rejected request field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct InvalidField {
    pub field: &'static str,
    pub message: String,
}

impl InvalidField {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

// ============================================================================
// Forecast Requests
// ============================================================================

/// Validate a single-day forecast request
pub fn validate_forecast_request(request: &ForecastRequest) -> Result<(), InvalidField> {
    if request.item_name.trim().is_empty() {
        return Err(InvalidField::new("item_name", "Item name is required"));
    }
    if !request.price.is_finite() || request.price <= 0.0 {
        return Err(InvalidField::new("price", "Price must be greater than 0"));
    }
    if !request.shelf_life_hours.is_finite() || request.shelf_life_hours <= 0.0 {
        return Err(InvalidField::new(
            "shelf_life_hours",
            "Shelf life must be greater than 0 hours",
        ));
    }
    Ok(())
}

/// Combine per-day weather and holiday inputs into the conditions of a full week.
///
/// Both arrays must hold exactly seven entries; holiday flags must be 0 or 1.
pub fn week_conditions(
    weather: &[WeatherCondition],
    holiday_flags: &[u8],
) -> Result<WeekConditions, InvalidField> {
    let days = Horizon::MAX_DAYS as usize;
    if weather.len() != days {
        return Err(InvalidField::new(
            "weather_forecast",
            format!("Expected exactly {} weather values, got {}", days, weather.len()),
        ));
    }
    if holiday_flags.len() != days {
        return Err(InvalidField::new(
            "holiday_flags",
            format!("Expected exactly {} holiday flags, got {}", days, holiday_flags.len()),
        ));
    }
    if holiday_flags.iter().any(|flag| *flag > 1) {
        return Err(InvalidField::new("holiday_flags", "Holiday flags must be 0 or 1"));
    }

    let mut week = [DayConditions::default(); Horizon::MAX_DAYS as usize];
    for (day, conditions) in week.iter_mut().enumerate() {
        *conditions = DayConditions {
            weather: weather[day],
            is_holiday: holiday_flags[day] == 1,
        };
    }
    Ok(week)
}

// ============================================================================
// Planning Inputs
// ============================================================================

/// Validate a unit count supplied by a caller (demand, plan, quantity)
pub fn validate_quantity(field: &'static str, value: i64) -> Result<u32, InvalidField> {
    if value < 0 {
        return Err(InvalidField::new(field, "Must be a non-negative integer"));
    }
    u32::try_from(value).map_err(|_| InvalidField::new(field, "Value is too large"))
}

/// Validate the size of an accuracy window
pub fn validate_window(n_recent: i64) -> Result<usize, InvalidField> {
    if n_recent < 1 {
        return Err(InvalidField::new("n_recent", "Must be at least 1"));
    }
    usize::try_from(n_recent).map_err(|_| InvalidField::new("n_recent", "Value is too large"))
}

/// Validate a batch of realized sales against their predictions
pub fn validate_prediction_batch(actual: &[f64], predicted: &[f64]) -> Result<(), InvalidField> {
    if actual.is_empty() {
        return Err(InvalidField::new("actual", "At least one value is required"));
    }
    if actual.len() != predicted.len() {
        return Err(InvalidField::new(
            "predicted",
            "Must have the same length as actual",
        ));
    }
    if actual.iter().chain(predicted).any(|v| !v.is_finite() || *v < 0.0) {
        return Err(InvalidField::new("actual", "Values must be non-negative numbers"));
    }
    Ok(())
}

// ============================================================================
// Sales Uploads
// ============================================================================

/// Outcome of validating an uploaded sales file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UploadValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub rows: usize,
}

impl UploadValidation {
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Settle `valid` once every check has run
    pub fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

/// Check that every required column is present in a header row
pub fn validate_upload_columns(headers: &[&str], report: &mut UploadValidation) {
    let missing: Vec<&str> = REQUIRED_SALES_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.contains(column))
        .collect();
    if !missing.is_empty() {
        report.error(format!("Missing columns: {}", missing.join(", ")));
    }
    if !headers.contains(&"quantity_available") {
        report.warn("Column quantity_available is missing; sales cannot be checked against stock");
    }
}

/// Business-rule checks over parsed sales rows
pub fn validate_sales_rows(rows: &[SalesRecord], report: &mut UploadValidation) {
    report.rows = rows.len();
    if rows.is_empty() {
        report.error("Upload contains no sales rows");
        return;
    }

    let mut negative_sold = 0;
    let mut negative_other = 0;
    let mut oversold = 0;
    let mut missing_available = 0;
    let mut bad_price = 0;
    let mut seen = HashSet::with_capacity(rows.len());
    let mut duplicates = 0;

    for row in rows {
        if row.quantity_sold < 0.0 {
            negative_sold += 1;
        }
        if row.customer_demand < 0.0 || row.waste_quantity < 0.0 {
            negative_other += 1;
        }
        match row.quantity_available {
            Some(available) if row.quantity_sold > available => oversold += 1,
            Some(_) => {}
            None => missing_available += 1,
        }
        if row.price <= 0.0 || row.shelf_life_hours < 0.0 {
            bad_price += 1;
        }
        if row.holiday_flag > 1 {
            report.error(format!(
                "{} {}: holiday_flag must be 0 or 1",
                row.date, row.item_name
            ));
        }
        if !seen.insert((row.date, row.business_type, row.item_name.as_str())) {
            duplicates += 1;
        }
    }

    if negative_sold > 0 {
        report.error(format!("{} row(s) with negative quantity_sold", negative_sold));
    }
    if negative_other > 0 {
        report.error(format!(
            "{} row(s) with negative customer_demand or waste_quantity",
            negative_other
        ));
    }
    if oversold > 0 {
        report.error(format!(
            "{} row(s) where quantity_sold exceeds quantity_available",
            oversold
        ));
    }
    if bad_price > 0 {
        report.error(format!(
            "{} row(s) with non-positive price or negative shelf life",
            bad_price
        ));
    }
    if missing_available > 0 {
        report.warn(format!("{} row(s) missing quantity_available", missing_available));
    }
    if duplicates > 0 {
        report.warn(format!("{} duplicate date-item row(s)", duplicates));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BusinessType;

    fn request() -> ForecastRequest {
        ForecastRequest {
            item_name: "Latte".to_string(),
            business_type: BusinessType::Cafe,
            date: "2025-12-01".parse().unwrap(),
            price: 25.0,
            shelf_life_hours: 0.5,
            weather: WeatherCondition::Clear,
            is_holiday: false,
        }
    }

    fn row(sold: f64, available: Option<f64>) -> SalesRecord {
        SalesRecord {
            date: "2025-03-14".parse().unwrap(),
            item_name: "Latte".to_string(),
            business_type: BusinessType::Cafe,
            customer_demand: 40.0,
            quantity_sold: sold,
            quantity_available: available,
            waste_quantity: 0.0,
            price: 25.0,
            shelf_life_hours: 0.5,
            weather_condition: WeatherCondition::Clear,
            holiday_flag: 0,
        }
    }

    #[test]
    fn rejects_non_positive_price_and_shelf_life() {
        assert!(validate_forecast_request(&request()).is_ok());

        let mut req = request();
        req.price = 0.0;
        assert_eq!(validate_forecast_request(&req).unwrap_err().field, "price");

        let mut req = request();
        req.shelf_life_hours = -1.0;
        assert_eq!(
            validate_forecast_request(&req).unwrap_err().field,
            "shelf_life_hours"
        );

        let mut req = request();
        req.item_name = "  ".to_string();
        assert_eq!(validate_forecast_request(&req).unwrap_err().field, "item_name");
    }

    #[test]
    fn week_requires_exactly_seven_days() {
        let weather = [WeatherCondition::Clear; 7];
        let week = week_conditions(&weather, &[0, 0, 0, 0, 0, 1, 0]).unwrap();
        assert!(week[5].is_holiday);
        assert!(!week[0].is_holiday);

        assert_eq!(
            week_conditions(&weather[..6], &[0; 7]).unwrap_err().field,
            "weather_forecast"
        );
        assert_eq!(
            week_conditions(&weather, &[0; 8]).unwrap_err().field,
            "holiday_flags"
        );
        assert!(week_conditions(&weather, &[0, 0, 2, 0, 0, 0, 0]).is_err());
    }

    #[test]
    fn quantities_must_be_non_negative() {
        assert_eq!(validate_quantity("planned_quantity", 60), Ok(60));
        assert_eq!(validate_quantity("planned_quantity", 0), Ok(0));
        assert!(validate_quantity("planned_quantity", -1).is_err());
        assert!(validate_window(0).is_err());
        assert_eq!(validate_window(7), Ok(7));
    }

    #[test]
    fn prediction_batch_lengths_must_match() {
        assert!(validate_prediction_batch(&[1.0, 2.0], &[1.0, 2.0]).is_ok());
        assert!(validate_prediction_batch(&[1.0], &[1.0, 2.0]).is_err());
        assert!(validate_prediction_batch(&[], &[]).is_err());
    }

    #[test]
    fn missing_columns_are_errors() {
        let mut report = UploadValidation::default();
        validate_upload_columns(&["date", "item_name"], &mut report);
        let report = report.finish();
        assert!(!report.valid);
        assert!(report.errors[0].contains("customer_demand"));
    }

    #[test]
    fn oversold_rows_fail_and_missing_stock_warns() {
        let mut report = UploadValidation::default();
        validate_sales_rows(&[row(30.0, Some(25.0))], &mut report);
        assert!(!report.finish().valid);

        let mut report = UploadValidation::default();
        validate_sales_rows(&[row(30.0, None)], &mut report);
        let report = report.finish();
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.rows, 1);
    }

    #[test]
    fn negative_sales_fail() {
        let mut report = UploadValidation::default();
        validate_sales_rows(&[row(-1.0, Some(10.0))], &mut report);
        assert!(!report.finish().valid);
    }
}
