//! Forecast accuracy records and rolling aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::round_to;
use crate::types::BusinessType;

/// Rolling MAPE below which the model meets its accuracy target
pub const TARGET_MAPE: f64 = 20.0;

/// Rolling MAPE above which the model counts as degraded and should be retrained
pub const DEGRADED_MAPE: f64 = 25.0;

/// Default number of evaluations in the rolling window
pub const DEFAULT_WINDOW: usize = 7;

/// Point-in-time error metrics of a batch of predictions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ErrorMetrics {
    pub mae: f64,
    /// Percent, e.g. 12.5 for 12.5%
    pub mape: f64,
    pub rmse: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    #[error("no predictions to evaluate")]
    Empty,
    #[error("{actual} actual values but {predicted} predictions")]
    LengthMismatch { actual: usize, predicted: usize },
}

/// Compute MAE, MAPE, RMSE and R² of `predicted` against `actual`
pub fn error_metrics(actual: &[f64], predicted: &[f64]) -> Result<ErrorMetrics, MetricsError> {
    if actual.len() != predicted.len() {
        return Err(MetricsError::LengthMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(MetricsError::Empty);
    }

    let n = actual.len() as f64;
    let mae = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n;
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n;

    Ok(ErrorMetrics {
        mae,
        mape: mean_absolute_percentage_error(actual, predicted),
        rmse: mse.sqrt(),
        r2: r_squared(actual, predicted),
    })
}

/// MAPE in percent. Zero actuals are divided by machine epsilon rather than skipped.
pub fn mean_absolute_percentage_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs() / a.abs().max(f64::EPSILON))
        .sum();
    total / actual.len() as f64 * 100.0
}

fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        // constant actuals: perfect if every prediction is exact
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// One logged evaluation of past forecasts against realized sales
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccuracyRecord {
    pub timestamp: DateTime<Utc>,
    pub item_name: Option<String>,
    pub business_type: Option<BusinessType>,
    pub mae: f64,
    pub mape: f64,
    pub rmse: f64,
    pub r2: f64,
    pub n_predictions: usize,
}

impl AccuracyRecord {
    /// Build a record from computed metrics, rounded for storage
    pub fn new(
        metrics: ErrorMetrics,
        n_predictions: usize,
        business_type: Option<BusinessType>,
        item_name: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            item_name,
            business_type,
            mae: round_to(metrics.mae, 2),
            mape: round_to(metrics.mape, 2),
            rmse: round_to(metrics.rmse, 2),
            r2: round_to(metrics.r2, 3),
            n_predictions,
        }
    }

    pub fn exceeds_drift_threshold(&self) -> bool {
        self.mape > DEGRADED_MAPE
    }
}

/// Optional narrowing of the records that feed an aggregate
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccuracyFilter {
    pub item_name: Option<String>,
    pub business_type: Option<BusinessType>,
}

impl AccuracyFilter {
    pub fn matches(&self, record: &AccuracyRecord) -> bool {
        let item_ok = match &self.item_name {
            Some(item) => record.item_name.as_deref() == Some(item.as_str()),
            None => true,
        };
        let business_ok = match self.business_type {
            Some(business) => record.business_type == Some(business),
            None => true,
        };
        item_ok && business_ok
    }
}

/// Rolling averages over the window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AverageMetrics {
    pub avg_mape: f64,
    pub avg_mae: f64,
    pub avg_r2: f64,
}

/// Rolling accuracy of the most recent evaluations
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccuracyAggregate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    /// `None` when there were no records to aggregate
    pub metrics: Option<AverageMetrics>,
    pub target_mape: f64,
    pub meets_target: bool,
    pub degraded: bool,
    pub alert_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub history: Vec<AccuracyRecord>,
}

const NO_LOGS_MESSAGE: &str =
    "No accuracy logs yet. They are written after daily sales are reconciled.";
const NO_MATCH_MESSAGE: &str = "No matching records found.";
const DEGRADED_ALERT: &str = "Model accuracy degraded - consider retraining.";
const BELOW_TARGET_ALERT: &str = "Model accuracy is below the 20% MAPE target.";

impl AccuracyAggregate {
    fn empty(message: &str) -> Self {
        Self {
            period: None,
            metrics: None,
            target_mape: TARGET_MAPE,
            meets_target: false,
            degraded: false,
            alert_message: None,
            message: Some(message.to_string()),
            history: Vec::new(),
        }
    }

    /// Whether an automatic retrain should fire. Missing the target alone only alerts.
    pub fn should_retrain(&self) -> bool {
        self.degraded
    }
}

/// Aggregate the most recent `window` records matching `filter`.
///
/// `records` must be in append order (oldest first).
pub fn aggregate(records: &[AccuracyRecord], filter: &AccuracyFilter, window: usize) -> AccuracyAggregate {
    if records.is_empty() {
        return AccuracyAggregate::empty(NO_LOGS_MESSAGE);
    }

    let matching: Vec<&AccuracyRecord> = records.iter().filter(|r| filter.matches(r)).collect();
    let recent = &matching[matching.len().saturating_sub(window)..];
    if recent.is_empty() {
        return AccuracyAggregate::empty(NO_MATCH_MESSAGE);
    }

    let n = recent.len() as f64;
    let raw_mape = recent.iter().map(|r| r.mape).sum::<f64>() / n;
    let metrics = AverageMetrics {
        avg_mape: round_to(raw_mape, 2),
        avg_mae: round_to(recent.iter().map(|r| r.mae).sum::<f64>() / n, 2),
        avg_r2: round_to(recent.iter().map(|r| r.r2).sum::<f64>() / n, 3),
    };

    let meets_target = metrics.avg_mape < TARGET_MAPE;
    let degraded = metrics.avg_mape > DEGRADED_MAPE;
    let alert_message = if degraded {
        Some(DEGRADED_ALERT.to_string())
    } else if !meets_target {
        Some(BELOW_TARGET_ALERT.to_string())
    } else {
        None
    };

    AccuracyAggregate {
        period: Some(format!("Last {} evaluations", recent.len())),
        metrics: Some(metrics),
        target_mape: TARGET_MAPE,
        meets_target,
        degraded,
        alert_message,
        message: None,
        history: recent.iter().map(|r| (*r).clone()).collect(),
    }
}
