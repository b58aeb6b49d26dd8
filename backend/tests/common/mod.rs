//! Fixtures shared by the backend integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use preppal_backend::config::{
    AccuracyConfig, Config, DataConfig, ModelConfig, RetrainConfig, ServerConfig,
};
use preppal_backend::services::{
    AccuracyMonitor, FallbackCache, ForecastEngine, HistoryHandle, MemoryAccuracyLog,
    ModelStore, SalesHistory, ScoreError, Scorer, ScorerAdapter,
};
use preppal_backend::AppState;
use shared::{
    BusinessType, FeatureSlot, FeatureVector, ForecastRequest, SalesRecord, WeatherCondition,
};

/// First day of every generated series (a Wednesday)
pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

/// Weekly demand pattern keyed on Monday=0 day of week
pub fn weekly_demand(date: NaiveDate) -> f64 {
    30.0 + 5.0 * f64::from(date.weekday().num_days_from_monday())
}

pub fn sale(item: &str, business_type: BusinessType, date: NaiveDate, demand: f64) -> SalesRecord {
    SalesRecord {
        date,
        item_name: item.to_string(),
        business_type,
        customer_demand: demand,
        quantity_sold: demand,
        quantity_available: Some(demand + 5.0),
        waste_quantity: 5.0,
        price: 50.0,
        shelf_life_hours: 4.0,
        weather_condition: WeatherCondition::Clear,
        holiday_flag: 0,
    }
}

/// `days` consecutive daily rows following the weekly pattern
pub fn weekly_series(item: &str, business_type: BusinessType, days: i64) -> Vec<SalesRecord> {
    (0..days)
        .map(|d| {
            let date = start_date() + Duration::days(d);
            sale(item, business_type, date, weekly_demand(date))
        })
        .collect()
}

pub fn request(item: &str, business_type: BusinessType, date: NaiveDate) -> ForecastRequest {
    ForecastRequest {
        item_name: item.to_string(),
        business_type,
        date,
        price: 50.0,
        shelf_life_hours: 4.0,
        weather: WeatherCondition::Clear,
        is_holiday: false,
    }
}

/// Always predicts the same value
pub struct ConstantScorer(pub f64);

impl Scorer for ConstantScorer {
    fn score(&self, _features: &FeatureVector) -> Result<f64, ScoreError> {
        Ok(self.0)
    }

    fn describe(&self) -> String {
        format!("constant {}", self.0)
    }
}

/// Reproduces the weekly pattern exactly from the day-of-week slot
pub struct WeeklyOracle;

impl Scorer for WeeklyOracle {
    fn score(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        Ok(30.0 + 5.0 * features.get(FeatureSlot::DayOfWeek))
    }

    fn describe(&self) -> String {
        "weekly oracle".to_string()
    }
}

pub fn engine_with(scorer: Arc<ScorerAdapter>, history: SalesHistory) -> ForecastEngine {
    ForecastEngine::new(
        scorer,
        FallbackCache::in_memory(),
        Arc::new(HistoryHandle::new(history)),
    )
}

pub fn write_sales_csv(path: &Path, rows: &[SalesRecord]) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    for row in rows {
        writer.serialize(row).unwrap();
    }
    writer.flush().unwrap();
}

pub fn test_config(dir: &Path) -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        model: ModelConfig {
            path: dir.join("active_model.json"),
            archive_dir: dir.join("archive"),
        },
        data: DataConfig {
            history_path: dir.join("sales_history.csv"),
            metrics_path: dir.join("model_metrics.jsonl"),
        },
        retrain: RetrainConfig {
            holdout_days: 14,
            ..RetrainConfig::default()
        },
        accuracy: AccuracyConfig::default(),
    }
}

/// Application state over in-memory logs and the given scorer
pub fn test_state(dir: &Path, scorer: Arc<ScorerAdapter>, history: SalesHistory) -> AppState {
    let config = test_config(dir);
    let store = ModelStore::new(config.model.archive_dir.clone());
    let monitor = AccuracyMonitor::new(Arc::new(MemoryAccuracyLog::new()), config.accuracy.window);
    AppState::assemble(config, scorer, history, store, monitor)
}

pub fn upload_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}
