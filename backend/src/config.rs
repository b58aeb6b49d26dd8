//! Configuration management for the PrepPal forecasting service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PREPPAL_ prefix

use std::path::PathBuf;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub model: ModelConfig,

    pub data: DataConfig,

    pub retrain: RetrainConfig,

    pub accuracy: AccuracyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Active model artifact (JSON)
    pub path: PathBuf,

    /// Where superseded artifacts are moved on promotion
    pub archive_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Sales history CSV used for lag and rolling features
    pub history_path: PathBuf,

    /// Append-only accuracy log (JSON)
    pub metrics_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrainConfig {
    /// Trailing days held out for candidate evaluation
    pub holdout_days: u32,

    /// L2 penalty of the ridge trainer
    pub ridge_lambda: f64,

    /// Data used when degraded accuracy triggers a retrain on its own
    pub auto_data_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccuracyConfig {
    /// Evaluations averaged into the rolling aggregate
    pub window: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("PREPPAL_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("model.path", "models/active_model.json")?
            .set_default("model.archive_dir", "models/archive")?
            .set_default("data.history_path", "data/sales_history.csv")?
            .set_default("data.metrics_path", "data/model_metrics.jsonl")?
            .set_default("retrain.holdout_days", 30)?
            .set_default("retrain.ridge_lambda", 1.0)?
            .set_default("accuracy.window", 7)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PREPPAL_ prefix)
            .add_source(
                Environment::with_prefix("PREPPAL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for RetrainConfig {
    fn default() -> Self {
        Self {
            holdout_days: 30,
            ridge_lambda: 1.0,
            auto_data_path: None,
        }
    }
}

impl Default for AccuracyConfig {
    fn default() -> Self {
        Self { window: 7 }
    }
}
