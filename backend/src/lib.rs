//! PrepPal - demand forecasting backend for small food businesses
//!
//! Serves next-day and seven-day demand forecasts, waste-risk alerts and
//! production recommendations, and keeps the model fresh through accuracy
//! monitoring and background retraining.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

use services::{
    AccuracyMonitor, FallbackCache, ForecastEngine, HistoryHandle, JsonLinesAccuracyLog,
    ModelStore, RetrainOrchestrator, RetrainSettings, SalesHistory, ScorerAdapter,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: ForecastEngine,
    pub scorer: Arc<ScorerAdapter>,
    pub history: Arc<HistoryHandle>,
    pub monitor: AccuracyMonitor,
    pub retrain: RetrainOrchestrator,
}

impl AppState {
    /// Wire every service from configuration.
    ///
    /// A missing model or history file is not fatal: the service starts
    /// degraded and serves fallbacks until a retrain promotes a model.
    pub fn from_config(config: Config) -> AppResult<Self> {
        let history = if config.data.history_path.is_file() {
            services::history::load_sales_csv(&config.data.history_path)?
        } else {
            tracing::warn!(
                "Sales history {} not found, starting with an empty history",
                config.data.history_path.display()
            );
            SalesHistory::empty()
        };

        let store = ModelStore::new(config.model.archive_dir.clone());
        let scorer = Arc::new(ScorerAdapter::from_store(&store, &config.model.path));
        let monitor = AccuracyMonitor::new(
            Arc::new(JsonLinesAccuracyLog::new(config.data.metrics_path.clone())),
            config.accuracy.window,
        );

        Ok(Self::assemble(config, scorer, history, store, monitor))
    }

    /// Wire services around an already-built scorer and accuracy monitor
    pub fn assemble(
        config: Config,
        scorer: Arc<ScorerAdapter>,
        history: SalesHistory,
        store: ModelStore,
        monitor: AccuracyMonitor,
    ) -> Self {
        let history = Arc::new(HistoryHandle::new(history));
        let engine = ForecastEngine::new(
            Arc::clone(&scorer),
            FallbackCache::in_memory(),
            Arc::clone(&history),
        );
        let settings = RetrainSettings {
            holdout_days: config.retrain.holdout_days,
            ridge_lambda: config.retrain.ridge_lambda,
            active_model_path: config.model.path.clone(),
            auto_data_path: config.retrain.auto_data_path.clone(),
        };
        let retrain = RetrainOrchestrator::new(
            Arc::clone(&scorer),
            store,
            Arc::clone(&history),
            settings,
        );

        Self {
            config: Arc::new(config),
            engine,
            scorer,
            history,
            monitor,
            retrain,
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "PrepPal Demand Forecasting API"
}
