//! Route definitions for the PrepPal forecasting API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Forecasts
        .route("/predict", post(handlers::predict))
        .route("/predict-week", post(handlers::predict_week))
        // Planning
        .route("/risk-alert", post(handlers::risk_alert))
        .route("/recommend", post(handlers::recommend_quantity))
        // Accuracy monitoring
        .route("/accuracy", post(handlers::get_accuracy))
        .route("/accuracy/log", post(handlers::log_predictions))
        // Retraining
        .nest("/retrain", retrain_routes())
}

fn retrain_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::trigger_retrain))
        .route(
            "/:job_id",
            get(handlers::get_retrain_job).delete(handlers::abandon_retrain_job),
        )
}
