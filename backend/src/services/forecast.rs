//! Forecast engine: features -> score -> confidence, with cache fallback

use std::sync::Arc;

use shared::{
    confidence, explain_forecast, ForecastRequest, ForecastResult, Horizon, WeekConditions,
};

use crate::error::{AppError, AppResult};
use crate::services::fallback_cache::FallbackCache;
use crate::services::features::FeatureResolver;
use crate::services::history::HistoryHandle;
use crate::services::scorer::{ScoreError, ScorerAdapter};

/// Produces single-day and weekly forecasts.
///
/// The only place a `ModelUnavailable` score failure is caught: it becomes a
/// fallback result. Every other failure is returned as an error.
#[derive(Clone)]
pub struct ForecastEngine {
    resolver: FeatureResolver,
    scorer: Arc<ScorerAdapter>,
    cache: FallbackCache,
    history: Arc<HistoryHandle>,
}

impl ForecastEngine {
    pub fn new(scorer: Arc<ScorerAdapter>, cache: FallbackCache, history: Arc<HistoryHandle>) -> Self {
        Self {
            resolver: FeatureResolver::new(),
            scorer,
            cache,
            history,
        }
    }

    /// Forecast the request's own date
    pub fn forecast(&self, request: &ForecastRequest) -> AppResult<ForecastResult> {
        self.forecast_at(request, Horizon::NEXT_DAY)
    }

    /// Forecast seven consecutive days starting at the request's date.
    ///
    /// Days are independent: each has its own conditions, confidence and
    /// fallback status.
    pub fn forecast_week(
        &self,
        request: &ForecastRequest,
        week: &WeekConditions,
    ) -> AppResult<Vec<ForecastResult>> {
        Horizon::week()
            .zip(week.iter())
            .map(|(horizon, conditions)| {
                self.forecast_at(&request.for_day(horizon, *conditions), horizon)
            })
            .collect()
    }

    fn forecast_at(&self, request: &ForecastRequest, horizon: Horizon) -> AppResult<ForecastResult> {
        let history = self.history.snapshot();
        let resolved = self.resolver.resolve(request, &history)?;

        let estimate = match self.scorer.score(&resolved.vector) {
            Ok(estimate) => estimate,
            Err(ScoreError::ModelUnavailable(reason)) => {
                tracing::warn!(
                    "Serving fallback for {} on {}: {}",
                    request.key(),
                    request.date,
                    reason
                );
                return Ok(self.cache.fallback(request, horizon, resolved.cold_start));
            }
            Err(err) => {
                let err = AppError::from(err);
                tracing::error!("Scoring {} failed: {}", request.key(), err);
                return Err(err);
            }
        };

        let predicted_demand = demand_units(estimate)?;
        let result = ForecastResult::scored(
            request,
            horizon,
            predicted_demand,
            confidence(horizon, resolved.cold_start),
            resolved.cold_start,
            explain_forecast(request, resolved.rolling_7day_demand()),
        );
        self.cache.record(request.key(), &result);
        Ok(result)
    }
}

/// Round a raw estimate to whole units; negative estimates mean no demand
fn demand_units(estimate: f64) -> AppResult<u32> {
    if !estimate.is_finite() {
        return Err(AppError::InternalInvariant(format!(
            "non-finite demand estimate {}",
            estimate
        )));
    }
    Ok(estimate.max(0.0).round().min(f64::from(u32::MAX)) as u32)
}
