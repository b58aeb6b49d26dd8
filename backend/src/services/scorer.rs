//! Scorer contract, the linear model implementing it, and the adapter that
//! owns the active model

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{FeatureLengthMismatch, FeatureVector, FEATURE_COUNT, FEATURE_SLOTS};

use crate::services::model_store::ModelStore;

/// Failure to score a feature vector
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error(transparent)]
    FeatureCount(#[from] FeatureLengthMismatch),

    #[error("scorer produced a non-finite estimate")]
    NonFinite,
}

/// Anything that turns a feature vector into a demand estimate
pub trait Scorer: Send + Sync {
    fn score(&self, features: &FeatureVector) -> Result<f64, ScoreError>;

    /// Short human-readable identity, for health output and logs
    fn describe(&self) -> String;
}

/// Standardized linear regression over the feature contract
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearModel {
    pub version: String,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    /// Check that the artifact matches the current feature contract
    pub fn validate(&self) -> Result<(), FeatureLengthMismatch> {
        for len in [
            self.feature_names.len(),
            self.means.len(),
            self.scales.len(),
            self.coefficients.len(),
        ] {
            if len != FEATURE_COUNT {
                return Err(FeatureLengthMismatch {
                    expected: FEATURE_COUNT,
                    actual: len,
                });
            }
        }
        Ok(())
    }

    /// Slot names in contract order
    pub fn contract_feature_names() -> Vec<String> {
        FEATURE_SLOTS.iter().map(|s| s.name().to_string()).collect()
    }
}

impl Scorer for LinearModel {
    fn score(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        if features.len() != self.coefficients.len() {
            return Err(ScoreError::FeatureCount(FeatureLengthMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            }));
        }
        let mut estimate = self.intercept;
        for (i, x) in features.as_slice().iter().enumerate() {
            let scale = if self.scales[i] > 0.0 { self.scales[i] } else { 1.0 };
            estimate += self.coefficients[i] * (x - self.means[i]) / scale;
        }
        if !estimate.is_finite() {
            return Err(ScoreError::NonFinite);
        }
        Ok(estimate)
    }

    fn describe(&self) -> String {
        format!("linear model {}", self.version)
    }
}

/// Health of the scorer adapter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelHealth {
    /// A model is loaded and the last reload succeeded
    Healthy,
    /// A model is loaded but the last reload attempt failed
    Degraded,
    /// No usable model
    Error,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScorerStatus {
    pub health: ModelHealth,
    pub model_loaded: bool,
    pub model_reference: Option<String>,
    pub model: Option<String>,
    pub error: Option<String>,
}

struct ActiveModel {
    reference: PathBuf,
    scorer: Arc<dyn Scorer>,
}

#[derive(Default)]
struct AdapterState {
    active: Option<Arc<ActiveModel>>,
    last_error: Option<String>,
}

/// Owns exactly one active model and swaps it atomically on reload.
///
/// Scoring clones the active `Arc` under a short read lock and scores
/// outside it, so a concurrent reload never affects an in-flight call.
#[derive(Default)]
pub struct ScorerAdapter {
    state: RwLock<AdapterState>,
}

impl ScorerAdapter {
    /// An adapter with no model; every score fails until a reload succeeds
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_scorer(reference: impl Into<PathBuf>, scorer: Arc<dyn Scorer>) -> Self {
        let adapter = Self::empty();
        adapter.install(reference.into(), scorer);
        adapter
    }

    /// Load the active model from `store`, recording a failure instead of returning it
    pub fn from_store(store: &ModelStore, reference: &Path) -> Self {
        let adapter = Self::empty();
        if let Err(err) = adapter.reload(store, reference) {
            tracing::warn!("Starting without a model: {}", err);
        }
        adapter
    }

    pub fn score(&self, features: &FeatureVector) -> Result<f64, ScoreError> {
        let active = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            match &state.active {
                Some(active) => Arc::clone(active),
                None => {
                    let reason = state
                        .last_error
                        .clone()
                        .unwrap_or_else(|| "no model loaded".to_string());
                    return Err(ScoreError::ModelUnavailable(reason));
                }
            }
        };
        active.scorer.score(features)
    }

    /// Load `reference` through `store` and make it the active model.
    ///
    /// On failure the previous model (if any) stays active.
    pub fn reload(&self, store: &ModelStore, reference: &Path) -> Result<(), ScoreError> {
        match store.load(reference) {
            Ok(model) => {
                tracing::info!("Loaded {} from {}", model.describe(), reference.display());
                self.install(reference.to_path_buf(), Arc::new(model));
                Ok(())
            }
            Err(err) => {
                let message = format!("{}: {}", reference.display(), err);
                tracing::error!("Model reload failed: {}", message);
                self.state
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .last_error = Some(message.clone());
                Err(ScoreError::ModelUnavailable(message))
            }
        }
    }

    /// Swap in an already-built scorer
    pub fn install(&self, reference: PathBuf, scorer: Arc<dyn Scorer>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.active = Some(Arc::new(ActiveModel { reference, scorer }));
        state.last_error = None;
    }

    /// Drop the active model, e.g. when its artifact turns out to be corrupt
    pub fn unload(&self, reason: impl Into<String>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.active = None;
        state.last_error = Some(reason.into());
    }

    pub fn active_reference(&self) -> Option<PathBuf> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.active.as_ref().map(|a| a.reference.clone())
    }

    /// The active scorer itself, for evaluation on held-out data
    pub fn active_scorer(&self) -> Option<Arc<dyn Scorer>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.active.as_ref().map(|a| Arc::clone(&a.scorer))
    }

    pub fn health(&self) -> ModelHealth {
        self.status().health
    }

    pub fn status(&self) -> ScorerStatus {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let health = match (&state.active, &state.last_error) {
            (None, _) => ModelHealth::Error,
            (Some(_), Some(_)) => ModelHealth::Degraded,
            (Some(_), None) => ModelHealth::Healthy,
        };
        ScorerStatus {
            health,
            model_loaded: state.active.is_some(),
            model_reference: state
                .active
                .as_ref()
                .map(|a| a.reference.display().to_string()),
            model: state.active.as_ref().map(|a| a.scorer.describe()),
            error: state.last_error.clone(),
        }
    }
}
