//! Forecast serving and model-health services for PrepPal

pub mod accuracy;
pub mod fallback_cache;
pub mod features;
pub mod forecast;
pub mod history;
pub mod model_store;
pub mod retrain;
pub mod scorer;
pub mod trainer;

pub use accuracy::{AccuracyLog, AccuracyMonitor, JsonLinesAccuracyLog, MemoryAccuracyLog};
pub use fallback_cache::{CacheEntry, FallbackCache, ForecastStore, MemoryForecastStore};
pub use features::{FeatureResolver, ResolvedFeatures};
pub use forecast::ForecastEngine;
pub use history::{HistoryHandle, SalesHistory};
pub use model_store::ModelStore;
pub use retrain::{RetrainOrchestrator, RetrainSettings, MAX_SETTLED_JOBS};
pub use scorer::{LinearModel, ModelHealth, ScoreError, Scorer, ScorerAdapter, ScorerStatus};
pub use trainer::{RidgeTrainer, TrainingSet};
