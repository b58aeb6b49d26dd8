//! Last-known-good forecast per item, served while the model is unavailable

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use shared::{FallbackReason, ForecastRequest, ForecastResult, Horizon, ItemKey};

/// The most recent successful forecast for one item
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub result: ForecastResult,
    pub computed_for: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Key-value store behind the fallback cache
pub trait ForecastStore: Send + Sync {
    fn get(&self, key: &ItemKey) -> Option<CacheEntry>;
    fn put(&self, key: ItemKey, entry: CacheEntry);
}

/// In-process store; last writer wins per key
#[derive(Debug, Default)]
pub struct MemoryForecastStore {
    entries: DashMap<ItemKey, CacheEntry>,
}

impl MemoryForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ForecastStore for MemoryForecastStore {
    fn get(&self, key: &ItemKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: ItemKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }
}

/// Sole owner of the forecast store; other services go through it
#[derive(Clone)]
pub struct FallbackCache {
    store: Arc<dyn ForecastStore>,
}

impl FallbackCache {
    pub fn new(store: Arc<dyn ForecastStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryForecastStore::new()))
    }

    /// Record a successful forecast, superseding any earlier entry for the item
    pub fn record(&self, key: ItemKey, result: &ForecastResult) {
        self.store.put(
            key,
            CacheEntry {
                computed_for: result.date,
                result: result.clone(),
                created_at: Utc::now(),
            },
        );
    }

    pub fn lookup(&self, key: &ItemKey) -> Option<CacheEntry> {
        self.store.get(key)
    }

    /// Degraded result for `request`: the cached forecast if any, otherwise
    /// a result with no estimate.
    pub fn fallback(&self, request: &ForecastRequest, horizon: Horizon, cold_start: bool) -> ForecastResult {
        match self.lookup(&request.key()) {
            Some(entry) => {
                let reason = FallbackReason::LastValidForecast {
                    computed_for: entry.computed_for,
                    requested: request.date,
                };
                entry.result.into_fallback(reason)
            }
            None => ForecastResult::unavailable(request, horizon, cold_start),
        }
    }
}

impl Default for FallbackCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{confidence, BusinessType, WeatherCondition};

    fn request(date: &str) -> ForecastRequest {
        ForecastRequest {
            item_name: "Croissant".to_string(),
            business_type: BusinessType::Bakery,
            date: date.parse().unwrap(),
            price: 15.0,
            shelf_life_hours: 24.0,
            weather: WeatherCondition::Clear,
            is_holiday: false,
        }
    }

    fn scored(req: &ForecastRequest, demand: u32) -> ForecastResult {
        ForecastResult::scored(
            req,
            Horizon::NEXT_DAY,
            demand,
            confidence(Horizon::NEXT_DAY, false),
            false,
            "Based on: 7-day avg (30)".to_string(),
        )
    }

    #[test]
    fn miss_has_no_estimate() {
        let cache = FallbackCache::in_memory();
        let result = cache.fallback(&request("2025-12-01"), Horizon::NEXT_DAY, false);
        assert!(result.fallback);
        assert_eq!(result.predicted_demand, None);
        assert_eq!(result.recommended_quantity, None);
        assert_eq!(result.fallback_reason, Some(FallbackReason::NoCachedForecast));
    }

    #[test]
    fn hit_returns_cached_result_flagged() {
        let cache = FallbackCache::in_memory();
        let req = request("2025-12-01");
        let fresh = scored(&req, 30);
        cache.record(req.key(), &fresh);

        let result = cache.fallback(&req, Horizon::NEXT_DAY, false);
        assert!(result.fallback);
        assert_eq!(result.predicted_demand, Some(30));
        assert_eq!(result.recommended_quantity, fresh.recommended_quantity);
        assert_eq!(
            result.fallback_reason.as_ref().map(|r| r.to_string()).as_deref(),
            Some("model unavailable — showing last valid forecast")
        );
    }

    #[test]
    fn stale_hit_names_the_original_date() {
        let cache = FallbackCache::in_memory();
        let old = request("2025-12-01");
        cache.record(old.key(), &scored(&old, 30));
        let result = cache.fallback(&request("2025-12-04"), Horizon::NEXT_DAY, false);
        assert!(result
            .fallback_reason
            .unwrap()
            .to_string()
            .ends_with("(computed for 2025-12-01)"));
    }

    #[test]
    fn last_writer_wins() {
        let cache = FallbackCache::in_memory();
        let req = request("2025-12-01");
        cache.record(req.key(), &scored(&req, 30));
        cache.record(req.key(), &scored(&req, 35));
        assert_eq!(cache.lookup(&req.key()).unwrap().result.predicted_demand, Some(35));
    }

    #[test]
    fn keys_are_per_business() {
        let cache = FallbackCache::in_memory();
        let req = request("2025-12-01");
        cache.record(req.key(), &scored(&req, 30));
        let mut other = req.clone();
        other.business_type = BusinessType::Cafe;
        assert!(cache.lookup(&other.key()).is_none());
    }
}
