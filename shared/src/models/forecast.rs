//! Forecast request and result models

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize, Serializer};

use crate::models::confidence::{Confidence, ConfidenceTier, Horizon};
use crate::types::{BusinessType, ItemKey, WeatherCondition};

/// A single-item, single-day demand forecast request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastRequest {
    /// Case-sensitive menu item name
    pub item_name: String,
    pub business_type: BusinessType,
    pub date: NaiveDate,
    pub price: f64,
    pub shelf_life_hours: f64,
    #[serde(default)]
    pub weather: WeatherCondition,
    #[serde(default)]
    pub is_holiday: bool,
}

impl ForecastRequest {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.business_type, self.item_name.clone())
    }

    /// The request for one day of a weekly forecast starting at `self.date`
    pub fn for_day(&self, horizon: Horizon, conditions: DayConditions) -> ForecastRequest {
        ForecastRequest {
            date: self.date + Duration::days(horizon.offset()),
            weather: conditions.weather,
            is_holiday: conditions.is_holiday,
            ..self.clone()
        }
    }
}

/// External conditions supplied for one day of a weekly forecast
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DayConditions {
    pub weather: WeatherCondition,
    pub is_holiday: bool,
}

/// Conditions for every day of a weekly forecast
pub type WeekConditions = [DayConditions; Horizon::MAX_DAYS as usize];

/// Why a forecast was served from the degraded path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The last successful forecast for the same item was returned
    LastValidForecast {
        computed_for: NaiveDate,
        requested: NaiveDate,
    },
    /// Nothing was cached for the item
    NoCachedForecast,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::LastValidForecast {
                computed_for,
                requested,
            } => {
                f.write_str("model unavailable — showing last valid forecast")?;
                if computed_for != requested {
                    write!(f, " (computed for {})", computed_for)?;
                }
                Ok(())
            }
            FallbackReason::NoCachedForecast => f.write_str("model unavailable, no cached forecast"),
        }
    }
}

impl Serialize for FallbackReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Forecast for one item on one day
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ForecastResult {
    pub date: NaiveDate,
    pub day_name: String,
    pub day_number: u8,
    /// `None` only when the model was unavailable and nothing was cached
    pub predicted_demand: Option<u32>,
    /// Absent (not zero) when there is no demand estimate to buffer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<ConfidenceTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    pub weather: WeatherCondition,
    pub is_holiday: bool,
    /// The item had no sales history of its own
    pub is_new_item: bool,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FallbackReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl ForecastResult {
    /// A freshly scored forecast
    pub fn scored(
        request: &ForecastRequest,
        horizon: Horizon,
        predicted_demand: u32,
        confidence: Confidence,
        cold_start: bool,
        explanation: String,
    ) -> Self {
        Self {
            date: request.date,
            day_name: day_name(request.date).to_string(),
            day_number: horizon.days(),
            predicted_demand: Some(predicted_demand),
            recommended_quantity: Some(crate::buffered_quantity(predicted_demand)),
            confidence: Some(confidence.tier),
            confidence_score: Some(confidence.score),
            weather: request.weather,
            is_holiday: request.is_holiday,
            is_new_item: cold_start,
            fallback: false,
            fallback_reason: None,
            explanation: Some(explanation),
        }
    }

    /// A fallback result with no estimate at all
    pub fn unavailable(request: &ForecastRequest, horizon: Horizon, cold_start: bool) -> Self {
        Self {
            date: request.date,
            day_name: day_name(request.date).to_string(),
            day_number: horizon.days(),
            predicted_demand: None,
            recommended_quantity: None,
            confidence: None,
            confidence_score: None,
            weather: request.weather,
            is_holiday: request.is_holiday,
            is_new_item: cold_start,
            fallback: true,
            fallback_reason: Some(FallbackReason::NoCachedForecast),
            explanation: None,
        }
    }

    /// Mark a previously cached result as served from the fallback path
    pub fn into_fallback(mut self, reason: FallbackReason) -> Self {
        self.fallback = true;
        self.fallback_reason = Some(reason);
        self
    }
}

pub fn day_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Short human-readable list of the main demand drivers for a day
pub fn explain_forecast(request: &ForecastRequest, rolling_7day_demand: f64) -> String {
    let mut factors = Vec::with_capacity(4);
    let weekend = matches!(request.date.weekday(), Weekday::Sat | Weekday::Sun);
    if weekend && request.business_type != BusinessType::Cafe {
        factors.push("weekend uplift".to_string());
    }
    if weekend && request.business_type == BusinessType::Cafe {
        factors.push("weekend drop".to_string());
    }
    if request.is_holiday {
        factors.push("holiday effect".to_string());
    }
    if request.weather.is_rainy() {
        factors.push("rainy weather".to_string());
    }
    factors.push(format!("7-day avg ({:.0})", rolling_7day_demand));
    factors.truncate(3);
    format!("Based on: {}", factors.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(date: &str, business_type: BusinessType) -> ForecastRequest {
        ForecastRequest {
            item_name: "Jollof Rice".to_string(),
            business_type,
            date: date.parse().unwrap(),
            price: 50.0,
            shelf_life_hours: 4.0,
            weather: WeatherCondition::Clear,
            is_holiday: false,
        }
    }

    #[test]
    fn request_defaults_weather_and_holiday() {
        let json = r#"{"item_name":"Latte","business_type":"Cafe","date":"2025-12-01","price":25.0,"shelf_life_hours":0.5}"#;
        let req: ForecastRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.weather, WeatherCondition::Clear);
        assert!(!req.is_holiday);
    }

    #[test]
    fn for_day_shifts_date_and_conditions() {
        let base = request("2025-12-01", BusinessType::Restaurant);
        let day = base.for_day(
            Horizon::new(3).unwrap(),
            DayConditions {
                weather: WeatherCondition::Rainy,
                is_holiday: true,
            },
        );
        assert_eq!(day.date, "2025-12-03".parse::<NaiveDate>().unwrap());
        assert!(day.weather.is_rainy());
        assert!(day.is_holiday);
        assert_eq!(day.item_name, base.item_name);
    }

    #[test]
    fn fallback_reason_messages() {
        let d: NaiveDate = "2025-12-01".parse().unwrap();
        let same = FallbackReason::LastValidForecast {
            computed_for: d,
            requested: d,
        };
        assert_eq!(same.to_string(), "model unavailable — showing last valid forecast");
        let stale = FallbackReason::LastValidForecast {
            computed_for: d,
            requested: d + Duration::days(1),
        };
        assert!(stale.to_string().ends_with("(computed for 2025-12-01)"));
        assert_eq!(
            FallbackReason::NoCachedForecast.to_string(),
            "model unavailable, no cached forecast"
        );
    }

    #[test]
    fn unavailable_result_omits_recommended_quantity() {
        let req = request("2025-12-01", BusinessType::Restaurant);
        let result = ForecastResult::unavailable(&req, Horizon::NEXT_DAY, false);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("predicted_demand").unwrap().is_null());
        assert!(json.get("recommended_quantity").is_none());
        assert_eq!(json["fallback"], true);
        assert_eq!(json["fallback_reason"], "model unavailable, no cached forecast");
    }

    #[test]
    fn explanation_lists_weekend_effects() {
        // 2025-12-06 is a Saturday
        let mut req = request("2025-12-06", BusinessType::Cafe);
        req.weather = WeatherCondition::Rainy;
        assert_eq!(
            explain_forecast(&req, 41.6),
            "Based on: weekend drop, rainy weather, 7-day avg (42)"
        );

        let mut req = request("2025-12-06", BusinessType::Restaurant);
        req.is_holiday = true;
        req.weather = WeatherCondition::Rainy;
        assert_eq!(
            explain_forecast(&req, 40.0),
            "Based on: weekend uplift, holiday effect, rainy weather"
        );
    }
}
