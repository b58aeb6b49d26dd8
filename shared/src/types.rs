//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Business categories supported by the platform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BusinessType {
    Restaurant,
    Cafe,
    Bakery,
}

impl BusinessType {
    pub const ALL: [BusinessType; 3] = [
        BusinessType::Restaurant,
        BusinessType::Cafe,
        BusinessType::Bakery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessType::Restaurant => "Restaurant",
            BusinessType::Cafe => "Cafe",
            BusinessType::Bakery => "Bakery",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Restaurant" => Some(BusinessType::Restaurant),
            "Cafe" => Some(BusinessType::Cafe),
            "Bakery" => Some(BusinessType::Bakery),
            _ => None,
        }
    }

    /// Label encoding used by the feature contract (alphabetical order)
    pub fn encoded(&self) -> f64 {
        match self {
            BusinessType::Bakery => 0.0,
            BusinessType::Cafe => 1.0,
            BusinessType::Restaurant => 2.0,
        }
    }
}

impl std::fmt::Display for BusinessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weather condition supplied with a forecast request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum WeatherCondition {
    #[default]
    Clear,
    Rainy,
}

impl WeatherCondition {
    pub fn is_rainy(&self) -> bool {
        matches!(self, WeatherCondition::Rainy)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Clear" => Some(WeatherCondition::Clear),
            "Rainy" => Some(WeatherCondition::Rainy),
            _ => None,
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherCondition::Clear => f.write_str("Clear"),
            WeatherCondition::Rainy => f.write_str("Rainy"),
        }
    }
}

/// Key identifying one menu item of one business category
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub business_type: BusinessType,
    pub item_name: String,
}

impl ItemKey {
    pub fn new(business_type: BusinessType, item_name: impl Into<String>) -> Self {
        Self {
            business_type,
            item_name: item_name.into(),
        }
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.item_name, self.business_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_encoding_is_alphabetical() {
        assert_eq!(BusinessType::Bakery.encoded(), 0.0);
        assert_eq!(BusinessType::Cafe.encoded(), 1.0);
        assert_eq!(BusinessType::Restaurant.encoded(), 2.0);
    }

    #[test]
    fn item_key_is_case_sensitive() {
        let a = ItemKey::new(BusinessType::Cafe, "Latte");
        let b = ItemKey::new(BusinessType::Cafe, "latte");
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "Latte::Cafe");
    }

    #[test]
    fn weather_defaults_to_clear() {
        assert_eq!(WeatherCondition::default(), WeatherCondition::Clear);
        assert!(WeatherCondition::Rainy.is_rainy());
    }
}
