//! Historical daily sales rows

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::forecast::ForecastRequest;
use crate::types::{BusinessType, ItemKey, WeatherCondition};

/// Columns every sales upload must carry
pub const REQUIRED_SALES_COLUMNS: [&str; 10] = [
    "date",
    "item_name",
    "business_type",
    "customer_demand",
    "quantity_sold",
    "waste_quantity",
    "price",
    "shelf_life_hours",
    "weather_condition",
    "holiday_flag",
];

/// One item's sales on one day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub item_name: String,
    pub business_type: BusinessType,
    pub customer_demand: f64,
    pub quantity_sold: f64,
    #[serde(default)]
    pub quantity_available: Option<f64>,
    pub waste_quantity: f64,
    pub price: f64,
    pub shelf_life_hours: f64,
    pub weather_condition: WeatherCondition,
    /// 0 or 1
    pub holiday_flag: u8,
}

impl SalesRecord {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.business_type, self.item_name.clone())
    }

    pub fn is_holiday(&self) -> bool {
        self.holiday_flag == 1
    }

    /// The forecast request that this row answers
    pub fn as_request(&self) -> ForecastRequest {
        ForecastRequest {
            item_name: self.item_name.clone(),
            business_type: self.business_type,
            date: self.date,
            price: self.price,
            shelf_life_hours: self.shelf_life_hours,
            weather: self.weather_condition,
            is_holiday: self.is_holiday(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_maps_to_request() {
        let row = SalesRecord {
            date: "2025-03-14".parse().unwrap(),
            item_name: "Croissant".to_string(),
            business_type: BusinessType::Bakery,
            customer_demand: 31.0,
            quantity_sold: 30.0,
            quantity_available: Some(35.0),
            waste_quantity: 5.0,
            price: 15.0,
            shelf_life_hours: 24.0,
            weather_condition: WeatherCondition::Rainy,
            holiday_flag: 1,
        };
        let req = row.as_request();
        assert!(req.is_holiday);
        assert!(req.weather.is_rainy());
        assert_eq!(req.key(), row.key());
    }
}
