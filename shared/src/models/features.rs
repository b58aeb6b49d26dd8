//! Feature vector contract shared by the forecast engine and every scorer
//!
//! The slot list and its order are fixed. A scorer trained against one layout
//! can only be swapped for another trained against the same layout.

use serde::{Deserialize, Serialize};

/// Logical group of a feature slot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGroup {
    Time,
    Cyclical,
    External,
    Item,
    Business,
    Lag,
    Rolling,
    Interaction,
}

/// One named slot of the feature vector
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSlot {
    DayOfWeek,
    Month,
    WeekOfYear,
    DayOfMonth,
    IsWeekend,
    IsMonday,
    IsFriday,
    IsSaturday,
    IsSunday,
    DaySin,
    DayCos,
    MonthSin,
    MonthCos,
    HolidayFlag,
    IsRainy,
    CategoryEncoded,
    PreparationComplexity,
    BusinessEncoded,
    Price,
    ShelfLifeHours,
    PrevDayDemand,
    PrevDaySold,
    PrevDayWaste,
    PrevWeekDemand,
    Rolling3DayDemand,
    Rolling7DayDemand,
    Rolling14DayDemand,
    Rolling30DayDemand,
    Rolling7DayStd,
    Rolling14DayStd,
    WeekendXHoliday,
    RainyXWeekend,
    RainyXHoliday,
    FridayXWeekend,
}

/// Number of slots in every feature vector
pub const FEATURE_COUNT: usize = 34;

/// Slot order of the feature vector
pub const FEATURE_SLOTS: [FeatureSlot; FEATURE_COUNT] = [
    FeatureSlot::DayOfWeek,
    FeatureSlot::Month,
    FeatureSlot::WeekOfYear,
    FeatureSlot::DayOfMonth,
    FeatureSlot::IsWeekend,
    FeatureSlot::IsMonday,
    FeatureSlot::IsFriday,
    FeatureSlot::IsSaturday,
    FeatureSlot::IsSunday,
    FeatureSlot::DaySin,
    FeatureSlot::DayCos,
    FeatureSlot::MonthSin,
    FeatureSlot::MonthCos,
    FeatureSlot::HolidayFlag,
    FeatureSlot::IsRainy,
    FeatureSlot::CategoryEncoded,
    FeatureSlot::PreparationComplexity,
    FeatureSlot::BusinessEncoded,
    FeatureSlot::Price,
    FeatureSlot::ShelfLifeHours,
    FeatureSlot::PrevDayDemand,
    FeatureSlot::PrevDaySold,
    FeatureSlot::PrevDayWaste,
    FeatureSlot::PrevWeekDemand,
    FeatureSlot::Rolling3DayDemand,
    FeatureSlot::Rolling7DayDemand,
    FeatureSlot::Rolling14DayDemand,
    FeatureSlot::Rolling30DayDemand,
    FeatureSlot::Rolling7DayStd,
    FeatureSlot::Rolling14DayStd,
    FeatureSlot::WeekendXHoliday,
    FeatureSlot::RainyXWeekend,
    FeatureSlot::RainyXHoliday,
    FeatureSlot::FridayXWeekend,
];

impl FeatureSlot {
    /// Position of this slot in the vector
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeatureSlot::DayOfWeek => "day_of_week",
            FeatureSlot::Month => "month",
            FeatureSlot::WeekOfYear => "week_of_year",
            FeatureSlot::DayOfMonth => "day_of_month",
            FeatureSlot::IsWeekend => "is_weekend",
            FeatureSlot::IsMonday => "is_monday",
            FeatureSlot::IsFriday => "is_friday",
            FeatureSlot::IsSaturday => "is_saturday",
            FeatureSlot::IsSunday => "is_sunday",
            FeatureSlot::DaySin => "day_sin",
            FeatureSlot::DayCos => "day_cos",
            FeatureSlot::MonthSin => "month_sin",
            FeatureSlot::MonthCos => "month_cos",
            FeatureSlot::HolidayFlag => "holiday_flag",
            FeatureSlot::IsRainy => "is_rainy",
            FeatureSlot::CategoryEncoded => "category_encoded",
            FeatureSlot::PreparationComplexity => "preparation_complexity",
            FeatureSlot::BusinessEncoded => "business_encoded",
            FeatureSlot::Price => "price",
            FeatureSlot::ShelfLifeHours => "shelf_life_hours",
            FeatureSlot::PrevDayDemand => "prev_day_demand",
            FeatureSlot::PrevDaySold => "prev_day_sold",
            FeatureSlot::PrevDayWaste => "prev_day_waste",
            FeatureSlot::PrevWeekDemand => "prev_week_demand",
            FeatureSlot::Rolling3DayDemand => "rolling_3day_demand",
            FeatureSlot::Rolling7DayDemand => "rolling_7day_demand",
            FeatureSlot::Rolling14DayDemand => "rolling_14day_demand",
            FeatureSlot::Rolling30DayDemand => "rolling_30day_demand",
            FeatureSlot::Rolling7DayStd => "rolling_7day_std",
            FeatureSlot::Rolling14DayStd => "rolling_14day_std",
            FeatureSlot::WeekendXHoliday => "weekend_x_holiday",
            FeatureSlot::RainyXWeekend => "rainy_x_weekend",
            FeatureSlot::RainyXHoliday => "rainy_x_holiday",
            FeatureSlot::FridayXWeekend => "friday_x_weekend",
        }
    }

    pub fn group(&self) -> FeatureGroup {
        use FeatureSlot::*;
        match self {
            DayOfWeek | Month | WeekOfYear | DayOfMonth | IsWeekend | IsMonday | IsFriday
            | IsSaturday | IsSunday => FeatureGroup::Time,
            DaySin | DayCos | MonthSin | MonthCos => FeatureGroup::Cyclical,
            HolidayFlag | IsRainy => FeatureGroup::External,
            CategoryEncoded | PreparationComplexity | Price | ShelfLifeHours => FeatureGroup::Item,
            BusinessEncoded => FeatureGroup::Business,
            PrevDayDemand | PrevDaySold | PrevDayWaste | PrevWeekDemand => FeatureGroup::Lag,
            Rolling3DayDemand | Rolling7DayDemand | Rolling14DayDemand | Rolling30DayDemand
            | Rolling7DayStd | Rolling14DayStd => FeatureGroup::Rolling,
            WeekendXHoliday | RainyXWeekend | RainyXHoliday | FridayXWeekend => {
                FeatureGroup::Interaction
            }
        }
    }

    /// Slots that depend on the item's own sales history
    pub fn is_history_dependent(&self) -> bool {
        matches!(self.group(), FeatureGroup::Lag | FeatureGroup::Rolling)
    }
}

/// Fixed-length ordered feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    /// All slots zeroed
    pub fn zeroed() -> Self {
        Self {
            values: vec![0.0; FEATURE_COUNT],
        }
    }

    /// Build from raw values; rejects any length other than [`FEATURE_COUNT`]
    pub fn from_values(values: Vec<f64>) -> Result<Self, FeatureLengthMismatch> {
        if values.len() != FEATURE_COUNT {
            return Err(FeatureLengthMismatch {
                expected: FEATURE_COUNT,
                actual: values.len(),
            });
        }
        Ok(Self { values })
    }

    pub fn get(&self, slot: FeatureSlot) -> f64 {
        self.values[slot.index()]
    }

    pub fn set(&mut self, slot: FeatureSlot, value: f64) {
        self.values[slot.index()] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Named view, mostly for logging and debugging
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_SLOTS
            .iter()
            .zip(self.values.iter())
            .map(|(slot, value)| (slot.name(), *value))
    }
}

/// A vector whose length differs from the feature contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("feature vector has {actual} slots, expected {expected}")]
pub struct FeatureLengthMismatch {
    pub expected: usize,
    pub actual: usize,
}
