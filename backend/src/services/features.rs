//! Feature resolution: request + sales history -> feature vector
//!
//! Lag and rolling slots come from the item's own sales strictly before the
//! target date. Items without any such sales (cold start) get the mean of
//! those slots across the other items of the same business category, or
//! zeros when the category has no earlier sales either.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};
use shared::{item_profile, FeatureSlot, FeatureVector, ForecastRequest, SalesRecord};

use crate::error::{AppError, AppResult};
use crate::services::history::SalesHistory;

/// Observations feeding lag and rolling slots
pub const LOOKBACK_DAYS: usize = 30;

/// History-dependent slot values of one item on one day
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LagSummary {
    pub prev_day_demand: f64,
    pub prev_day_sold: f64,
    pub prev_day_waste: f64,
    pub prev_week_demand: f64,
    pub rolling_3day: f64,
    pub rolling_7day: f64,
    pub rolling_14day: f64,
    pub rolling_30day: f64,
    pub rolling_7day_std: f64,
    pub rolling_14day_std: f64,
}

impl LagSummary {
    /// Summarize the rows preceding a target day, oldest first.
    ///
    /// `None` when there are no rows.
    pub fn from_rows(rows: &[SalesRecord]) -> Option<Self> {
        let recent = &rows[rows.len().saturating_sub(LOOKBACK_DAYS)..];
        let last = recent.last()?;
        let demand: Vec<f64> = recent.iter().map(|r| r.customer_demand).collect();

        let rolling_7day = mean(tail(&demand, 7));
        let rolling_7day_std = sample_std(tail(&demand, 7));
        Some(Self {
            prev_day_demand: last.customer_demand,
            prev_day_sold: last.quantity_sold,
            prev_day_waste: last.waste_quantity,
            prev_week_demand: if demand.len() >= 7 {
                demand[demand.len() - 7]
            } else {
                last.customer_demand
            },
            rolling_3day: mean(tail(&demand, 3)),
            rolling_7day,
            rolling_14day: if demand.len() >= 14 {
                mean(tail(&demand, 14))
            } else {
                rolling_7day
            },
            rolling_30day: if demand.len() >= 30 {
                mean(tail(&demand, 30))
            } else {
                rolling_7day
            },
            rolling_7day_std,
            rolling_14day_std: if demand.len() >= 14 {
                sample_std(tail(&demand, 14))
            } else {
                rolling_7day_std
            },
        })
    }

    /// Slot-wise mean of several summaries
    pub fn mean_of(summaries: &[LagSummary]) -> Option<Self> {
        if summaries.is_empty() {
            return None;
        }
        let n = summaries.len() as f64;
        let avg = |f: fn(&LagSummary) -> f64| summaries.iter().map(f).sum::<f64>() / n;
        Some(Self {
            prev_day_demand: avg(|s| s.prev_day_demand),
            prev_day_sold: avg(|s| s.prev_day_sold),
            prev_day_waste: avg(|s| s.prev_day_waste),
            prev_week_demand: avg(|s| s.prev_week_demand),
            rolling_3day: avg(|s| s.rolling_3day),
            rolling_7day: avg(|s| s.rolling_7day),
            rolling_14day: avg(|s| s.rolling_14day),
            rolling_30day: avg(|s| s.rolling_30day),
            rolling_7day_std: avg(|s| s.rolling_7day_std),
            rolling_14day_std: avg(|s| s.rolling_14day_std),
        })
    }

    fn slots(&self) -> [(FeatureSlot, f64); 10] {
        [
            (FeatureSlot::PrevDayDemand, self.prev_day_demand),
            (FeatureSlot::PrevDaySold, self.prev_day_sold),
            (FeatureSlot::PrevDayWaste, self.prev_day_waste),
            (FeatureSlot::PrevWeekDemand, self.prev_week_demand),
            (FeatureSlot::Rolling3DayDemand, self.rolling_3day),
            (FeatureSlot::Rolling7DayDemand, self.rolling_7day),
            (FeatureSlot::Rolling14DayDemand, self.rolling_14day),
            (FeatureSlot::Rolling30DayDemand, self.rolling_30day),
            (FeatureSlot::Rolling7DayStd, self.rolling_7day_std),
            (FeatureSlot::Rolling14DayStd, self.rolling_14day_std),
        ]
    }
}

fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Build the full feature vector for a request given its history summary
pub fn compose(request: &ForecastRequest, lags: &LagSummary) -> FeatureVector {
    let mut v = FeatureVector::zeroed();
    let date = request.date;
    let dow = f64::from(date.weekday().num_days_from_monday());
    let month = f64::from(date.month());
    let flag = |b: bool| if b { 1.0 } else { 0.0 };

    let is_weekend = flag(dow >= 5.0);
    let is_friday = flag(dow == 4.0);
    let is_rainy = flag(request.weather.is_rainy());
    let holiday = flag(request.is_holiday);

    v.set(FeatureSlot::DayOfWeek, dow);
    v.set(FeatureSlot::Month, month);
    v.set(FeatureSlot::WeekOfYear, f64::from(date.iso_week().week()));
    v.set(FeatureSlot::DayOfMonth, f64::from(date.day()));
    v.set(FeatureSlot::IsWeekend, is_weekend);
    v.set(FeatureSlot::IsMonday, flag(dow == 0.0));
    v.set(FeatureSlot::IsFriday, is_friday);
    v.set(FeatureSlot::IsSaturday, flag(dow == 5.0));
    v.set(FeatureSlot::IsSunday, flag(dow == 6.0));

    v.set(FeatureSlot::DaySin, (2.0 * PI * dow / 7.0).sin());
    v.set(FeatureSlot::DayCos, (2.0 * PI * dow / 7.0).cos());
    v.set(FeatureSlot::MonthSin, (2.0 * PI * month / 12.0).sin());
    v.set(FeatureSlot::MonthCos, (2.0 * PI * month / 12.0).cos());

    v.set(FeatureSlot::HolidayFlag, holiday);
    v.set(FeatureSlot::IsRainy, is_rainy);

    let profile = item_profile(&request.item_name, request.price, request.shelf_life_hours);
    v.set(FeatureSlot::CategoryEncoded, profile.category.encoded());
    v.set(
        FeatureSlot::PreparationComplexity,
        f64::from(profile.preparation_complexity),
    );
    v.set(FeatureSlot::BusinessEncoded, request.business_type.encoded());
    v.set(FeatureSlot::Price, request.price);
    v.set(FeatureSlot::ShelfLifeHours, request.shelf_life_hours);

    for (slot, value) in lags.slots() {
        v.set(slot, value);
    }

    v.set(FeatureSlot::WeekendXHoliday, is_weekend * holiday);
    v.set(FeatureSlot::RainyXWeekend, is_rainy * is_weekend);
    v.set(FeatureSlot::RainyXHoliday, is_rainy * holiday);
    // always zero: Friday is never a weekend day, kept for layout compatibility
    v.set(FeatureSlot::FridayXWeekend, is_friday * is_weekend);
    v
}

/// A resolved feature vector and how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFeatures {
    pub vector: FeatureVector,
    /// Lag and rolling slots were taken from business-wide averages
    pub cold_start: bool,
}

impl ResolvedFeatures {
    pub fn rolling_7day_demand(&self) -> f64 {
        self.vector.get(FeatureSlot::Rolling7DayDemand)
    }
}

/// Builds feature vectors from requests against a history snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureResolver;

impl FeatureResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the feature vector of `request`.
    ///
    /// Fails only on corrupt demand, sold or waste values in the lookback.
    /// Unseen items and unseen business categories resolve as cold starts.
    pub fn resolve(
        &self,
        request: &ForecastRequest,
        history: &SalesHistory,
    ) -> AppResult<ResolvedFeatures> {
        let own = history.before(&request.key(), request.date);
        check_rows(own)?;
        if let Some(lags) = LagSummary::from_rows(own) {
            return Ok(ResolvedFeatures {
                vector: compose(request, &lags),
                cold_start: false,
            });
        }

        let lags = self.business_average(request, history)?;
        tracing::debug!(
            "Cold-start item {} resolved from {} averages",
            request.item_name,
            request.business_type
        );
        Ok(ResolvedFeatures {
            vector: compose(request, &lags),
            cold_start: true,
        })
    }

    fn business_average(
        &self,
        request: &ForecastRequest,
        history: &SalesHistory,
    ) -> AppResult<LagSummary> {
        let mut summaries = Vec::new();
        for (_, rows) in history.business_series(request.business_type) {
            let prior = before_date(rows, request.date);
            check_rows(prior)?;
            summaries.extend(LagSummary::from_rows(prior));
        }
        // no earlier sales anywhere in the category
        Ok(LagSummary::mean_of(&summaries).unwrap_or_default())
    }
}

fn before_date(rows: &[SalesRecord], date: NaiveDate) -> &[SalesRecord] {
    &rows[..rows.partition_point(|r| r.date < date)]
}

fn check_rows(rows: &[SalesRecord]) -> AppResult<()> {
    let recent = &rows[rows.len().saturating_sub(LOOKBACK_DAYS)..];
    for row in recent {
        let values = [row.customer_demand, row.quantity_sold, row.waste_quantity];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AppError::UnresolvableFeature(format!(
                "corrupt sales row for {} on {}",
                row.item_name, row.date
            )));
        }
    }
    Ok(())
}
