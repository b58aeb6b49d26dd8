//! Production quantity recommendation

use serde::{Serialize, Serializer};

/// Upward adjustment applied to a demand estimate to get a production quantity
pub const SAFETY_BUFFER: f64 = 1.05;

/// Plans within this many units of the recommendation are left alone
pub const DEAD_ZONE_UNITS: i64 = 5;

/// Demand estimate with the safety buffer applied, rounded to whole units
pub fn buffered_quantity(predicted_demand: u32) -> u32 {
    (f64::from(predicted_demand) * SAFETY_BUFFER).round() as u32
}

/// What to do with the current production plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Reduce(u32),
    Increase(u32),
    Maintain,
}

impl std::fmt::Display for PlanAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanAction::Reduce(units) => write!(f, "REDUCE by {} units", units),
            PlanAction::Increase(units) => write!(f, "INCREASE by {} units", units),
            PlanAction::Maintain => f.write_str("MAINTAIN current plan"),
        }
    }
}

impl Serialize for PlanAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Recommended adjustment to a production plan
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub recommended_quantity: u32,
    pub action: PlanAction,
    pub reason: String,
    pub explanation: String,
}

/// Recommend a production quantity for `predicted_demand` given the current plan
pub fn recommend(predicted_demand: u32, current_plan: u32) -> Recommendation {
    let recommended_quantity = buffered_quantity(predicted_demand);
    let difference = i64::from(recommended_quantity) - i64::from(current_plan);

    let (action, reason) = if difference < -DEAD_ZONE_UNITS {
        (
            PlanAction::Reduce(difference.unsigned_abs() as u32),
            "Current plan exceeds predicted demand - reducing avoids waste.",
        )
    } else if difference > DEAD_ZONE_UNITS {
        (
            PlanAction::Increase(difference as u32),
            "Current plan is below predicted demand - increasing avoids stockouts.",
        )
    } else {
        (
            PlanAction::Maintain,
            "Current plan is within the optimal range.",
        )
    };

    Recommendation {
        recommended_quantity,
        action,
        reason: reason.to_string(),
        explanation: format!(
            "Predicted demand: {} units. With 5% safety buffer → recommend {} units.",
            predicted_demand, recommended_quantity
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_when_plan_far_above() {
        let r = recommend(40, 55);
        assert_eq!(r.recommended_quantity, 42);
        assert_eq!(r.action, PlanAction::Reduce(13));
        assert_eq!(r.action.to_string(), "REDUCE by 13 units");
    }

    #[test]
    fn maintain_inside_dead_zone() {
        assert_eq!(recommend(40, 40).action, PlanAction::Maintain);
        assert_eq!(recommend(40, 42).action, PlanAction::Maintain);
        // difference of exactly 5 either way still maintains
        assert_eq!(recommend(40, 37).action, PlanAction::Maintain);
        assert_eq!(recommend(40, 47).action, PlanAction::Maintain);
    }

    #[test]
    fn increase_when_plan_far_below() {
        let r = recommend(50, 35);
        assert_eq!(r.recommended_quantity, 53);
        assert_eq!(r.action, PlanAction::Increase(18));
    }

    #[test]
    fn buffer_rounds_to_nearest() {
        assert_eq!(buffered_quantity(0), 0);
        assert_eq!(buffered_quantity(40), 42);
        assert_eq!(buffered_quantity(100), 105);
        assert_eq!(buffered_quantity(9), 9);
    }

    #[test]
    fn action_serializes_as_directive() {
        let json = serde_json::to_value(recommend(40, 55)).unwrap();
        assert_eq!(json["action"], "REDUCE by 13 units");
        assert_eq!(json["recommended_quantity"], 42);
    }
}
