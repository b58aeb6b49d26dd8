//! Tests for waste-risk alerts and production recommendations

use proptest::prelude::*;
use shared::{
    buffered_quantity, classify_waste_risk, recommend, PlanAction, RiskColor, RiskLevel,
};

// ============================================================================
// Waste Risk
// ============================================================================

mod waste_risk {
    use super::*;

    #[test]
    fn bands_follow_waste_percentage() {
        // 20% waste
        let high = classify_waste_risk(40, 50);
        assert_eq!(high.risk_level, RiskLevel::High);
        assert_eq!(high.color, RiskColor::Red);
        assert_eq!(high.expected_waste, 10);

        // 10% waste
        let medium = classify_waste_risk(45, 50);
        assert_eq!(medium.risk_level, RiskLevel::Medium);
        assert_eq!(medium.color, RiskColor::Yellow);

        // 2% waste
        let low = classify_waste_risk(49, 50);
        assert_eq!(low.risk_level, RiskLevel::Low);
        assert_eq!(low.color, RiskColor::Green);
    }

    #[test]
    fn percentage_is_rounded_to_two_places() {
        let r = classify_waste_risk(2, 3);
        assert_eq!(r.waste_percentage, 33.33);
    }

    #[test]
    fn nothing_planned_is_low_risk() {
        let r = classify_waste_risk(0, 0);
        assert_eq!(r.risk_level, RiskLevel::Low);
        assert_eq!(r.expected_waste, 0);
    }
}

// ============================================================================
// Recommendations
// ============================================================================

mod recommendations {
    use super::*;

    #[test]
    fn directive_text() {
        assert_eq!(recommend(50, 35).action.to_string(), "INCREASE by 18 units");
        assert_eq!(recommend(40, 42).action.to_string(), "MAINTAIN current plan");
    }

    #[test]
    fn explanation_mentions_buffer() {
        let r = recommend(40, 0);
        assert_eq!(r.recommended_quantity, 42);
        assert!(r.explanation.contains("5% safety buffer"));
        assert_eq!(r.action, PlanAction::Increase(42));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Expected waste is never negative and never exceeds the plan
        #[test]
        fn prop_expected_waste_bounded(demand in 0u32..10_000, planned in 0u32..10_000) {
            let r = classify_waste_risk(demand, planned);
            prop_assert!(r.expected_waste <= planned);
            prop_assert_eq!(r.expected_waste, planned.saturating_sub(demand));
        }

        /// Producing at or below demand is never a waste risk
        #[test]
        fn prop_under_production_is_low(demand in 0u32..10_000, shortfall in 0u32..10_000) {
            let planned = demand.saturating_sub(shortfall);
            prop_assert_eq!(classify_waste_risk(demand, planned).risk_level, RiskLevel::Low);
        }

        /// Risk never decreases as the plan grows beyond demand
        #[test]
        fn prop_risk_monotone_in_plan(demand in 1u32..1_000, extra in 0u32..1_000) {
            let rank = |level: RiskLevel| match level {
                RiskLevel::Low => 0,
                RiskLevel::Medium => 1,
                RiskLevel::High => 2,
            };
            let smaller = classify_waste_risk(demand, demand + extra);
            let larger = classify_waste_risk(demand, demand + extra + 1);
            prop_assert!(rank(larger.risk_level) >= rank(smaller.risk_level));
        }

        /// Applying the recommendation always lands inside the dead zone
        #[test]
        fn prop_recommendation_is_stable(demand in 0u32..10_000, plan in 0u32..10_000) {
            let first = recommend(demand, plan);
            prop_assert_eq!(first.recommended_quantity, buffered_quantity(demand));
            let second = recommend(demand, first.recommended_quantity);
            prop_assert_eq!(second.action, PlanAction::Maintain);
        }

        /// The action moves the plan towards the recommendation
        #[test]
        fn prop_action_direction(demand in 0u32..10_000, plan in 0u32..10_000) {
            let r = recommend(demand, plan);
            match r.action {
                PlanAction::Reduce(units) => prop_assert_eq!(plan - units, r.recommended_quantity),
                PlanAction::Increase(units) => prop_assert_eq!(plan + units, r.recommended_quantity),
                PlanAction::Maintain => {
                    prop_assert!((i64::from(r.recommended_quantity) - i64::from(plan)).abs() <= 5)
                }
            }
        }
    }
}
