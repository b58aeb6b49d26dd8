//! Waste-risk classification of a production plan

use serde::{Deserialize, Serialize};

use super::round_to;

/// Waste risk tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::High => f.write_str("HIGH"),
            RiskLevel::Medium => f.write_str("MEDIUM"),
            RiskLevel::Low => f.write_str("LOW"),
        }
    }
}

/// Dashboard color tag for a risk tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    Red,
    Yellow,
    Green,
}

/// Waste risk of producing `planned_quantity` against a demand forecast
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    /// Negative when the plan is below demand
    pub waste_percentage: f64,
    pub expected_waste: u32,
    pub message: String,
    pub color: RiskColor,
}

/// A row of the risk table: matches when `waste_percentage > above`
/// (or `>=` when `inclusive`)
struct RiskBand {
    above: f64,
    inclusive: bool,
    level: RiskLevel,
    color: RiskColor,
    message: &'static str,
}

/// Evaluated top-down; the last row catches everything below 5%
const RISK_TABLE: [RiskBand; 3] = [
    RiskBand {
        above: 15.0,
        inclusive: false,
        level: RiskLevel::High,
        color: RiskColor::Red,
        message: "High waste risk - reduce quantity.",
    },
    RiskBand {
        above: 5.0,
        inclusive: true,
        level: RiskLevel::Medium,
        color: RiskColor::Yellow,
        message: "Moderate waste risk - consider reducing.",
    },
    RiskBand {
        above: f64::NEG_INFINITY,
        inclusive: true,
        level: RiskLevel::Low,
        color: RiskColor::Green,
        message: "Good planning - minimal waste expected.",
    },
];

const NO_PRODUCTION_MESSAGE: &str = "No production planned.";

impl RiskBand {
    fn matches(&self, waste_percentage: f64) -> bool {
        if self.inclusive {
            waste_percentage >= self.above
        } else {
            waste_percentage > self.above
        }
    }
}

/// Classify the waste risk of a production plan
pub fn classify_waste_risk(predicted_demand: u32, planned_quantity: u32) -> RiskAssessment {
    if planned_quantity == 0 {
        return RiskAssessment {
            risk_level: RiskLevel::Low,
            waste_percentage: 0.0,
            expected_waste: 0,
            message: NO_PRODUCTION_MESSAGE.to_string(),
            color: RiskColor::Green,
        };
    }

    let planned = f64::from(planned_quantity);
    let waste_percentage = (planned - f64::from(predicted_demand)) * 100.0 / planned;
    let band = RISK_TABLE
        .iter()
        .find(|band| band.matches(waste_percentage))
        .unwrap_or(&RISK_TABLE[RISK_TABLE.len() - 1]);

    RiskAssessment {
        risk_level: band.level,
        waste_percentage: round_to(waste_percentage, 2),
        expected_waste: planned_quantity.saturating_sub(predicted_demand),
        message: band.message.to_string(),
        color: band.color,
    }
}
