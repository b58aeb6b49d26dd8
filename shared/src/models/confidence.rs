//! Forecast confidence as a step function of horizon and cold-start status

use serde::{Deserialize, Serialize};

/// Number of days ahead being forecast, always within `1..=7`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Horizon(u8);

impl Horizon {
    pub const MAX_DAYS: u8 = 7;
    pub const NEXT_DAY: Horizon = Horizon(1);

    pub fn new(days: u8) -> Option<Self> {
        (1..=Self::MAX_DAYS).contains(&days).then_some(Self(days))
    }

    pub fn days(&self) -> u8 {
        self.0
    }

    /// Offset from the first forecast date
    pub fn offset(&self) -> i64 {
        i64::from(self.0) - 1
    }

    /// Every horizon of a full week, in order
    pub fn week() -> impl Iterator<Item = Horizon> {
        (1..=Self::MAX_DAYS).map(Horizon)
    }
}

impl TryFrom<u8> for Horizon {
    type Error = String;

    fn try_from(days: u8) -> Result<Self, Self::Error> {
        Horizon::new(days).ok_or_else(|| format!("horizon must be between 1 and 7 days, got {}", days))
    }
}

impl From<Horizon> for u8 {
    fn from(h: Horizon) -> u8 {
        h.0
    }
}

/// Confidence tier reported with every forecast
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceTier::High => f.write_str("High"),
            ConfidenceTier::Medium => f.write_str("Medium"),
            ConfidenceTier::Low => f.write_str("Low"),
        }
    }
}

/// Calibrated confidence of one prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Confidence {
    pub tier: ConfidenceTier,
    pub score: f64,
}

/// Score per horizon day, index 0 is day 1
const HORIZON_SCORES: [f64; Horizon::MAX_DAYS as usize] = [0.85, 0.80, 0.75, 0.70, 0.65, 0.60, 0.55];

/// Tier table, evaluated top-down: first row whose minimum the score reaches
const TIER_TABLE: [(f64, ConfidenceTier); 3] = [
    (0.80, ConfidenceTier::High),
    (0.65, ConfidenceTier::Medium),
    (0.0, ConfidenceTier::Low),
];

/// Highest score a cold-start item can receive (top of the Medium band)
pub const COLD_START_SCORE_CAP: f64 = 0.75;

/// Map a confidence score to its tier
pub fn tier_for_score(score: f64) -> ConfidenceTier {
    TIER_TABLE
        .iter()
        .find(|(min, _)| score >= *min)
        .map(|(_, tier)| *tier)
        .unwrap_or(ConfidenceTier::Low)
}

/// Confidence for a prediction `horizon` days out.
///
/// Cold-start items never rise above the Medium tier.
pub fn confidence(horizon: Horizon, cold_start: bool) -> Confidence {
    let mut score = HORIZON_SCORES[horizon.offset() as usize];
    if cold_start {
        score = score.min(COLD_START_SCORE_CAP);
    }
    Confidence {
        tier: tier_for_score(score),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizon_bounds() {
        assert!(Horizon::new(0).is_none());
        assert!(Horizon::new(8).is_none());
        assert_eq!(Horizon::new(7).map(|h| h.days()), Some(7));
        assert_eq!(Horizon::week().count(), 7);
    }

    #[test]
    fn warm_tiers_by_horizon() {
        let tiers: Vec<_> = Horizon::week().map(|h| confidence(h, false).tier).collect();
        assert_eq!(
            tiers,
            vec![
                ConfidenceTier::High,
                ConfidenceTier::High,
                ConfidenceTier::Medium,
                ConfidenceTier::Medium,
                ConfidenceTier::Medium,
                ConfidenceTier::Low,
                ConfidenceTier::Low,
            ]
        );
    }

    #[test]
    fn warm_scores_stay_in_band() {
        for h in Horizon::week() {
            let c = confidence(h, false);
            let (lo, hi) = match h.days() {
                1..=2 => (0.80, 0.85),
                3..=5 => (0.65, 0.75),
                _ => (0.55, 0.60),
            };
            assert!(c.score >= lo && c.score <= hi, "day {} score {}", h.days(), c.score);
        }
    }

    #[test]
    fn cold_start_capped_at_medium() {
        for h in Horizon::week() {
            let c = confidence(h, true);
            assert_ne!(c.tier, ConfidenceTier::High);
            assert!(c.score <= COLD_START_SCORE_CAP);
        }
        assert_eq!(confidence(Horizon::NEXT_DAY, true).tier, ConfidenceTier::Medium);
        assert_eq!(confidence(Horizon::new(7).unwrap(), true).tier, ConfidenceTier::Low);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(tier_for_score(0.80), ConfidenceTier::High);
        assert_eq!(tier_for_score(0.7999), ConfidenceTier::Medium);
        assert_eq!(tier_for_score(0.65), ConfidenceTier::Medium);
        assert_eq!(tier_for_score(0.6499), ConfidenceTier::Low);
        assert_eq!(tier_for_score(0.0), ConfidenceTier::Low);
    }

    #[test]
    fn horizon_deserializes_with_bounds() {
        let h: Horizon = serde_json::from_str("3").unwrap();
        assert_eq!(h.days(), 3);
        assert!(serde_json::from_str::<Horizon>("9").is_err());
    }
}
