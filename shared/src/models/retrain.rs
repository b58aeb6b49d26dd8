//! Retrain job state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::accuracy::ErrorMetrics;

/// Lifecycle state of a retrain job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetrainState {
    Pending,
    Running,
    Evaluating,
    Promoted,
    RolledBack,
    Failed,
}

impl RetrainState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RetrainState::Promoted | RetrainState::RolledBack | RetrainState::Failed
        )
    }

    /// Whether the job may still be abandoned without touching the active model
    pub fn is_abandonable(&self) -> bool {
        matches!(self, RetrainState::Pending | RetrainState::Running)
    }

    pub fn can_transition_to(&self, next: RetrainState) -> bool {
        use RetrainState::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Failed)
                | (Running, Evaluating)
                | (Running, Failed)
                | (Evaluating, Promoted)
                | (Evaluating, RolledBack)
                | (Evaluating, Failed)
        )
    }
}

impl std::fmt::Display for RetrainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrainState::Pending => write!(f, "pending"),
            RetrainState::Running => write!(f, "running"),
            RetrainState::Evaluating => write!(f, "evaluating"),
            RetrainState::Promoted => write!(f, "promoted"),
            RetrainState::RolledBack => write!(f, "rolled_back"),
            RetrainState::Failed => write!(f, "failed"),
        }
    }
}

/// What started a retrain job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetrainTrigger {
    Manual,
    AccuracyDegraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("retrain job cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub from: RetrainState,
    pub to: RetrainState,
}

/// Held-out comparison of a candidate against the active model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrainEvaluation {
    pub candidate: ErrorMetrics,
    /// `None` when no model was active
    pub active: Option<ErrorMetrics>,
    pub holdout_rows: usize,
    pub training_rows: usize,
}

impl RetrainEvaluation {
    /// Candidate is no worse than the active model on the held-out slice
    pub fn candidate_wins(&self) -> bool {
        let active_mape = self.active.map(|m| m.mape).unwrap_or(f64::INFINITY);
        self.candidate.mape <= active_mape
    }
}

/// A retraining run from trigger to promotion or rollback
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrainJob {
    pub id: Uuid,
    pub state: RetrainState,
    pub trigger: RetrainTrigger,
    pub data_reference: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub candidate_model: Option<String>,
    /// Where the previously active model was archived on promotion
    pub archived_model: Option<String>,
    pub evaluation: Option<RetrainEvaluation>,
    pub error: Option<String>,
}

impl RetrainJob {
    pub fn new(data_reference: impl Into<String>, trigger: RetrainTrigger) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RetrainState::Pending,
            trigger,
            data_reference: data_reference.into(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            candidate_model: None,
            archived_model: None,
            evaluation: None,
            error: None,
        }
    }

    /// Move to `next`, stamping start and finish times
    pub fn advance(&mut self, next: RetrainState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        if next == RetrainState::Running {
            self.started_at = Some(Utc::now());
        }
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        self.state = next;
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), InvalidTransition> {
        self.advance(RetrainState::Failed)?;
        self.error = Some(reason.into());
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(mape: f64) -> ErrorMetrics {
        ErrorMetrics {
            mae: 1.0,
            mape,
            rmse: 1.0,
            r2: 0.9,
        }
    }

    #[test]
    fn happy_path_transitions() {
        let mut job = RetrainJob::new("data/new_sales.csv", RetrainTrigger::Manual);
        assert_eq!(job.state, RetrainState::Pending);
        job.advance(RetrainState::Running).unwrap();
        assert!(job.started_at.is_some());
        job.advance(RetrainState::Evaluating).unwrap();
        job.advance(RetrainState::Promoted).unwrap();
        assert!(job.finished_at.is_some());
        assert!(!job.is_active());
    }

    #[test]
    fn illegal_transitions_rejected() {
        let mut job = RetrainJob::new("x.csv", RetrainTrigger::Manual);
        assert!(job.advance(RetrainState::Promoted).is_err());
        job.advance(RetrainState::Running).unwrap();
        assert!(job.advance(RetrainState::RolledBack).is_err());
        job.fail("bad data").unwrap();
        assert_eq!(job.error.as_deref(), Some("bad data"));
        assert!(job.advance(RetrainState::Running).is_err());
    }

    #[test]
    fn abandonable_only_before_evaluating() {
        assert!(RetrainState::Pending.is_abandonable());
        assert!(RetrainState::Running.is_abandonable());
        assert!(!RetrainState::Evaluating.is_abandonable());
        assert!(!RetrainState::Promoted.is_abandonable());
    }

    #[test]
    fn candidate_wins_on_tie_and_without_active() {
        let tie = RetrainEvaluation {
            candidate: metrics(12.0),
            active: Some(metrics(12.0)),
            holdout_rows: 30,
            training_rows: 300,
        };
        assert!(tie.candidate_wins());

        let worse = RetrainEvaluation {
            candidate: metrics(15.0),
            active: Some(metrics(12.0)),
            ..tie.clone()
        };
        assert!(!worse.candidate_wins());

        let first = RetrainEvaluation {
            active: None,
            ..worse
        };
        assert!(first.candidate_wins());
    }

    #[test]
    fn state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(RetrainState::RolledBack).unwrap(),
            "rolled_back"
        );
    }
}
