// File: senda-common/src/models/decision.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Approved,
    Rejected,
    Pending,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Approved => "approved",
            DecisionStatus::Rejected => "rejected",
            DecisionStatus::Pending => "pending",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approved" => Some(DecisionStatus::Approved),
            "rejected" => Some(DecisionStatus::Rejected),
            "pending" => Some(DecisionStatus::Pending),
            _ => None,
        }
    }
}

/// Derived per decision from the submitter's history; never persisted as
/// ground truth. `1.0` for a first-time submitter, otherwise within [0.5, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustScore {
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreContributions {
    pub text_score: f64,
    pub image_score: Option<f64>,
    pub trust_score: f64,
}

/// One evaluation outcome. Immutable once created; a re-evaluation by the
/// reconciler produces a new decision rather than mutating this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationDecision {
    pub decision_id: Uuid,
    pub submission_id: Uuid,
    pub status: DecisionStatus,
    pub overall_score: f64,
    pub rejection_reason: Option<String>,
    pub contributions: ScoreContributions,
    pub decided_at: DateTime<Utc>,
}

impl ModerationDecision {
    pub fn new(
        submission_id: Uuid,
        status: DecisionStatus,
        overall_score: f64,
        rejection_reason: Option<String>,
        contributions: ScoreContributions,
    ) -> Self {
        Self {
            decision_id: Uuid::new_v4(),
            submission_id,
            status,
            overall_score,
            rejection_reason,
            contributions,
            decided_at: Utc::now(),
        }
    }
}

/// What the facade hands back to the platform: the decision plus a bounded
/// remediation list (non-empty only for rejections).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationOutcome {
    pub decision: ModerationDecision,
    pub suggestions: Vec<String>,
}
