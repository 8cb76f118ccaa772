// File: senda-common/src/traits/repository_traits.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;
use crate::models::decision::{DecisionStatus, ModerationDecision};
use crate::models::submission::{ModerationLogEntry, Submission, SubmitterHistory};

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Inserts the submission if it is not stored yet; re-submitting the same
    /// id is a no-op so that re-evaluation passes stay idempotent.
    async fn upsert_submission(&self, submission: &Submission) -> Result<(), Error>;

    async fn get_submission(&self, submission_id: Uuid) -> Result<Option<Submission>, Error>;

    /// Submissions whose latest status is still `pending` and which were
    /// submitted before `older_than`. This is the reconciler's selection
    /// predicate; decided items never show up here.
    async fn list_pending(&self, older_than: DateTime<Utc>) -> Result<Vec<Submission>, Error>;

    async fn set_status(&self, submission_id: Uuid, status: DecisionStatus) -> Result<(), Error>;

    /// Decided-submission counts for the submitter. All zeroes for a
    /// first-time submitter.
    async fn get_submitter_history(&self, submitter_key: &str) -> Result<SubmitterHistory, Error>;
}

#[async_trait]
pub trait DecisionRepository: Send + Sync {
    /// Decisions are append-only; a re-evaluation inserts a new row.
    async fn save_decision(&self, decision: &ModerationDecision) -> Result<(), Error>;

    async fn get_latest_decision(
        &self,
        submission_id: Uuid,
    ) -> Result<Option<ModerationDecision>, Error>;
}

#[async_trait]
pub trait ModerationLogRepository: Send + Sync {
    async fn record_rejection(&self, entry: &ModerationLogEntry) -> Result<(), Error>;

    async fn recent_rejections(
        &self,
        submitter_key: &str,
        limit: i64,
    ) -> Result<Vec<ModerationLogEntry>, Error>;
}
