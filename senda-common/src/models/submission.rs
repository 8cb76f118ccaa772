// File: senda-common/src/models/submission.rs

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The unit of moderation work: user text plus optional attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub submission_id: Uuid,
    pub submitter_key: String,
    pub text: String,
    pub image_path: Option<PathBuf>,
    pub pdf_path: Option<PathBuf>,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(submitter_key: &str, text: &str) -> Self {
        Self {
            submission_id: Uuid::new_v4(),
            submitter_key: submitter_key.to_string(),
            text: text.to_string(),
            image_path: None,
            pdf_path: None,
            submitted_at: Utc::now(),
        }
    }

    pub fn with_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    pub fn with_pdf(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdf_path = Some(path.into());
        self
    }
}

/// Decided-submission counts for one submitter, as read from storage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SubmitterHistory {
    pub approvals: i64,
    pub rejections: i64,
    pub total: i64,
}

/// Audit row written for every rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationLogEntry {
    pub log_id: Uuid,
    pub submission_id: Uuid,
    pub submitter_key: String,
    pub content_excerpt: String,
    pub rejection_reason: String,
    pub overall_score: f64,
    pub created_at: DateTime<Utc>,
}

impl ModerationLogEntry {
    pub fn new(
        submission_id: Uuid,
        submitter_key: &str,
        content_excerpt: &str,
        rejection_reason: &str,
        overall_score: f64,
    ) -> Self {
        Self {
            log_id: Uuid::new_v4(),
            submission_id,
            submitter_key: submitter_key.to_string(),
            content_excerpt: content_excerpt.to_string(),
            rejection_reason: rejection_reason.to_string(),
            overall_score,
            created_at: Utc::now(),
        }
    }
}
