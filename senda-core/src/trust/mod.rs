// File: senda-core/src/trust/mod.rs

use std::sync::Arc;

use tracing::warn;

use senda_common::models::TrustScore;
use senda_common::traits::repository_traits::SubmissionRepository;
use senda_common::Error;

/// Derives a submitter's trust from their decided-submission history.
/// First-time submitters get the benefit of the doubt (exactly 1.0); anyone
/// with history lands in [0.5, 1.0]. Recomputed per decision, never stored.
pub struct UserTrustEstimator {
    submissions: Arc<dyn SubmissionRepository>,
}

impl UserTrustEstimator {
    pub fn new(submissions: Arc<dyn SubmissionRepository>) -> Self {
        Self { submissions }
    }

    pub async fn estimate(&self, submitter_key: &str) -> Result<TrustScore, Error> {
        let history = self.submissions.get_submitter_history(submitter_key).await?;
        if history.total <= 0 {
            return Ok(TrustScore { value: 1.0 });
        }

        let total = history.total as f64;
        let base = history.approvals as f64 / total;
        let rejection_ratio = history.rejections as f64 / total;

        // Mild penalty: at most 20% of the rejection ratio.
        let mut value = base - rejection_ratio * 0.2;

        // Loyalty bonuses for sustained approvals.
        if history.approvals >= 2 {
            value += 0.05;
        }
        if history.approvals >= 5 {
            value += 0.05;
        }

        if !value.is_finite() {
            warn!(
                submitter = submitter_key,
                "trust computation produced a non-finite value; substituting 0.8"
            );
            return Ok(TrustScore { value: 0.8 });
        }

        Ok(TrustScore {
            value: value.clamp(0.5, 1.0),
        })
    }
}
