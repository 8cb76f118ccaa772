// File: senda-core/src/repositories/postgres/decision.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use senda_common::models::{DecisionStatus, ModerationDecision, ScoreContributions};
use senda_common::traits::repository_traits::DecisionRepository;
use senda_common::Error;

#[derive(Clone)]
pub struct PostgresDecisionRepository {
    pool: Pool<Postgres>,
}

impl PostgresDecisionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DecisionRepository for PostgresDecisionRepository {
    async fn save_decision(&self, decision: &ModerationDecision) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO moderation_decisions (
                decision_id,
                submission_id,
                status,
                overall_score,
                rejection_reason,
                text_score,
                image_score,
                trust_score,
                decided_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(decision.decision_id)
        .bind(decision.submission_id)
        .bind(decision.status.as_str())
        .bind(decision.overall_score)
        .bind(&decision.rejection_reason)
        .bind(decision.contributions.text_score)
        .bind(decision.contributions.image_score)
        .bind(decision.contributions.trust_score)
        .bind(decision.decided_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_latest_decision(
        &self,
        submission_id: Uuid,
    ) -> Result<Option<ModerationDecision>, Error> {
        let row = sqlx::query(
            r#"
            SELECT decision_id,
                   submission_id,
                   status,
                   overall_score,
                   rejection_reason,
                   text_score,
                   image_score,
                   trust_score,
                   decided_at
            FROM moderation_decisions
            WHERE submission_id = $1
            ORDER BY decided_at DESC
            LIMIT 1
            "#,
        )
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(r) = row {
            let status_raw: String = r.try_get("status")?;
            let status = DecisionStatus::parse(&status_raw)
                .ok_or_else(|| Error::Internal(format!("unknown decision status '{}'", status_raw)))?;
            Ok(Some(ModerationDecision {
                decision_id: r.try_get("decision_id")?,
                submission_id: r.try_get("submission_id")?,
                status,
                overall_score: r.try_get("overall_score")?,
                rejection_reason: r.try_get("rejection_reason")?,
                contributions: ScoreContributions {
                    text_score: r.try_get("text_score")?,
                    image_score: r.try_get("image_score")?,
                    trust_score: r.try_get("trust_score")?,
                },
                decided_at: r.try_get::<DateTime<Utc>, _>("decided_at")?,
            }))
        } else {
            Ok(None)
        }
    }
}
