// File: senda-core/src/repositories/postgres/moderation_log.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};

use senda_common::models::ModerationLogEntry;
use senda_common::traits::repository_traits::ModerationLogRepository;
use senda_common::Error;

#[derive(Clone)]
pub struct PostgresModerationLogRepository {
    pool: Pool<Postgres>,
}

impl PostgresModerationLogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModerationLogRepository for PostgresModerationLogRepository {
    async fn record_rejection(&self, entry: &ModerationLogEntry) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO moderation_log (
                log_id,
                submission_id,
                submitter_key,
                content_excerpt,
                rejection_reason,
                overall_score,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.log_id)
        .bind(entry.submission_id)
        .bind(&entry.submitter_key)
        .bind(&entry.content_excerpt)
        .bind(&entry.rejection_reason)
        .bind(entry.overall_score)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_rejections(
        &self,
        submitter_key: &str,
        limit: i64,
    ) -> Result<Vec<ModerationLogEntry>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT log_id,
                   submission_id,
                   submitter_key,
                   content_excerpt,
                   rejection_reason,
                   overall_score,
                   created_at
            FROM moderation_log
            WHERE submitter_key = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(submitter_key)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for r in rows {
            entries.push(ModerationLogEntry {
                log_id: r.try_get("log_id")?,
                submission_id: r.try_get("submission_id")?,
                submitter_key: r.try_get("submitter_key")?,
                content_excerpt: r.try_get("content_excerpt")?,
                rejection_reason: r.try_get("rejection_reason")?,
                overall_score: r.try_get("overall_score")?,
                created_at: r.try_get::<DateTime<Utc>, _>("created_at")?,
            });
        }
        Ok(entries)
    }
}
