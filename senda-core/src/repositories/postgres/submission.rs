// File: senda-core/src/repositories/postgres/submission.rs

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use senda_common::models::{DecisionStatus, Submission, SubmitterHistory};
use senda_common::traits::repository_traits::SubmissionRepository;
use senda_common::Error;

#[derive(Clone)]
pub struct PostgresSubmissionRepository {
    pool: Pool<Postgres>,
}

impl PostgresSubmissionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_submission(r: &sqlx::postgres::PgRow) -> Result<Submission, Error> {
    Ok(Submission {
        submission_id: r.try_get("submission_id")?,
        submitter_key: r.try_get("submitter_key")?,
        text: r.try_get("content_text")?,
        image_path: r
            .try_get::<Option<String>, _>("image_path")?
            .map(PathBuf::from),
        pdf_path: r
            .try_get::<Option<String>, _>("pdf_path")?
            .map(PathBuf::from),
        submitted_at: r.try_get::<DateTime<Utc>, _>("submitted_at")?,
    })
}

#[async_trait]
impl SubmissionRepository for PostgresSubmissionRepository {
    async fn upsert_submission(&self, submission: &Submission) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO submissions (
                submission_id,
                submitter_key,
                content_text,
                image_path,
                pdf_path,
                status,
                submitted_at
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', $6)
            ON CONFLICT (submission_id) DO NOTHING
            "#,
        )
        .bind(submission.submission_id)
        .bind(&submission.submitter_key)
        .bind(&submission.text)
        .bind(
            submission
                .image_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
        )
        .bind(
            submission
                .pdf_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
        )
        .bind(submission.submitted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_submission(&self, submission_id: Uuid) -> Result<Option<Submission>, Error> {
        let row = sqlx::query(
            r#"
            SELECT submission_id, submitter_key, content_text, image_path, pdf_path, submitted_at
            FROM submissions
            WHERE submission_id = $1
            "#,
        )
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_submission(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_pending(&self, older_than: DateTime<Utc>) -> Result<Vec<Submission>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT submission_id, submitter_key, content_text, image_path, pdf_path, submitted_at
            FROM submissions
            WHERE status = 'pending'
              AND submitted_at < $1
            ORDER BY submitted_at ASC
            "#,
        )
        .bind(older_than)
        .fetch_all(&self.pool)
        .await?;

        let mut submissions = Vec::with_capacity(rows.len());
        for r in &rows {
            submissions.push(row_to_submission(r)?);
        }
        Ok(submissions)
    }

    async fn set_status(&self, submission_id: Uuid, status: DecisionStatus) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE submissions
            SET status = $2
            WHERE submission_id = $1
            "#,
        )
        .bind(submission_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_submitter_history(&self, submitter_key: &str) -> Result<SubmitterHistory, Error> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'approved') AS approvals,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejections
            FROM submissions
            WHERE submitter_key = $1
            "#,
        )
        .bind(submitter_key)
        .fetch_one(&self.pool)
        .await?;

        let approvals: i64 = row.try_get("approvals")?;
        let rejections: i64 = row.try_get("rejections")?;
        Ok(SubmitterHistory {
            approvals,
            rejections,
            total: approvals + rejections,
        })
    }
}
