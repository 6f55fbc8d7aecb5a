//! Postgres-backed [`JobStore`].
//!
//! Status and queue type are stored as TEXT, input and output as JSONB.
//! `claim_pending` uses `FOR UPDATE SKIP LOCKED` so concurrent worker
//! pools never double-claim a job.

use async_trait::async_trait;
use sqlx::FromRow;

use reelflow_core::job::{Job, JobStatus, JobUpdate, NewJob, QueueType};
use reelflow_core::types::Timestamp;

use crate::error::StoreError;
use crate::store::JobStore;
use crate::DbPool;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    project_id, job_id, status, queue_type, external_id, attempts, \
    input, output, output_url, duration_secs, slug, callback_url, \
    created_at, updated_at";

#[derive(Debug, FromRow)]
struct JobRow {
    project_id: String,
    job_id: String,
    status: String,
    queue_type: String,
    external_id: Option<String>,
    attempts: i32,
    input: serde_json::Value,
    output: Option<serde_json::Value>,
    output_url: Option<String>,
    duration_secs: Option<f64>,
    slug: Option<String>,
    callback_url: String,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl JobRow {
    fn into_job(self) -> Result<Job, StoreError> {
        Ok(Job {
            project_id: self.project_id,
            job_id: self.job_id,
            status: self.status.parse()?,
            queue_type: self.queue_type.parse()?,
            external_id: self.external_id,
            attempts: self.attempts,
            input: serde_json::from_value(self.input)?,
            output: self.output.map(serde_json::from_value).transpose()?,
            output_url: self.output_url,
            duration_secs: self.duration_secs,
            slug: self.slug,
            callback_url: self.callback_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct PgJobStore {
    pool: DbPool,
}

impl PgJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn enqueue(&self, new: NewJob) -> Result<Job, StoreError> {
        new.validate()?;
        let job = Job::from_new(new);

        sqlx::query(
            "INSERT INTO jobs \
                 (project_id, job_id, status, queue_type, attempts, input, \
                  slug, callback_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&job.project_id)
        .bind(&job.job_id)
        .bind(job.status.as_str())
        .bind(job.queue_type.as_str())
        .bind(job.attempts)
        .bind(serde_json::to_value(&job.input)?)
        .bind(&job.slug)
        .bind(&job.callback_url)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(job)
    }

    async fn update(
        &self,
        project_id: &str,
        job_id: &str,
        update: JobUpdate,
    ) -> Result<Job, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE project_id = $1 AND job_id = $2 \
             FOR UPDATE"
        );
        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(project_id)
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                project_id: project_id.to_string(),
                job_id: job_id.to_string(),
            })?;

        let current: JobStatus = row.status.parse()?;
        if let Some(next) = update.status {
            if !current.can_transition(next) {
                return Err(StoreError::InvalidTransition {
                    from: current,
                    to: next,
                });
            }
        }

        // Build the SET clause and track the next bind parameter index.
        let mut assignments: Vec<String> = Vec::new();
        let mut bind_idx: u32 = 3;
        for column in [
            update.status.map(|_| "status"),
            update.external_id.as_ref().map(|_| "external_id"),
            update.attempts.map(|_| "attempts"),
            update.output.as_ref().map(|_| "output"),
            update.output_url.as_ref().map(|_| "output_url"),
            update.duration_secs.map(|_| "duration_secs"),
        ]
        .into_iter()
        .flatten()
        {
            assignments.push(format!("{column} = ${bind_idx}"));
            bind_idx += 1;
        }
        assignments.push("updated_at = NOW()".into());

        let query = format!(
            "UPDATE jobs SET {} \
             WHERE project_id = $1 AND job_id = $2 \
             RETURNING {COLUMNS}",
            assignments.join(", "),
        );

        let mut q = sqlx::query_as::<_, JobRow>(&query)
            .bind(project_id)
            .bind(job_id);
        if let Some(status) = update.status {
            q = q.bind(status.as_str());
        }
        if let Some(external_id) = update.external_id {
            q = q.bind(external_id);
        }
        if let Some(attempts) = update.attempts {
            q = q.bind(attempts);
        }
        if let Some(output) = &update.output {
            q = q.bind(serde_json::to_value(output)?);
        }
        if let Some(output_url) = update.output_url {
            q = q.bind(output_url);
        }
        if let Some(duration_secs) = update.duration_secs {
            q = q.bind(duration_secs);
        }

        let row = q.fetch_one(&mut *tx).await?;
        tx.commit().await?;
        row.into_job()
    }

    async fn get(&self, project_id: &str, job_id: &str) -> Result<Option<Job>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE project_id = $1 AND job_id = $2");
        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(project_id)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(JobRow::into_job).transpose()
    }

    async fn list_by_project(&self, project_id: &str) -> Result<Vec<Job>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE project_id = $1 \
             ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, JobRow>(&query)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(JobRow::into_job).collect()
    }

    async fn claim_pending(&self, queue: QueueType) -> Result<Option<Job>, StoreError> {
        let query = format!(
            "UPDATE jobs \
             SET status = $1, updated_at = NOW() \
             WHERE (project_id, job_id) = ( \
                 SELECT project_id, job_id FROM jobs \
                 WHERE status = $2 AND queue_type = $3 \
                 ORDER BY created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, JobRow>(&query)
            .bind(JobStatus::Processing.as_str())
            .bind(JobStatus::Pending.as_str())
            .bind(queue.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(JobRow::into_job).transpose()
    }

    async fn try_claim_completion(&self, project_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO project_completions (project_id, completed_at) \
             VALUES ($1, NOW()) \
             ON CONFLICT (project_id) DO NOTHING",
        )
        .bind(project_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
