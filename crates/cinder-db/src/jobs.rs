//! Job rows for an account's run.
//!
//! Jobs are stored with their position so the run order survives a restart.
//! Creating a new job list replaces the previous run's jobs.

use crate::error::Result;
use cinder_core::{AccountId, Job, JobId, JobStatus, Timestamp};
use sqlx::SqlitePool;

type JobRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn job_from_row(row: JobRow) -> Result<Job> {
    let (id, job_type, status, started_at, finished_at, snapshot, error) = row;
    Ok(Job {
        id: Some(JobId::new(id)),
        job_type,
        status: status.parse::<JobStatus>()?,
        started_at: started_at.as_deref().map(Timestamp::from_rfc3339).transpose()?,
        finished_at: finished_at.as_deref().map(Timestamp::from_rfc3339).transpose()?,
        progress_snapshot: snapshot.as_deref().map(serde_json::from_str).transpose()?,
        error,
    })
}

/// Replace the account's jobs with one pending job per type, in order.
pub async fn create_jobs(
    pool: &SqlitePool,
    account_id: &AccountId,
    job_types: &[String],
) -> Result<Vec<Job>> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM jobs WHERE account_id = ?")
        .bind(account_id.as_str())
        .execute(&mut *tx)
        .await?;

    let mut jobs = Vec::with_capacity(job_types.len());
    for (position, job_type) in (0_i64..).zip(job_types) {
        let id = JobId::generate();
        sqlx::query(
            r"
            INSERT INTO jobs (id, account_id, position, job_type, status)
            VALUES (?, ?, ?, ?, 'pending')
            ",
        )
        .bind(id.as_str())
        .bind(account_id.as_str())
        .bind(position)
        .bind(job_type)
        .execute(&mut *tx)
        .await?;

        let mut job = Job::new(job_type.clone());
        job.id = Some(id);
        jobs.push(job);
    }

    tx.commit().await?;
    tracing::debug!(account_id = %account_id, count = jobs.len(), "jobs created");
    Ok(jobs)
}

/// Write a job's status, timestamps, snapshot and error.
///
/// A job without an id, or whose row is gone, is appended at the end of the
/// account's list.
pub async fn update_job(pool: &SqlitePool, account_id: &AccountId, job: &Job) -> Result<()> {
    let id = job.id.clone().unwrap_or_else(JobId::generate);
    let snapshot = job
        .progress_snapshot
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    sqlx::query(
        r"
        INSERT INTO jobs (id, account_id, position, job_type, status,
                          started_at, finished_at, progress_snapshot, error)
        VALUES (?, ?,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM jobs WHERE account_id = ?),
                ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            status = excluded.status,
            started_at = excluded.started_at,
            finished_at = excluded.finished_at,
            progress_snapshot = excluded.progress_snapshot,
            error = excluded.error
        ",
    )
    .bind(id.as_str())
    .bind(account_id.as_str())
    .bind(account_id.as_str())
    .bind(&job.job_type)
    .bind(job.status.as_str())
    .bind(job.started_at.map(|t| t.to_rfc3339()))
    .bind(job.finished_at.map(|t| t.to_rfc3339()))
    .bind(snapshot)
    .bind(&job.error)
    .execute(pool)
    .await?;

    Ok(())
}

/// The account's jobs in run order.
pub async fn list_jobs(pool: &SqlitePool, account_id: &AccountId) -> Result<Vec<Job>> {
    let rows: Vec<JobRow> = sqlx::query_as(
        r"
        SELECT id, job_type, status, started_at, finished_at, progress_snapshot, error
        FROM jobs
        WHERE account_id = ?
        ORDER BY position ASC
        ",
    )
    .bind(account_id.as_str())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(job_from_row).collect()
}
