//! Job records and their lifecycle.
//!
//! A [`Job`] is one schedulable unit of platform automation. Its status only
//! moves forward: `pending -> running -> finished | error | canceled`, plus
//! `pending -> canceled` for jobs dropped before they ever ran.

use crate::error::CinderError;
use crate::types::{AccountId, JobId, PlatformKind, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, not yet attempted
    Pending,
    /// Currently (or last) being executed
    Running,
    /// Completed successfully
    Finished,
    /// Stopped by a failure
    Error,
    /// Dropped without completing
    Canceled,
}

impl JobStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Error | Self::Canceled)
    }

    /// Stable lowercase name used in storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Error => "error",
            Self::Canceled => "canceled",
        }
    }

    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running | Self::Canceled)
                | (Self::Running, Self::Finished | Self::Error | Self::Canceled)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "finished" => Ok(Self::Finished),
            "error" => Ok(Self::Error),
            "canceled" => Ok(Self::Canceled),
            other => Err(CinderError::Validation(format!(
                "unknown job status '{other}'"
            ))),
        }
    }
}

/// One unit of automation work.
///
/// `T` is the job-type tag. Storage works with `Job<String>`; platforms work
/// with their own closed enum and convert with [`Job::map_type`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job<T = String> {
    /// Identifier assigned by storage (absent before creation)
    pub id: Option<JobId>,
    /// Job-type tag
    pub job_type: T,
    /// Lifecycle status
    pub status: JobStatus,
    /// Set once, when the job first starts running
    pub started_at: Option<Timestamp>,
    /// Set once, when the job reaches a terminal status
    pub finished_at: Option<Timestamp>,
    /// Serialized progress captured at completion or error time
    pub progress_snapshot: Option<serde_json::Value>,
    /// Error summary if the job failed
    pub error: Option<String>,
}

impl<T> Job<T> {
    /// Create a pending job without an identifier.
    pub fn new(job_type: T) -> Self {
        Self {
            id: None,
            job_type,
            status: JobStatus::Pending,
            started_at: None,
            finished_at: None,
            progress_snapshot: None,
            error: None,
        }
    }

    /// Convert the job-type tag, keeping every other field.
    pub fn map_type<U>(self, f: impl FnOnce(T) -> U) -> Job<U> {
        Job {
            id: self.id,
            job_type: f(self.job_type),
            status: self.status,
            started_at: self.started_at,
            finished_at: self.finished_at,
            progress_snapshot: self.progress_snapshot,
            error: self.error,
        }
    }

    /// Fallible variant of [`Job::map_type`].
    pub fn try_map_type<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Job<U>, E> {
        Ok(Job {
            id: self.id,
            job_type: f(self.job_type)?,
            status: self.status,
            started_at: self.started_at,
            finished_at: self.finished_at,
            progress_snapshot: self.progress_snapshot,
            error: self.error,
        })
    }

    /// Mark the job running.
    ///
    /// A job already `running` (interrupted by a restart) is accepted as is
    /// and keeps its original `started_at`.
    pub fn begin(&mut self) -> Result<(), CinderError> {
        if self.status == JobStatus::Running {
            return Ok(());
        }
        self.transition(JobStatus::Running)?;
        self.started_at.get_or_insert_with(Timestamp::now);
        Ok(())
    }

    /// Mark the job finished with a progress snapshot.
    pub fn finish(&mut self, snapshot: Option<serde_json::Value>) -> Result<(), CinderError> {
        self.transition(JobStatus::Finished)?;
        self.progress_snapshot = snapshot;
        self.finished_at.get_or_insert_with(Timestamp::now);
        Ok(())
    }

    /// Mark the job failed with an error summary and progress snapshot.
    pub fn fail(
        &mut self,
        error: impl Into<String>,
        snapshot: Option<serde_json::Value>,
    ) -> Result<(), CinderError> {
        self.transition(JobStatus::Error)?;
        self.error = Some(error.into());
        self.progress_snapshot = snapshot;
        self.finished_at.get_or_insert_with(Timestamp::now);
        Ok(())
    }

    /// Cancel the job. Terminal jobs are left untouched.
    ///
    /// Returns `true` if the status changed.
    pub fn cancel(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Canceled;
        self.finished_at.get_or_insert_with(Timestamp::now);
        true
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), CinderError> {
        if !self.status.can_transition_to(next) {
            return Err(CinderError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

/// A third-party account the runner automates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account identifier
    pub id: AccountId,
    /// Which platform this account lives on
    pub platform: PlatformKind,
    /// Username on the platform, once known
    pub username: Option<String>,
    /// When the account record was created
    pub created_at: Timestamp,
    /// When the account record was last saved
    pub updated_at: Timestamp,
}

impl Account {
    /// Create a fresh account record.
    #[must_use]
    pub fn new(id: AccountId, platform: PlatformKind) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            platform,
            username: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_lifecycle_finish() {
        let mut job = Job::new("indexTweets".to_string());
        job.begin().expect("pending -> running");
        let started = job.started_at;
        assert!(started.is_some());

        job.finish(Some(serde_json::json!({"indexed": 4})))
            .expect("running -> finished");
        assert_eq!(job.status, JobStatus::Finished);
        assert!(job.finished_at.is_some());
        assert_eq!(
            job.progress_snapshot,
            Some(serde_json::json!({"indexed": 4}))
        );
    }

    #[test]
    fn test_job_begin_is_idempotent_for_interrupted_jobs() {
        let mut job = Job::new("login");
        job.begin().expect("start");
        let started = job.started_at;
        job.begin().expect("restart of a running job");
        assert_eq!(job.started_at, started);
    }

    #[test]
    fn test_job_status_is_monotonic() {
        let mut job = Job::new("login");
        job.begin().expect("start");
        job.fail("boom", None).expect("fail");
        assert!(job.begin().is_err());
        assert!(job.finish(None).is_err());
        assert!(!job.cancel());
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_pending_job_can_be_canceled() {
        let mut job = Job::new("restoreUserLang");
        assert!(job.cancel());
        assert_eq!(job.status, JobStatus::Canceled);
        assert!(job.started_at.is_none());
        assert!(job.begin().is_err());
    }

    #[test]
    fn test_finish_requires_running() {
        let mut job = Job::new("login");
        assert!(matches!(
            job.finish(None),
            Err(CinderError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_map_type_roundtrip() {
        let job = Job::new(7_u8).map_type(|t| t.to_string());
        assert_eq!(job.job_type, "7");
        let back: Job<u8> = job
            .try_map_type(|s| s.parse::<u8>())
            .expect("parse job type");
        assert_eq!(back.job_type, 7);
    }

    #[test]
    fn test_job_status_parse() {
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Finished,
            JobStatus::Error,
            JobStatus::Canceled,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().expect("parse"), status);
        }
        assert!("done".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_job_serializes_camel_case() {
        let job = Job::new("login");
        let json = serde_json::to_value(&job).expect("serialize");
        assert_eq!(json["jobType"], "login");
        assert_eq!(json["status"], "pending");
    }
}
