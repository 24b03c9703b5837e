//! Failure taxonomy shared by every job implementation.
//!
//! Rate limiting is deliberately absent: it is a retryable state tracked by
//! [`crate::rate_limit`], not an error.

use cinder_browser::BrowserError;
use thiserror::Error;

/// A semantic failure from a platform's per-job-type catalog.
pub trait FailureKind: std::fmt::Debug + Send + Sync {
    /// Stable identifier handed to the reporter (e.g. `"ct0_cookie_not_found"`)
    fn code(&self) -> &'static str;

    /// Human-readable description
    fn message(&self) -> String;
}

/// Errors raised by DOM/navigation primitives and job step functions.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A selector did not appear within its budget
    #[error("timed out waiting for selector {selector} on {context_url}")]
    Timeout {
        /// Selector that was awaited
        selector: String,
        /// Page the wait ran against
        context_url: String,
    },

    /// Navigation landed somewhere other than requested or allowed
    #[error("URL changed: expected {expected}, got {actual}")]
    UrlChanged {
        /// Requested URL
        expected: String,
        /// URL the surface ended up on
        actual: String,
        /// Other URLs that would have been accepted
        valid_alternatives: Vec<String>,
    },

    /// The machine is offline; the whole session stops
    #[error("internet connection is down")]
    InternetDown,

    /// The user canceled the automation
    #[error("automation canceled")]
    Canceled,

    /// Automation surface failure not covered by a more specific variant
    #[error("browser error: {0}")]
    Browser(BrowserError),

    /// Persistence collaborator failure
    #[error("persistence error: {0}")]
    Persistence(#[from] crate::persistence::PersistenceError),

    /// Semantic failure from a job type's catalog
    #[error("{job_type} failed: {message}")]
    Job {
        /// Job type that failed
        job_type: String,
        /// Stable failure code
        code: &'static str,
        /// Human-readable description
        message: String,
    },

    /// Runner state could not be encoded or decoded
    #[error("runner state error: {0}")]
    State(String),

    /// Anything the job did not anticipate
    #[error("unknown job error: {0}")]
    Unknown(String),
}

impl RunnerError {
    /// Build a catalog failure for `job_type`.
    pub fn job(job_type: impl std::fmt::Display, failure: &impl FailureKind) -> Self {
        Self::Job {
            job_type: job_type.to_string(),
            code: failure.code(),
            message: failure.message(),
        }
    }

    /// Stable error type string for reports.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::UrlChanged { .. } => "url_changed",
            Self::InternetDown => "internet_down",
            Self::Canceled => "canceled",
            Self::Browser(_) => "browser",
            Self::Persistence(_) => "persistence",
            Self::Job { code, .. } => *code,
            Self::State(_) => "runner_state",
            Self::Unknown(_) => "unknown_job_error",
        }
    }

    /// Structured payload for an error report.
    #[must_use]
    pub fn report_data(&self) -> serde_json::Value {
        match self {
            Self::Timeout {
                selector,
                context_url,
            } => serde_json::json!({ "selector": selector, "contextUrl": context_url }),
            Self::UrlChanged {
                expected,
                actual,
                valid_alternatives,
            } => serde_json::json!({
                "expected": expected,
                "actual": actual,
                "validAlternatives": valid_alternatives,
            }),
            Self::Job {
                job_type, message, ..
            } => serde_json::json!({ "jobType": job_type, "message": message }),
            other => serde_json::json!({ "message": other.to_string() }),
        }
    }

    /// Errors that must stop the current sequence instead of being retried.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InternetDown | Self::Canceled)
    }

    /// Failures a job anticipated and classified itself. Rerunning the job
    /// can get past them, so they are reported as recoverable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Job { .. } | Self::Timeout { .. } | Self::UrlChanged { .. }
        )
    }
}

impl From<BrowserError> for RunnerError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::SelectorTimeout {
                selector,
                context_url,
            } => Self::Timeout {
                selector,
                context_url,
            },
            other => Self::Browser(other),
        }
    }
}

impl From<serde_json::Error> for RunnerError {
    fn from(err: serde_json::Error) -> Self {
        Self::State(err.to_string())
    }
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
