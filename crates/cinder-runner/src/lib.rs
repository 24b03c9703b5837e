//! Cinder Runner - resumable per-account automation runtime.
//!
//! A [`JobRunner`] walks a platform's wizard, defines the job list, then runs
//! each job's step function against an [`AutomationSession`]. Steps are
//! pausable, cancelable at checkpoints, rate-limit aware and retried through
//! the loops in [`retry`]. Failures are classified by [`RunnerError`] and
//! handed to a [`Reporter`] with the recent log ring.
//!
//! # Example
//!
//! ```rust
//! use cinder_runner::{rate_limit_wait, RateLimitInfo};
//! use std::time::Duration;
//!
//! let info = RateLimitInfo { is_rate_limited: true, rate_limit_reset: 1_120 };
//! assert_eq!(rate_limit_wait(&info, 1_000, Duration::from_secs(60)), Duration::from_secs(120));
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod events;
pub mod log_ring;
pub mod navigation;
pub mod pause;
pub mod persistence;
pub mod platform;
pub mod rate_limit;
pub mod report;
pub mod retry;
pub mod runner;
pub mod session;
pub mod state;

pub use error::{FailureKind, Result, RunnerError};
pub use events::{
    archive_built_event, cancel_automation_event, submit_progress_event, AutomationEvent,
    BroadcastEventBus, EventBus,
};
pub use log_ring::{LogEntry, LogRing, LOG_RING_CAPACITY};
pub use navigation::url_matches;
pub use pause::PauseController;
pub use persistence::{MemoryPersistence, Persistence, PersistenceError, PersistenceResult};
pub use platform::{JobContext, JobKind, Platform};
pub use rate_limit::{
    rate_limit_wait, RateLimitInfo, RateLimitMonitor, RateLimitOracle, SharedRateLimitOracle,
};
pub use report::{ErrorReport, RecordingReporter, ReportContext, Reporter, TracingReporter};
pub use retry::{dom_step_retry, network_delete_retry, DeleteOutcome, RetryPolicy};
pub use runner::{run_succeeded, JobRunner};
pub use session::{AutomationSession, CancelHandle, Capabilities};
pub use state::{RunJobsState, RunnerState, WizardInput, WizardState, WizardStep};
