//! Cinder Core - Foundation crate for the cinder automation runtime.
//!
//! This crate provides shared types, the job data model, error handling and
//! configuration management that all other cinder crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes (`AccountId`, `JobId`, `Timestamp`, `PlatformKind`)
//! - [`job`] - The `Job` record, its status lifecycle and the `Account` record
//!
//! # Example
//!
//! ```rust
//! use cinder_core::{AppConfig, Job, JobStatus};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.retry.network_delete_max_tries, 3);
//!
//! let job = Job::new("login");
//! assert_eq!(job.status, JobStatus::Pending);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod job;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, AutomationConfig, AutomationSettings, BrowserConfig, DatabaseConfig,
    GeneralConfig, RateLimitConfig, RetryConfig,
};
pub use error::{CinderError, ConfigError, ConfigResult, Result};
pub use job::{Account, Job, JobStatus};
pub use types::{AccountId, JobId, PlatformKind, Timestamp};
