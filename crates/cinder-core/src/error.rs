//! Core error types for cinder.
//!
//! This module defines the central error type shared by the crates that do
//! not carry a more specific taxonomy of their own.

use thiserror::Error;

/// Central error type for cinder operations outside the automation core.
#[derive(Error, Debug)]
pub enum CinderError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Persistence errors (connection, queries, migrations)
    #[error("database error: {0}")]
    Database(String),

    /// Browser surface errors (launch, navigation, teardown)
    #[error("browser error: {0}")]
    Browser(String),

    /// Illegal job lifecycle transition
    #[error("invalid job transition from {from} to {to}")]
    InvalidTransition {
        /// Status the job was in
        from: String,
        /// Status that was requested
        to: String,
    },

    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `CinderError`.
pub type Result<T> = std::result::Result<T, CinderError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
