//! Shared types used across cinder.
//!
//! This module defines common newtypes and enums that provide type safety
//! and clear domain modeling.

use crate::error::CinderError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Newtype for account identifiers with validation.
///
/// Account IDs are short tokens (letters, digits, `-`, `_`) because they are
/// embedded in event names such as `submit-progress-<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new `AccountId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID is empty, longer than 64 characters or
    /// contains characters other than `[A-Za-z0-9_-]`.
    pub fn new(id: impl Into<String>) -> Result<Self, CinderError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Create a new random `AccountId` using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), CinderError> {
        static ACCOUNT_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = ACCOUNT_REGEX
            .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid regex"));

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(CinderError::Validation(format!(
                "invalid account ID: must be 1-64 characters of [A-Za-z0-9_-], got '{id}'"
            )))
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = CinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Opaque job identifier assigned by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap an identifier produced by storage.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new random `JobId` using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Third-party platforms the runner knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// X (formerly Twitter)
    X,
    /// Facebook
    Facebook,
}

impl PlatformKind {
    /// Stable lowercase name, used in storage and on the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Facebook => "facebook",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = CinderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" | "twitter" => Ok(Self::X),
            "facebook" | "fb" => Ok(Self::Facebook),
            other => Err(CinderError::Validation(format!("unknown platform '{other}'"))),
        }
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
///
/// Provides serialization/deserialization and utility methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parse a timestamp from an RFC3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, CinderError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| CinderError::Validation(format!("invalid timestamp: {e}")))
    }

    /// Format as RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get seconds since Unix epoch.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_valid() {
        for id in ["1", "account-7", "x_user_42"] {
            assert!(AccountId::new(id).is_ok(), "Failed for: {id}");
        }
    }

    #[test]
    fn test_account_id_invalid() {
        let too_long = "a".repeat(65);
        for id in ["", "has space", "slash/id", too_long.as_str()] {
            assert!(AccountId::new(id).is_err(), "Should fail for: {id}");
        }
    }

    #[test]
    fn test_account_id_generate() {
        let id1 = AccountId::generate();
        let id2 = AccountId::generate();
        assert_ne!(id1, id2);
        assert!(AccountId::new(id1.as_str()).is_ok());
    }

    #[test]
    fn test_job_id_serializes_transparently() {
        let id = JobId::new("job-1");
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"job-1\"");
    }

    #[test]
    fn test_platform_kind_parse() {
        assert_eq!("x".parse::<PlatformKind>().expect("x"), PlatformKind::X);
        assert_eq!(
            "Facebook".parse::<PlatformKind>().expect("facebook"),
            PlatformKind::Facebook
        );
        assert!("myspace".parse::<PlatformKind>().is_err());
        assert_eq!(PlatformKind::X.to_string(), "x");
    }

    #[test]
    fn test_timestamp_rfc3339() {
        let ts = Timestamp::now();
        let s = ts.to_rfc3339();
        let parsed = Timestamp::from_rfc3339(&s).expect("parse RFC3339 timestamp");
        assert_eq!(ts.timestamp(), parsed.timestamp());
    }

    #[test]
    fn test_timestamp_invalid() {
        assert!(Timestamp::from_rfc3339("yesterday").is_err());
    }
}
