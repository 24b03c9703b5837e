//! Anticipated X failures.

use cinder_runner::FailureKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XFailure {
    /// The session cookie needed for authenticated requests is missing
    Ct0CookieNotFound,
    /// Could not read the signed-in username from the navigation bar
    UsernameNotFound,
    /// A timeline never rendered its column
    TimelineDidNotLoad,
}

impl FailureKind for XFailure {
    fn code(&self) -> &'static str {
        match self {
            Self::Ct0CookieNotFound => "ct0_cookie_not_found",
            Self::UsernameNotFound => "username_not_found",
            Self::TimelineDidNotLoad => "timeline_did_not_load",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Ct0CookieNotFound => "ct0 cookie not found",
            Self::UsernameNotFound => "username not found",
            Self::TimelineDidNotLoad => "timeline did not load",
        }
        .to_string()
    }
}
