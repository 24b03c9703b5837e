use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("chromium error: {0}")]
    ChromiumError(String),

    #[error("navigation failed: {0}")]
    NavigationError(String),

    #[error("automation surface is unavailable")]
    SurfaceUnavailable,

    #[error("script failed: {0}")]
    ScriptError(String),

    #[error("input event failed: {0}")]
    InputError(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("timed out waiting for selector {selector} on {context_url}")]
    SelectorTimeout {
        selector: String,
        context_url: String,
    },
}

/// Failure of a single guarded script execution.
///
/// Never escapes as a panic or exception; callers decide whether a failed
/// script is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ScriptFailure {
    pub message: String,
}

impl ScriptFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ScriptFailure> for BrowserError {
    fn from(failure: ScriptFailure) -> Self {
        Self::ScriptError(failure.message)
    }
}
