//! The automation surface capability.
//!
//! Everything the runtime does to a page goes through [`BrowserSurface`].
//! Every call is a round trip; nothing about DOM state is cached.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Synthetic input delivered to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    /// Type a single character into the focused element
    Char { text: char },
    /// Press a named key (`Enter`, `Escape`, `Tab`, ...)
    KeyDown { key: String },
    /// Release a named key
    KeyUp { key: String },
    /// Left click at viewport coordinates
    MouseClick { x: i64, y: i64 },
}

/// Embedded browser view exclusively owned by one account session.
#[async_trait::async_trait]
pub trait BrowserSurface: Send + Sync {
    /// Load a URL and wait for the navigation to settle
    async fn load_url(&self, url: &str) -> Result<()>;

    /// Current URL of the page
    async fn get_url(&self) -> Result<String>;

    /// Evaluate a script in the page and return its JSON value
    async fn execute_javascript(&self, script: &str) -> Result<serde_json::Value>;

    /// Deliver a synthetic input event
    async fn send_input_event(&self, event: InputEvent) -> Result<()>;

    /// Whether the surface is still attached; `false` once torn down
    fn is_available(&self) -> bool;
}

/// Drop the query string and fragment from a URL.
///
/// Unparseable input is cut at the first `?` or `#` instead.
pub fn strip_query(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}
