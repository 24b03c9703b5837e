//! Automation surface for cinder.
//!
//! Provides the [`BrowserSurface`] capability, a Chromium implementation of
//! it, and the DOM automation protocol ([`Dom`]) every job step goes through.

pub mod dom;
pub mod engine;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod fingerprint;
pub mod script;
pub mod surface;
pub mod wait;

pub use dom::{Dom, DomTiming, ScriptLogger};
pub use engine::{ChromiumSurface, RateLimitSink};
pub use error::{BrowserError, Result, ScriptFailure};
#[cfg(any(test, feature = "testing"))]
pub use fake::{FakeReply, FakeSurface};
pub use fingerprint::FingerprintConfig;
pub use surface::{strip_query, BrowserSurface, InputEvent};
pub use wait::{poll_until, poll_until_true, PollTimeout};
