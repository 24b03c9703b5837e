//! Facebook platform for the cinder runner.
//!
//! Wall posts are deleted through the profile's manage-posts dialog, whose
//! selectors match the English interface. A delete run therefore saves the
//! account's language, switches to English, deletes, and switches back. When
//! the account is already in English the switch jobs are canceled mid-run.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod failure;
pub mod jobs;
pub mod language;
pub mod options;
pub mod platform;
pub mod progress;
pub mod selectors;
mod wall;

pub use failure::FacebookFailure;
pub use jobs::FacebookJobType;
pub use language::USER_LANG_KEY;
pub use options::{FacebookOptions, FacebookOptionsPage};
pub use platform::FacebookPlatform;
pub use progress::FacebookProgress;
