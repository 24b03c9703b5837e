//! X (formerly Twitter) platform for the cinder runner.
//!
//! Index jobs scroll a timeline and record every post they see. Archive jobs
//! capture those posts and publish an archive. Delete jobs issue the web
//! client's own API calls from inside the signed-in page.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
mod archive;
mod delete;
pub mod failure;
mod index;
pub mod jobs;
pub mod options;
pub mod platform;
pub mod progress;
pub mod selectors;
mod unfollow;

pub use failure::XFailure;
pub use jobs::XJobType;
pub use options::{XOptions, XOptionsPage};
pub use platform::XPlatform;
pub use progress::{ArchivedTweet, IndexedTweet, XProgress};
