//! X job types.

use cinder_runner::JobKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every job an X run can contain, in the order they are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum XJobType {
    Login,
    IndexTweets,
    IndexLikes,
    IndexBookmarks,
    ArchiveTweets,
    ArchiveBuild,
    DeleteTweets,
    DeleteRetweets,
    DeleteLikes,
    DeleteBookmarks,
    UnfollowEveryone,
}

impl XJobType {
    pub const ALL: [Self; 11] = [
        Self::Login,
        Self::IndexTweets,
        Self::IndexLikes,
        Self::IndexBookmarks,
        Self::ArchiveTweets,
        Self::ArchiveBuild,
        Self::DeleteTweets,
        Self::DeleteRetweets,
        Self::DeleteLikes,
        Self::DeleteBookmarks,
        Self::UnfollowEveryone,
    ];

    /// Stable camelCase tag used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::IndexTweets => "indexTweets",
            Self::IndexLikes => "indexLikes",
            Self::IndexBookmarks => "indexBookmarks",
            Self::ArchiveTweets => "archiveTweets",
            Self::ArchiveBuild => "archiveBuild",
            Self::DeleteTweets => "deleteTweets",
            Self::DeleteRetweets => "deleteRetweets",
            Self::DeleteLikes => "deleteLikes",
            Self::DeleteBookmarks => "deleteBookmarks",
            Self::UnfollowEveryone => "unfollowEveryone",
        }
    }
}

impl fmt::Display for XJobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XJobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|job| job.as_str() == s)
            .ok_or_else(|| format!("unknown X job type '{s}'"))
    }
}

impl JobKind for XJobType {
    fn describe(&self) -> String {
        match self {
            Self::Login => "Logging in",
            Self::IndexTweets => "Saving your tweets",
            Self::IndexLikes => "Saving your likes",
            Self::IndexBookmarks => "Saving your bookmarks",
            Self::ArchiveTweets => "Archiving your tweets",
            Self::ArchiveBuild => "Building your archive",
            Self::DeleteTweets => "Deleting your tweets",
            Self::DeleteRetweets => "Deleting your retweets",
            Self::DeleteLikes => "Deleting your likes",
            Self::DeleteBookmarks => "Deleting your bookmarks",
            Self::UnfollowEveryone => "Unfollowing everyone",
        }
        .to_string()
    }
}
