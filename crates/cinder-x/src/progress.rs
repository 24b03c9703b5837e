//! X run progress.
//!
//! Progress is persisted with the runner state after every checkpoint, so a
//! restarted job sees what earlier attempts already did.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A post collected from a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedTweet {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_retweet: bool,
}

/// A tweet captured from its own page for the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedTweet {
    pub id: String,
    pub url: String,
    pub text: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct XProgress {
    pub username: Option<String>,

    pub tweets: BTreeMap<String, IndexedTweet>,
    pub likes: BTreeSet<String>,
    pub bookmarks: BTreeSet<String>,

    pub archived_tweets: BTreeMap<String, ArchivedTweet>,
    pub archive_built: bool,

    pub deleted_tweets: BTreeSet<String>,
    pub deleted_retweets: BTreeSet<String>,
    pub deleted_likes: BTreeSet<String>,
    pub deleted_bookmarks: BTreeSet<String>,
    pub accounts_unfollowed: u64,

    /// Deletes that exhausted their retries
    pub errors: u64,
}

impl XProgress {
    /// Ids of own posts (`retweets == false`) or of retweets.
    pub fn tweet_ids(&self, retweets: bool) -> Vec<String> {
        self.tweets
            .values()
            .filter(|t| t.is_retweet == retweets)
            .map(|t| t.id.clone())
            .collect()
    }
}
