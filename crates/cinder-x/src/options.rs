//! Wizard options and the job list they define.

use crate::jobs::XJobType;
use cinder_runner::WizardStep;
use serde::{Deserialize, Serialize};

/// Options pages of the X wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XOptionsPage {
    Archive,
    Delete,
}

/// What the user asked the run to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct XOptions {
    pub archive_tweets: bool,
    pub archive_likes: bool,
    pub archive_bookmarks: bool,
    pub delete: bool,
    pub delete_tweets: bool,
    pub delete_retweets: bool,
    pub delete_likes: bool,
    pub delete_bookmarks: bool,
    pub unfollow_everyone: bool,
}

impl XOptions {
    /// Archive everything, delete nothing.
    pub fn archive_all() -> Self {
        Self {
            archive_tweets: true,
            archive_likes: true,
            archive_bookmarks: true,
            ..Self::default()
        }
    }

    /// Delete everything, archive nothing.
    pub fn delete_all() -> Self {
        Self {
            delete: true,
            delete_tweets: true,
            delete_retweets: true,
            delete_likes: true,
            delete_bookmarks: true,
            unfollow_everyone: true,
            ..Self::default()
        }
    }

    pub fn archives_anything(&self) -> bool {
        self.archive_tweets || self.archive_likes || self.archive_bookmarks
    }

    fn deletes(&self, flag: bool) -> bool {
        self.delete && flag
    }

    /// Ordered job list. Index jobs run before any job that needs their ids.
    pub fn define_jobs(&self) -> Vec<XJobType> {
        let mut jobs = vec![XJobType::Login];

        if self.archive_tweets
            || self.deletes(self.delete_tweets)
            || self.deletes(self.delete_retweets)
        {
            jobs.push(XJobType::IndexTweets);
        }
        if self.archive_likes || self.deletes(self.delete_likes) {
            jobs.push(XJobType::IndexLikes);
        }
        if self.archive_bookmarks || self.deletes(self.delete_bookmarks) {
            jobs.push(XJobType::IndexBookmarks);
        }
        if self.archive_tweets {
            jobs.push(XJobType::ArchiveTweets);
        }
        if self.archives_anything() {
            jobs.push(XJobType::ArchiveBuild);
        }

        for (flag, job) in [
            (self.delete_tweets, XJobType::DeleteTweets),
            (self.delete_retweets, XJobType::DeleteRetweets),
            (self.delete_likes, XJobType::DeleteLikes),
            (self.delete_bookmarks, XJobType::DeleteBookmarks),
            (self.unfollow_everyone, XJobType::UnfollowEveryone),
        ] {
            if self.deletes(flag) {
                jobs.push(job);
            }
        }
        jobs
    }

    pub fn options_pages(&self) -> Vec<XOptionsPage> {
        vec![XOptionsPage::Archive, XOptionsPage::Delete]
    }

    /// Text shown while the wizard rests on `step`.
    pub fn instructions(&self, step: &WizardStep<XOptionsPage>) -> String {
        match step {
            WizardStep::Prestart => "Checking your X account.".to_string(),
            WizardStep::Start => "You're signed in to X. What would you like to do?".to_string(),
            WizardStep::Options(XOptionsPage::Archive) => {
                "Choose what to save before anything is deleted.".to_string()
            }
            WizardStep::Options(XOptionsPage::Delete) => {
                "Choose what to delete. Deleted data can't be recovered.".to_string()
            }
            WizardStep::Review => {
                let jobs = self.define_jobs();
                if jobs.len() == 1 {
                    return "Nothing selected. Go back and pick something to do.".to_string();
                }
                let steps: Vec<&str> = jobs.iter().skip(1).map(XJobType::as_str).collect();
                format!("Ready to run: {}.", steps.join(", "))
            }
        }
    }
}
