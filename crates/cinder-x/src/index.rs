//! Timeline indexing: scroll, collect, repeat until nothing new appears.

use crate::api::COLLECT_TIMELINE;
use crate::failure::XFailure;
use crate::platform::{require_username, XPlatform};
use crate::progress::{IndexedTweet, XProgress};
use crate::selectors::{self, BOOKMARKS_URL, PRIMARY_COLUMN};
use cinder_browser::BrowserError;
use cinder_runner::{AutomationSession, JobContext, JobKind, Result, RunnerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Timeline {
    Tweets,
    Likes,
    Bookmarks,
}

impl Timeline {
    fn url(self, username: &str) -> String {
        match self {
            Self::Tweets => selectors::tweets_url(username),
            Self::Likes => selectors::likes_url(username),
            Self::Bookmarks => BOOKMARKS_URL.to_string(),
        }
    }

    fn count(self, progress: &XProgress) -> usize {
        match self {
            Self::Tweets => progress.tweets.len(),
            Self::Likes => progress.likes.len(),
            Self::Bookmarks => progress.bookmarks.len(),
        }
    }

    /// Record `batch`, returning how many posts were new.
    fn merge(self, progress: &mut XProgress, batch: Vec<IndexedTweet>) -> usize {
        let before = self.count(progress);
        for tweet in batch {
            match self {
                Self::Tweets => {
                    progress.tweets.entry(tweet.id.clone()).or_insert(tweet);
                }
                Self::Likes => {
                    progress.likes.insert(tweet.id);
                }
                Self::Bookmarks => {
                    progress.bookmarks.insert(tweet.id);
                }
            }
        }
        self.count(progress) - before
    }
}

async fn collect(session: &AutomationSession) -> Result<Vec<IndexedTweet>> {
    session
        .dom()
        .safe_execute_javascript::<Vec<IndexedTweet>>(COLLECT_TIMELINE, Some("collect timeline"))
        .await
        .map_err(|failure| RunnerError::from(BrowserError::from(failure)))
}

/// Wait for the timeline column, mapping a timeout to the catalog failure.
pub(crate) async fn wait_for_timeline(
    session: &AutomationSession,
    job_type: impl JobKind,
) -> Result<()> {
    match session.wait_for_selector(PRIMARY_COLUMN, None).await {
        Err(RunnerError::Timeout { .. }) => {
            Err(RunnerError::job(job_type, &XFailure::TimelineDidNotLoad))
        }
        other => other,
    }
}

pub(crate) async fn index_timeline(
    platform: &XPlatform,
    ctx: &mut JobContext<'_, XPlatform>,
    timeline: Timeline,
) -> Result<()> {
    let session = ctx.session;
    let job_type = ctx.job_type();
    let username = require_username(ctx)?;
    let url = timeline.url(&username);

    session.load_url_with_rate_limit(&url, &[], false).await?;
    wait_for_timeline(session, job_type).await?;

    let mut idle_scrolls = 0;
    while idle_scrolls < platform.idle_scroll_limit {
        session.ensure_not_canceled()?;

        let batch = session
            .dom_step("collect timeline", || collect(session))
            .await?;
        let added = timeline.merge(ctx.progress_mut(), batch);
        let total = timeline.count(ctx.progress());
        tracing::debug!(
            job_type = %job_type,
            added,
            total,
            idle_scrolls,
            "timeline batch merged"
        );
        ctx.set_action_string(format!("{} ({total} saved)", job_type.describe()));
        ctx.checkpoint().await?;

        if added == 0 {
            idle_scrolls += 1;
        } else {
            idle_scrolls = 0;
        }

        session.between_pauses(session.dom().scroll_to_bottom()).await;
        session.sleep(platform.scroll_pause).await;
        session.check_rate_limit().await;
    }

    session.log(format!(
        "indexed {} posts from {url}",
        timeline.count(ctx.progress())
    ));
    Ok(())
}
