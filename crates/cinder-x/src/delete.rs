//! Network deletes for indexed posts, likes and bookmarks.
//!
//! Ids already recorded as deleted are skipped, so a re-attempted job only
//! touches what is left.

use crate::api::{mutation_request, Mutation};
use crate::failure::XFailure;
use crate::platform::XPlatform;
use crate::progress::XProgress;
use crate::selectors::HOME_URL;
use cinder_runner::{AutomationSession, DeleteOutcome, JobContext, JobKind, Result, RunnerError};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeleteKind {
    Tweets,
    Retweets,
    Likes,
    Bookmarks,
}

impl DeleteKind {
    fn mutation(self) -> Mutation {
        match self {
            Self::Tweets => Mutation::DeleteTweet,
            Self::Retweets => Mutation::DeleteRetweet,
            Self::Likes => Mutation::UnfavoriteTweet,
            Self::Bookmarks => Mutation::DeleteBookmark,
        }
    }

    fn targets(self, progress: &XProgress) -> Vec<String> {
        match self {
            Self::Tweets => progress.tweet_ids(false),
            Self::Retweets => progress.tweet_ids(true),
            Self::Likes => progress.likes.iter().cloned().collect(),
            Self::Bookmarks => progress.bookmarks.iter().cloned().collect(),
        }
    }

    fn done(self, progress: &XProgress) -> &BTreeSet<String> {
        match self {
            Self::Tweets => &progress.deleted_tweets,
            Self::Retweets => &progress.deleted_retweets,
            Self::Likes => &progress.deleted_likes,
            Self::Bookmarks => &progress.deleted_bookmarks,
        }
    }

    fn done_mut(self, progress: &mut XProgress) -> &mut BTreeSet<String> {
        match self {
            Self::Tweets => &mut progress.deleted_tweets,
            Self::Retweets => &mut progress.deleted_retweets,
            Self::Likes => &mut progress.deleted_likes,
            Self::Bookmarks => &mut progress.deleted_bookmarks,
        }
    }

    /// Targets not yet deleted, in order.
    fn outstanding(self, progress: &XProgress) -> Vec<String> {
        let done = self.done(progress);
        self.targets(progress)
            .into_iter()
            .filter(|id| !done.contains(id))
            .collect()
    }
}

/// Run one request script and read its HTTP status; `0` if it never ran.
pub(crate) async fn request_status(session: &AutomationSession, script: &str) -> Result<u16> {
    Ok(session
        .dom()
        .safe_execute_javascript::<Option<u16>>(script, Some("api request"))
        .await
        .ok()
        .flatten()
        .unwrap_or(0))
}

/// Read the `ct0` CSRF cookie, loading an x.com page first if needed.
pub(crate) async fn csrf_token(
    session: &AutomationSession,
    job_type: impl JobKind,
) -> Result<String> {
    if !session.current_url().await.starts_with("https://x.com/") {
        session.load_url_with_rate_limit(HOME_URL, &[], true).await?;
    }
    session
        .dom()
        .get_cookie("ct0")
        .await
        .ok_or_else(|| RunnerError::job(job_type, &XFailure::Ct0CookieNotFound))
}

pub(crate) async fn delete_items(
    ctx: &mut JobContext<'_, XPlatform>,
    kind: DeleteKind,
) -> Result<()> {
    let session = ctx.session;
    let job_type = ctx.job_type();
    session.check_internet().await?;
    let ct0 = csrf_token(session, job_type).await?;

    let total = kind.targets(ctx.progress()).len();
    let outstanding = kind.outstanding(ctx.progress());
    if outstanding.len() < total {
        session.log(format!(
            "skipping {} items deleted by an earlier attempt",
            total - outstanding.len()
        ));
    }

    for (n, id) in outstanding.iter().enumerate() {
        session.ensure_not_canceled()?;
        let script = mutation_request(kind.mutation(), id, &ct0);

        match session
            .network_delete(|| request_status(session, &script))
            .await?
        {
            DeleteOutcome::Deleted { attempts } => {
                tracing::debug!(job_type = %job_type, id = %id, attempts, "item deleted");
                kind.done_mut(ctx.progress_mut()).insert(id.clone());
            }
            DeleteOutcome::Failed {
                attempts,
                last_status,
            } => {
                session.log(format!(
                    "giving up on {id} after {attempts} attempts (status {last_status})"
                ));
                ctx.progress_mut().errors += 1;
            }
        }

        ctx.set_action_string(format!(
            "{} ({}/{})",
            job_type.describe(),
            n + 1,
            outstanding.len()
        ));
        ctx.checkpoint().await?;
    }
    Ok(())
}
