//! The X job table.

use crate::archive::{archive_tweets, build_archive};
use crate::delete::{delete_items, DeleteKind};
use crate::failure::XFailure;
use crate::index::{index_timeline, Timeline};
use crate::jobs::XJobType;
use crate::options::{XOptions, XOptionsPage};
use crate::progress::XProgress;
use crate::selectors::{HOME_URL, LOGIN_FLOW_URL, LOGIN_URL, PROFILE_LINK};
use crate::unfollow::unfollow_everyone;
use async_trait::async_trait;
use cinder_core::{Account, PlatformKind};
use cinder_runner::{AutomationSession, JobContext, Platform, Result, RunnerError, WizardStep};
use std::time::Duration;

/// X automation.
#[derive(Debug, Clone)]
pub struct XPlatform {
    /// Pause after each timeline scroll
    pub scroll_pause: Duration,
    /// Consecutive scrolls without new posts before a timeline counts as done
    pub idle_scroll_limit: u32,
    /// How long to wait for the user to finish signing in
    pub login_timeout: Duration,
}

impl Default for XPlatform {
    fn default() -> Self {
        Self {
            scroll_pause: Duration::from_secs(2),
            idle_scroll_limit: 3,
            login_timeout: Duration::from_secs(300),
        }
    }
}

/// `/someone` → `someone`.
pub(crate) fn username_from_href(href: &str) -> Option<String> {
    let name = href.trim_start_matches("https://x.com").trim_matches('/');
    (!name.is_empty() && !name.contains('/')).then(|| name.to_string())
}

/// The username captured by the login job.
pub(crate) fn require_username(ctx: &JobContext<'_, XPlatform>) -> Result<String> {
    ctx.progress()
        .username
        .clone()
        .ok_or_else(|| RunnerError::job(ctx.job_type(), &XFailure::UsernameNotFound))
}

impl XPlatform {
    async fn login_job(&self, ctx: &mut JobContext<'_, Self>) -> Result<()> {
        let session = ctx.session;
        self.login(session).await?;

        session.wait_for_selector(PROFILE_LINK, None).await?;
        let username = session
            .dom()
            .get_attribute(PROFILE_LINK, "href")
            .await
            .as_deref()
            .and_then(username_from_href)
            .ok_or_else(|| RunnerError::job(XJobType::Login, &XFailure::UsernameNotFound))?;
        session.log(format!("signed in as @{username}"));

        let mut account = Account::new(session.account_id().clone(), PlatformKind::X);
        account.username = Some(username.clone());
        session
            .capabilities()
            .persistence
            .save_account(&account)
            .await?;

        ctx.progress_mut().username = Some(username);
        ctx.checkpoint().await
    }
}

#[async_trait]
impl Platform for XPlatform {
    type JobType = XJobType;
    type Progress = XProgress;
    type OptionsPage = XOptionsPage;
    type Options = XOptions;

    fn kind(&self) -> PlatformKind {
        PlatformKind::X
    }

    fn options_pages(&self, options: &XOptions) -> Vec<XOptionsPage> {
        options.options_pages()
    }

    fn instructions(&self, step: &WizardStep<XOptionsPage>, options: &XOptions) -> String {
        options.instructions(step)
    }

    fn define_jobs(&self, options: &XOptions) -> Vec<XJobType> {
        options.define_jobs()
    }

    /// Land on the home timeline, waiting for the user to sign in if needed.
    async fn login(&self, session: &AutomationSession) -> Result<()> {
        session.check_internet().await?;
        session
            .load_url_with_rate_limit(LOGIN_URL, &[HOME_URL, LOGIN_FLOW_URL], false)
            .await?;
        if session.current_url().await.starts_with(HOME_URL) {
            return Ok(());
        }
        session.log("waiting for the user to sign in");
        session.wait_for_url(HOME_URL, Some(self.login_timeout)).await
    }

    async fn run_job(&self, ctx: &mut JobContext<'_, Self>) -> Result<()> {
        match ctx.job_type() {
            XJobType::Login => self.login_job(ctx).await,
            XJobType::IndexTweets => index_timeline(self, ctx, Timeline::Tweets).await,
            XJobType::IndexLikes => index_timeline(self, ctx, Timeline::Likes).await,
            XJobType::IndexBookmarks => index_timeline(self, ctx, Timeline::Bookmarks).await,
            XJobType::ArchiveTweets => archive_tweets(ctx).await,
            XJobType::ArchiveBuild => build_archive(ctx).await,
            XJobType::DeleteTweets => delete_items(ctx, DeleteKind::Tweets).await,
            XJobType::DeleteRetweets => delete_items(ctx, DeleteKind::Retweets).await,
            XJobType::DeleteLikes => delete_items(ctx, DeleteKind::Likes).await,
            XJobType::DeleteBookmarks => delete_items(ctx, DeleteKind::Bookmarks).await,
            XJobType::UnfollowEveryone => unfollow_everyone(ctx).await,
        }
    }
}
