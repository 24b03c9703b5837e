//! The Facebook job table.

use crate::jobs::FacebookJobType;
use crate::language::{restore_user_lang, save_user_lang, set_lang_to_english};
use crate::options::{FacebookOptions, FacebookOptionsPage};
use crate::progress::FacebookProgress;
use crate::selectors::{HOME_URL, SIGNED_IN_BANNER};
use crate::wall::delete_wall_posts;
use async_trait::async_trait;
use cinder_core::{Account, PlatformKind};
use cinder_runner::{AutomationSession, JobContext, Platform, Result, WizardStep};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FacebookPlatform {
    /// How long to wait for the user to finish signing in
    pub login_timeout: Duration,
    /// Pause between manage-posts rounds
    pub round_pause: Duration,
}

impl Default for FacebookPlatform {
    fn default() -> Self {
        Self {
            login_timeout: Duration::from_secs(300),
            round_pause: Duration::from_secs(1),
        }
    }
}

#[async_trait]
impl Platform for FacebookPlatform {
    type JobType = FacebookJobType;
    type Progress = FacebookProgress;
    type OptionsPage = FacebookOptionsPage;
    type Options = FacebookOptions;

    fn kind(&self) -> PlatformKind {
        PlatformKind::Facebook
    }

    fn options_pages(&self, _options: &FacebookOptions) -> Vec<FacebookOptionsPage> {
        vec![FacebookOptionsPage::Delete]
    }

    fn instructions(
        &self,
        step: &WizardStep<FacebookOptionsPage>,
        options: &FacebookOptions,
    ) -> String {
        options.instructions(step)
    }

    fn define_jobs(&self, options: &FacebookOptions) -> Vec<FacebookJobType> {
        options.define_jobs()
    }

    async fn login(&self, session: &AutomationSession) -> Result<()> {
        session.check_internet().await?;
        session.load_url_with_rate_limit(HOME_URL, &[], true).await?;
        if session.dom().does_selector_exist(SIGNED_IN_BANNER).await {
            return Ok(());
        }
        session.log("waiting for the user to sign in");
        session
            .wait_for_selector(SIGNED_IN_BANNER, Some(self.login_timeout))
            .await
    }

    async fn run_job(&self, ctx: &mut JobContext<'_, Self>) -> Result<()> {
        match ctx.job_type() {
            FacebookJobType::Login => {
                let session = ctx.session;
                self.login(session).await?;
                session
                    .capabilities()
                    .persistence
                    .save_account(&Account::new(
                        session.account_id().clone(),
                        PlatformKind::Facebook,
                    ))
                    .await?;
                ctx.checkpoint().await
            }
            FacebookJobType::SaveUserLang => save_user_lang(ctx).await,
            FacebookJobType::SetLangToEnglish => set_lang_to_english(ctx).await,
            FacebookJobType::DeleteWallPosts => delete_wall_posts(self, ctx).await,
            FacebookJobType::RestoreUserLang => restore_user_lang(ctx).await,
        }
    }
}
