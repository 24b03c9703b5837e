//! Unfollow every followed account, one following-page at a time.

use crate::api::{collect_following, unfollow_request};
use crate::delete::{csrf_token, request_status};
use crate::index::wait_for_timeline;
use crate::platform::{require_username, XPlatform};
use crate::selectors;
use cinder_browser::BrowserError;
use cinder_runner::{AutomationSession, DeleteOutcome, JobContext, Result, RunnerError};

async fn visible_user_ids(session: &AutomationSession) -> Result<Vec<String>> {
    session
        .dom()
        .safe_execute_javascript::<Vec<String>>(&collect_following(), Some("collect following"))
        .await
        .map_err(|failure| RunnerError::from(BrowserError::from(failure)))
}

pub(crate) async fn unfollow_everyone(ctx: &mut JobContext<'_, XPlatform>) -> Result<()> {
    let session = ctx.session;
    let job_type = ctx.job_type();
    let username = require_username(ctx)?;
    let url = selectors::following_url(&username);
    session.check_internet().await?;

    loop {
        session.ensure_not_canceled()?;
        session.load_url_with_rate_limit(&url, &[], false).await?;
        wait_for_timeline(session, job_type).await?;
        let ct0 = csrf_token(session, job_type).await?;

        let user_ids = session
            .dom_step("collect following", || visible_user_ids(session))
            .await?;
        if user_ids.is_empty() {
            break;
        }

        let mut unfollowed_any = false;
        for user_id in &user_ids {
            session.ensure_not_canceled()?;
            let script = unfollow_request(user_id, &ct0);
            match session
                .network_delete(|| request_status(session, &script))
                .await?
            {
                DeleteOutcome::Deleted { .. } => {
                    unfollowed_any = true;
                    ctx.progress_mut().accounts_unfollowed += 1;
                }
                DeleteOutcome::Failed { last_status, .. } => {
                    session.log(format!("could not unfollow {user_id} (status {last_status})"));
                    ctx.progress_mut().errors += 1;
                }
            }
            let count = ctx.progress().accounts_unfollowed;
            ctx.set_action_string(format!("Unfollowing everyone ({count} so far)"));
            ctx.checkpoint().await?;
        }

        // Every request on this page failed; reloading would repeat them.
        if !unfollowed_any {
            session.log("no account on the page could be unfollowed, stopping");
            break;
        }
    }
    Ok(())
}
