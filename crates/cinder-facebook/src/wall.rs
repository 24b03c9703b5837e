//! Wall post deletion through the profile's manage-posts dialog.
//!
//! Each round opens the dialog, ticks every listed post, and asks Facebook
//! to delete them. The job ends when the dialog lists nothing to tick.

use crate::failure::FacebookFailure;
use crate::jobs::FacebookJobType;
use crate::platform::FacebookPlatform;
use crate::selectors::{
    DELETE_POSTS_OPTION, DIALOG, DIALOG_CLOSE, DIALOG_RADIO, DONE_BUTTON, MANAGE_POSTS_BUTTON,
    NEXT_BUTTON, PROFILE_URL, SELECT_DIALOG_POSTS,
};
use cinder_runner::{AutomationSession, JobContext, Result, RunnerError};

fn failure(kind: FacebookFailure) -> RunnerError {
    RunnerError::job(FacebookJobType::DeleteWallPosts, &kind)
}

async fn click(session: &AutomationSession, xpath: &str) -> bool {
    session
        .between_pauses(session.dom().click_element_by_xpath(xpath))
        .await
}

async fn open_manage_posts(session: &AutomationSession) -> Result<()> {
    if !click(session, MANAGE_POSTS_BUTTON).await {
        return Err(failure(FacebookFailure::ManagePostsButtonNotClicked));
    }
    match session.wait_for_selector(DIALOG, None).await {
        Err(RunnerError::Timeout { .. }) => Err(failure(FacebookFailure::DialogDidNotAppear)),
        other => other,
    }
}

async fn confirm_delete(session: &AutomationSession) -> Result<()> {
    if !click(session, NEXT_BUTTON).await {
        return Err(failure(FacebookFailure::DialogDidNotAppear));
    }

    let url = session.current_url().await;
    session
        .dom()
        .wait_for_selector_within_selector(DIALOG, DIALOG_RADIO, &url, None)
        .await
        .map_err(|_| failure(FacebookFailure::DialogDidNotAppear))?;

    if !click(session, DELETE_POSTS_OPTION).await || !click(session, DONE_BUTTON).await {
        return Err(failure(FacebookFailure::DialogDidNotAppear));
    }
    Ok(())
}

pub(crate) async fn delete_wall_posts(
    platform: &FacebookPlatform,
    ctx: &mut JobContext<'_, FacebookPlatform>,
) -> Result<()> {
    let session = ctx.session;
    session.check_internet().await?;

    loop {
        session.ensure_not_canceled()?;
        session
            .load_url_with_rate_limit(PROFILE_URL, &[], true)
            .await?;
        session
            .dom_step("open manage posts", || open_manage_posts(session))
            .await?;

        let select = session
            .dom()
            .safe_execute_javascript::<Option<u64>>(SELECT_DIALOG_POSTS, Some("select posts"));
        let selected = session
            .between_pauses(select)
            .await
            .ok()
            .flatten()
            .unwrap_or(0);
        tracing::debug!(selected, "posts selected in manage-posts dialog");
        if selected == 0 {
            let close = session
                .dom()
                .click_element_within_selector(DIALOG, DIALOG_CLOSE);
            session.between_pauses(close).await;
            session.log("manage-posts dialog is empty");
            break;
        }

        session
            .dom_step("delete selected posts", || confirm_delete(session))
            .await?;

        let progress = ctx.progress_mut();
        progress.wall_posts_deleted += selected;
        progress.delete_rounds += 1;
        let deleted = progress.wall_posts_deleted;
        session.log(format!("deleted {selected} posts ({deleted} so far)"));
        ctx.set_action_string(format!("Deleting your wall posts ({deleted} so far)"));
        ctx.checkpoint().await?;

        session.sleep(platform.round_pause).await;
    }
    Ok(())
}
