//! Archive capture and the archive-built hand-off.

use crate::platform::{require_username, XPlatform};
use crate::progress::ArchivedTweet;
use crate::selectors::{self, TWEET_ARTICLE, TWEET_TEXT, TWEET_TIME};
use cinder_core::Timestamp;
use cinder_runner::{archive_built_event, JobContext, Result, RunnerError};
use serde_json::json;

/// Visit each indexed post that is not archived yet and capture its page.
pub(crate) async fn archive_tweets(ctx: &mut JobContext<'_, XPlatform>) -> Result<()> {
    let session = ctx.session;
    let username = require_username(ctx)?;

    let pending: Vec<_> = ctx
        .progress()
        .tweets
        .values()
        .filter(|t| !t.is_retweet && !ctx.progress().archived_tweets.contains_key(&t.id))
        .cloned()
        .collect();
    session.log(format!("{} posts left to archive", pending.len()));

    for (n, tweet) in pending.iter().enumerate() {
        session.ensure_not_canceled()?;
        let url = selectors::status_url(&username, &tweet.id);
        session.load_url_with_rate_limit(&url, &[], true).await?;

        let archived = match session.wait_for_selector(TWEET_ARTICLE, None).await {
            Ok(()) => ArchivedTweet {
                id: tweet.id.clone(),
                url,
                text: session
                    .dom()
                    .get_text(TWEET_TEXT)
                    .await
                    .unwrap_or_else(|| tweet.text.clone()),
                created_at: session.dom().get_attribute(TWEET_TIME, "datetime").await,
            },
            Err(RunnerError::Timeout { .. }) => {
                session.log(format!(
                    "post {} did not render, keeping indexed text",
                    tweet.id
                ));
                ArchivedTweet {
                    id: tweet.id.clone(),
                    url,
                    text: tweet.text.clone(),
                    created_at: None,
                }
            }
            Err(e) => return Err(e),
        };

        ctx.progress_mut()
            .archived_tweets
            .insert(archived.id.clone(), archived);
        ctx.set_action_string(format!("Archiving your tweets ({}/{})", n + 1, pending.len()));
        ctx.checkpoint().await?;
    }
    Ok(())
}

/// Assemble the archive and hand it to whoever writes it out.
pub(crate) async fn build_archive(ctx: &mut JobContext<'_, XPlatform>) -> Result<()> {
    let session = ctx.session;
    let progress = ctx.progress();

    let tweets: Vec<_> = progress
        .tweets
        .values()
        .filter(|t| !t.is_retweet)
        .map(|t| match progress.archived_tweets.get(&t.id) {
            Some(archived) => json!(archived),
            None => json!({ "id": t.id, "text": t.text }),
        })
        .collect();
    let post_count = tweets.len();
    let archive = json!({
        "username": progress.username,
        "builtAt": Timestamp::now().to_rfc3339(),
        "tweets": tweets,
        "retweets": progress.tweet_ids(true),
        "likes": progress.likes,
        "bookmarks": progress.bookmarks,
    });

    session.log(format!("archive built with {post_count} posts"));
    session.emit(archive_built_event(session.account_id()), archive);

    ctx.progress_mut().archive_built = true;
    ctx.checkpoint().await
}
