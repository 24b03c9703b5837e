//! In-page scripts: timeline scraping and authenticated API requests.
//!
//! Requests run inside the page with `fetch` so they carry the signed-in
//! session's cookies. Each request script resolves to the HTTP status, or
//! `0` when the request could not be made at all.

use crate::selectors::UNFOLLOW_BUTTON;
use cinder_browser::script::js_string;
use serde_json::{json, Value};

/// Bearer token the X web client sends with every API call.
const WEB_BEARER_TOKEN: &str = "AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";

const GRAPHQL_BASE: &str = "https://x.com/i/api/graphql";
const FRIENDSHIPS_DESTROY_URL: &str = "https://x.com/i/api/1.1/friendships/destroy.json";

/// A GraphQL mutation the delete jobs issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    DeleteTweet,
    DeleteRetweet,
    UnfavoriteTweet,
    DeleteBookmark,
}

impl Mutation {
    fn name(self) -> &'static str {
        match self {
            Self::DeleteTweet => "DeleteTweet",
            Self::DeleteRetweet => "DeleteRetweet",
            Self::UnfavoriteTweet => "UnfavoriteTweet",
            Self::DeleteBookmark => "DeleteBookmark",
        }
    }

    fn query_id(self) -> &'static str {
        match self {
            Self::DeleteTweet => "VaenaVgh5q5ih7kvyVjgtg",
            Self::DeleteRetweet => "iQtK4dl5hBmXewYZuEOKVw",
            Self::UnfavoriteTweet => "ZYKSe-w7KEslx3JhSIk5LA",
            Self::DeleteBookmark => "Wlmlj2-xzyS1GN3a6cj-mQ",
        }
    }

    fn variables(self, tweet_id: &str) -> Value {
        match self {
            Self::DeleteRetweet => json!({ "source_tweet_id": tweet_id, "dark_request": false }),
            Self::DeleteTweet => json!({ "tweet_id": tweet_id, "dark_request": false }),
            Self::UnfavoriteTweet | Self::DeleteBookmark => json!({ "tweet_id": tweet_id }),
        }
    }

    pub fn url(self) -> String {
        format!("{GRAPHQL_BASE}/{}/{}", self.query_id(), self.name())
    }
}

fn headers(ct0: &str, content_type: &str) -> String {
    json!({
        "authorization": format!("Bearer {WEB_BEARER_TOKEN}"),
        "content-type": content_type,
        "x-csrf-token": ct0,
        "x-twitter-active-user": "yes",
        "x-twitter-auth-type": "OAuth2Session",
    })
    .to_string()
}

fn post_status(url: &str, headers: &str, body: &str) -> String {
    format!(
        "(async () => {{ try {{ const r = await fetch({}, {{ method: 'POST', credentials: 'include', headers: {}, body: {} }}); return r.status; }} catch (e) {{ return 0; }} }})()",
        js_string(url),
        headers,
        js_string(body)
    )
}

/// Script issuing `mutation` for `tweet_id`.
pub fn mutation_request(mutation: Mutation, tweet_id: &str, ct0: &str) -> String {
    let body = json!({
        "variables": mutation.variables(tweet_id),
        "queryId": mutation.query_id(),
    });
    post_status(
        &mutation.url(),
        &headers(ct0, "application/json"),
        &body.to_string(),
    )
}

/// Script unfollowing the account with `user_id`.
pub fn unfollow_request(user_id: &str, ct0: &str) -> String {
    post_status(
        FRIENDSHIPS_DESTROY_URL,
        &headers(ct0, "application/x-www-form-urlencoded"),
        &format!("user_id={user_id}"),
    )
}

/// Collects every rendered post as `{id, text, isRetweet}`.
pub const COLLECT_TIMELINE: &str = r#"(() => {
  const out = [];
  for (const article of document.querySelectorAll('article[data-testid="tweet"]')) {
    const link = [...article.querySelectorAll('a[href*="/status/"]')].find(a => a.querySelector('time'));
    if (!link) continue;
    const match = link.getAttribute('href').match(/\/status\/(\d+)/);
    if (!match) continue;
    const text = article.querySelector('[data-testid="tweetText"]');
    out.push({
      id: match[1],
      text: text ? text.textContent : '',
      isRetweet: article.querySelector('[data-testid="socialContext"]') !== null,
    });
  }
  return out;
})()"#;

/// Collects the user ids behind every rendered unfollow button.
pub fn collect_following() -> String {
    format!(
        "[...document.querySelectorAll({})].map(b => b.getAttribute('data-testid').replace(/-unfollow$/, ''))",
        js_string(UNFOLLOW_BUTTON)
    )
}
