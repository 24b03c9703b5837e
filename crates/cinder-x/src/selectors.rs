//! X page locations and DOM selectors.

pub const LOGIN_URL: &str = "https://x.com/login";
pub const LOGIN_FLOW_URL: &str = "https://x.com/i/flow/login";
pub const HOME_URL: &str = "https://x.com/home";
pub const BOOKMARKS_URL: &str = "https://x.com/i/bookmarks";

pub const PRIMARY_COLUMN: &str = r#"[data-testid="primaryColumn"]"#;
pub const TWEET_ARTICLE: &str = r#"article[data-testid="tweet"]"#;
pub const TWEET_TEXT: &str = r#"article[data-testid="tweet"] [data-testid="tweetText"]"#;
pub const TWEET_TIME: &str = r#"article[data-testid="tweet"] time"#;
pub const PROFILE_LINK: &str = r#"a[data-testid="AppTabBar_Profile_Link"]"#;
pub const UNFOLLOW_BUTTON: &str = r#"[data-testid$="-unfollow"]"#;

/// Profile timeline, replies included.
pub fn tweets_url(username: &str) -> String {
    format!("https://x.com/{username}/with_replies")
}

pub fn likes_url(username: &str) -> String {
    format!("https://x.com/{username}/likes")
}

pub fn following_url(username: &str) -> String {
    format!("https://x.com/{username}/following")
}

pub fn status_url(username: &str, id: &str) -> String {
    format!("https://x.com/{username}/status/{id}")
}
