//! Navigation guard and URL waits.

use crate::error::{Result, RunnerError};
use crate::session::AutomationSession;
use cinder_browser::{poll_until, strip_query};
use regex::Regex;
use std::time::Duration;

/// Whether `actual` is an acceptable landing page for a load of `requested`.
///
/// Query strings are ignored. `expected` entries match as prefixes, or as
/// globs when they contain `*`.
pub fn url_matches(requested: &str, expected: &[&str], actual: &str) -> bool {
    let actual = strip_query(actual);
    if actual == strip_query(requested) {
        return true;
    }
    expected
        .iter()
        .any(|pattern| pattern_matches(pattern, &actual))
}

fn pattern_matches(pattern: &str, actual: &str) -> bool {
    if !pattern.contains('*') {
        return actual.starts_with(&strip_query(pattern));
    }
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    match Regex::new(&format!("^{body}")) {
        Ok(re) => re.is_match(actual),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "unusable URL pattern");
            false
        }
    }
}

impl AutomationSession {
    /// Load `url`, verify where it landed, then honor any rate limit.
    ///
    /// Unless `redirect_ok`, landing anywhere but `url` or one of
    /// `expected_urls` raises [`RunnerError::UrlChanged`]. If a rate-limit
    /// wait happens after the load, the whole load is repeated, redirect
    /// check included.
    pub async fn load_url_with_rate_limit(
        &self,
        url: &str,
        expected_urls: &[&str],
        redirect_ok: bool,
    ) -> Result<()> {
        loop {
            self.wait_for_pause().await;
            self.log(format!("loading {url}"));
            self.surface().load_url(url).await?;
            self.wait_for_pause().await;

            if !redirect_ok {
                let actual = self.surface().get_url().await?;
                if !url_matches(url, expected_urls, &actual) {
                    self.log(format!("expected {url}, landed on {actual}"));
                    return Err(RunnerError::UrlChanged {
                        expected: url.to_string(),
                        actual,
                        valid_alternatives: expected_urls
                            .iter()
                            .map(|u| (*u).to_string())
                            .collect(),
                    });
                }
            }

            if self.check_rate_limit().await {
                self.log(format!("rate limited after loading {url}, reloading"));
                continue;
            }
            return Ok(());
        }
    }

    /// Wait until the page URL starts with `prefix`.
    ///
    /// The cancel flag is checked before and after every URL read.
    pub async fn wait_for_url(&self, prefix: &str, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.unwrap_or(self.settings().wait_for_url_timeout);
        let interval = self.settings().url_poll_interval;
        tracing::debug!(prefix, ?timeout, "waiting for url");

        let outcome = poll_until(
            move || async move {
                if self.is_canceled() {
                    return Some(Err(RunnerError::Canceled));
                }
                let url = self.current_url().await;
                if self.is_canceled() {
                    return Some(Err(RunnerError::Canceled));
                }
                url.starts_with(prefix).then_some(Ok(()))
            },
            interval,
            timeout,
        )
        .await;

        match outcome {
            Ok(result) => result,
            Err(_) => Err(RunnerError::Timeout {
                selector: format!("url {prefix}"),
                context_url: self.current_url().await,
            }),
        }
    }
}
