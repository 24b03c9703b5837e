//! DOM automation protocol.
//!
//! [`Dom::safe_execute_javascript`] is the only path to the page. It fails
//! closed when the surface is gone and turns every evaluation error into a
//! [`ScriptFailure`] value. The click, existence-check, scroll and wait
//! primitives are stateless queries built on top of it.

use crate::error::{BrowserError, Result, ScriptFailure};
use crate::script;
use crate::surface::{BrowserSurface, InputEvent};
use crate::wait::poll_until_true;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Receives script failures that carry a log context.
pub trait ScriptLogger: Send + Sync {
    fn log_failure(&self, context: &str, message: &str);
}

/// Timing defaults for the wait primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomTiming {
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for DomTiming {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_millis(5000),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// DOM primitives over a shared automation surface.
#[derive(Clone)]
pub struct Dom {
    surface: Arc<dyn BrowserSurface>,
    timing: DomTiming,
    logger: Option<Arc<dyn ScriptLogger>>,
}

impl Dom {
    pub fn new(surface: Arc<dyn BrowserSurface>) -> Self {
        Self {
            surface,
            timing: DomTiming::default(),
            logger: None,
        }
    }

    #[must_use]
    pub fn with_timing(mut self, timing: DomTiming) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn ScriptLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn surface(&self) -> &Arc<dyn BrowserSurface> {
        &self.surface
    }

    pub fn timing(&self) -> DomTiming {
        self.timing
    }

    /// Evaluate `script` and decode its value as `T`.
    ///
    /// Never returns an error through any other channel: an unavailable
    /// surface, a thrown exception and an undecodable value all come back as
    /// `Err(ScriptFailure)`. With a `log_context`, failures are also handed to
    /// the logger.
    pub async fn safe_execute_javascript<T: DeserializeOwned>(
        &self,
        script: &str,
        log_context: Option<&str>,
    ) -> std::result::Result<T, ScriptFailure> {
        let outcome = self.execute_unchecked(script).await;
        if let (Err(failure), Some(context)) = (&outcome, log_context) {
            tracing::warn!(context, error = %failure, "script execution failed");
            if let Some(logger) = &self.logger {
                logger.log_failure(context, &failure.message);
            }
        }
        outcome
    }

    async fn execute_unchecked<T: DeserializeOwned>(
        &self,
        script: &str,
    ) -> std::result::Result<T, ScriptFailure> {
        if !self.surface.is_available() {
            return Err(ScriptFailure::new("automation surface is unavailable"));
        }
        let value = self
            .surface
            .execute_javascript(script)
            .await
            .map_err(|e| ScriptFailure::new(e.to_string()))?;
        serde_json::from_value(value)
            .map_err(|e| ScriptFailure::new(format!("unexpected script result: {e}")))
    }

    /// Read a boolean script result, treating every failure as `false`.
    async fn read_flag(&self, script: &str) -> bool {
        self.safe_execute_javascript::<Option<bool>>(script, None)
            .await
            .ok()
            .flatten()
            .unwrap_or(false)
    }

    pub async fn click_element_by_selector(&self, selector: &str) -> bool {
        let clicked = self.read_flag(&script::click_selector(selector)).await;
        tracing::debug!(selector, clicked, "click by selector");
        clicked
    }

    pub async fn click_element_by_xpath(&self, xpath: &str) -> bool {
        let clicked = self.read_flag(&script::click_xpath(xpath)).await;
        tracing::debug!(xpath, clicked, "click by xpath");
        clicked
    }

    pub async fn click_element_within_selector(&self, outer: &str, inner: &str) -> bool {
        self.read_flag(&script::click_within_selector(outer, inner))
            .await
    }

    pub async fn does_selector_exist(&self, selector: &str) -> bool {
        self.read_flag(&script::selector_exists(selector)).await
    }

    pub async fn does_selector_within_selector_exist(&self, outer: &str, inner: &str) -> bool {
        self.read_flag(&script::selector_within_selector_exists(outer, inner))
            .await
    }

    pub async fn count_selectors_found(&self, selector: &str) -> usize {
        self.safe_execute_javascript::<Option<usize>>(&script::count_selector(selector), None)
            .await
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    /// Poll until `selector` matches, or fail with a timeout naming it.
    pub async fn wait_for_selector(
        &self,
        selector: &str,
        context_url: &str,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let timeout = timeout.unwrap_or(self.timing.wait_timeout);
        poll_until_true(
            || self.does_selector_exist(selector),
            self.timing.poll_interval,
            timeout,
        )
        .await
        .map_err(|_| {
            tracing::info!(selector, context_url, ?timeout, "selector wait timed out");
            BrowserError::SelectorTimeout {
                selector: selector.to_string(),
                context_url: context_url.to_string(),
            }
        })
    }

    /// Poll until `inner` matches inside the first element matching `outer`.
    pub async fn wait_for_selector_within_selector(
        &self,
        outer: &str,
        inner: &str,
        context_url: &str,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let timeout = timeout.unwrap_or(self.timing.wait_timeout);
        poll_until_true(
            || self.does_selector_within_selector_exist(outer, inner),
            self.timing.poll_interval,
            timeout,
        )
        .await
        .map_err(|_| BrowserError::SelectorTimeout {
            selector: format!("{outer} {inner}"),
            context_url: context_url.to_string(),
        })
    }

    pub async fn scroll_to_bottom(&self) -> bool {
        self.read_flag(script::SCROLL_TO_BOTTOM).await
    }

    pub async fn scroll_to_top(&self) -> bool {
        self.read_flag(script::SCROLL_TO_TOP).await
    }

    pub async fn get_text(&self, selector: &str) -> Option<String> {
        self.safe_execute_javascript::<Option<String>>(&script::text_of(selector), None)
            .await
            .ok()
            .flatten()
    }

    pub async fn get_attribute(&self, selector: &str, name: &str) -> Option<String> {
        self.safe_execute_javascript::<Option<String>>(&script::attribute_of(selector, name), None)
            .await
            .ok()
            .flatten()
    }

    /// Read a non-HttpOnly cookie through `document.cookie`.
    pub async fn get_cookie(&self, name: &str) -> Option<String> {
        self.safe_execute_javascript::<Option<String>>(&script::cookie(name), Some("get_cookie"))
            .await
            .ok()
            .flatten()
            .filter(|value| !value.is_empty())
    }

    pub async fn document_language(&self) -> Option<String> {
        self.safe_execute_javascript::<Option<String>>(script::DOCUMENT_LANGUAGE, None)
            .await
            .ok()
            .flatten()
            .filter(|lang| !lang.is_empty())
    }

    /// `navigator.onLine`; an unreachable surface counts as offline.
    pub async fn is_online(&self) -> bool {
        self.read_flag(script::IS_ONLINE).await
    }

    /// Focus `selector` and type `text` one character event at a time.
    pub async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        if !self.read_flag(&script::focus_selector(selector)).await {
            return Err(BrowserError::SelectorNotFound(selector.to_string()));
        }
        for ch in text.chars() {
            self.surface
                .send_input_event(InputEvent::Char { text: ch })
                .await?;
        }
        Ok(())
    }

    pub async fn press_key(&self, key: &str) -> Result<()> {
        self.surface
            .send_input_event(InputEvent::KeyDown {
                key: key.to_string(),
            })
            .await?;
        self.surface
            .send_input_event(InputEvent::KeyUp {
                key: key.to_string(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeSurface;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl ScriptLogger for Collect {
        fn log_failure(&self, context: &str, message: &str) {
            self.0
                .lock()
                .unwrap()
                .push(format!("{context}: {message}"));
        }
    }

    fn dom_with(surface: &Arc<FakeSurface>) -> Dom {
        Dom::new(surface.clone()).with_timing(DomTiming {
            wait_timeout: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(100),
        })
    }

    #[tokio::test]
    async fn test_safe_execute_decodes_value() {
        let surface = Arc::new(FakeSurface::new("https://x.com/home"));
        surface.respond("answer", json!({"n": 42}));
        let dom = dom_with(&surface);

        let value: serde_json::Value = dom
            .safe_execute_javascript("answer()", None)
            .await
            .expect("script succeeds");
        assert_eq!(value["n"], 42);
    }

    #[tokio::test]
    async fn test_safe_execute_converts_exceptions_and_logs_with_context() {
        let surface = Arc::new(FakeSurface::new("https://x.com/home"));
        surface.throw_on("boom", "TypeError: boom is not a function");
        let logger = Arc::new(Collect::default());
        let dom = dom_with(&surface).with_logger(logger.clone());

        let silent = dom.safe_execute_javascript::<bool>("boom()", None).await;
        assert!(silent.is_err());
        assert!(logger.0.lock().unwrap().is_empty());

        let logged = dom
            .safe_execute_javascript::<bool>("boom()", Some("delete_post"))
            .await;
        let failure = logged.expect_err("exception becomes a failure");
        assert!(failure.message.contains("TypeError"));
        assert_eq!(logger.0.lock().unwrap().len(), 1);
        assert!(logger.0.lock().unwrap()[0].starts_with("delete_post: "));
    }

    #[tokio::test]
    async fn test_safe_execute_fails_closed_when_torn_down() {
        let surface = Arc::new(FakeSurface::new("https://x.com/home"));
        surface.respond("1", json!(1));
        surface.tear_down();
        let dom = dom_with(&surface);

        let result = dom.safe_execute_javascript::<u32>("1", None).await;
        assert!(result.is_err());
        assert!(surface.executed_scripts().is_empty());
    }

    #[tokio::test]
    async fn test_safe_execute_rejects_wrong_type() {
        let surface = Arc::new(FakeSurface::new("https://x.com/home"));
        surface.respond("name", json!("alice"));
        let dom = dom_with(&surface);

        let result = dom.safe_execute_javascript::<u32>("name", None).await;
        assert!(result
            .expect_err("string is not a number")
            .message
            .contains("unexpected script result"));
    }

    #[tokio::test]
    async fn test_click_and_count_primitives() {
        let surface = Arc::new(FakeSurface::new("https://x.com/home"));
        surface.respond("el.click()", json!(true));
        surface.respond("querySelectorAll", json!(7));
        let dom = dom_with(&surface);

        assert!(dom.click_element_by_selector("button").await);
        assert!(dom.click_element_by_xpath("//button").await);
        assert_eq!(dom.count_selectors_found("article").await, 7);
    }

    #[tokio::test]
    async fn test_flag_reads_treat_null_as_false() {
        let surface = Arc::new(FakeSurface::new("https://x.com/home"));
        let dom = dom_with(&surface);

        assert!(!dom.does_selector_exist("#missing").await);
        assert_eq!(dom.count_selectors_found("article").await, 0);
        assert_eq!(dom.get_text("h1").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_selector_succeeds_when_element_appears() {
        let surface = Arc::new(FakeSurface::new("https://x.com/home"));
        surface.respond_sequence(
            "!== null",
            vec![json!(false), json!(false), json!(true)],
        );
        let dom = dom_with(&surface);

        dom.wait_for_selector("div[role=dialog]", "https://x.com/home", None)
            .await
            .expect("selector eventually appears");
        assert_eq!(surface.scripts_containing("div[role=dialog]"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_selector_timeout_carries_selector() {
        let surface = Arc::new(FakeSurface::new("https://x.com/home"));
        let dom = dom_with(&surface);

        let err = dom
            .wait_for_selector(
                "div[role=dialog]",
                "https://x.com/home",
                Some(Duration::from_millis(300)),
            )
            .await
            .expect_err("never appears");
        match err {
            BrowserError::SelectorTimeout {
                selector,
                context_url,
            } => {
                assert_eq!(selector, "div[role=dialog]");
                assert_eq!(context_url, "https://x.com/home");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_type_into_sends_char_events() {
        let surface = Arc::new(FakeSurface::new("https://x.com/home"));
        surface.respond("el.focus()", json!(true));
        let dom = dom_with(&surface);

        dom.type_into("input", "hi").await.expect("type");
        assert_eq!(
            surface.input_events(),
            vec![InputEvent::Char { text: 'h' }, InputEvent::Char { text: 'i' }]
        );
    }

    #[tokio::test]
    async fn test_type_into_missing_input() {
        let surface = Arc::new(FakeSurface::new("https://x.com/home"));
        let dom = dom_with(&surface);
        assert!(matches!(
            dom.type_into("input", "hi").await,
            Err(BrowserError::SelectorNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_cookie_ignores_empty_values() {
        let surface = Arc::new(FakeSurface::new("https://x.com/home"));
        surface.respond("document.cookie", json!(""));
        let dom = dom_with(&surface);
        assert_eq!(dom.get_cookie("ct0").await, None);

        surface.respond("document.cookie", json!("abc123"));
        assert_eq!(dom.get_cookie("ct0").await.as_deref(), Some("abc123"));
    }
}
