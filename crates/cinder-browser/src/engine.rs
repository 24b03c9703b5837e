use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use crate::surface::{BrowserSurface, InputEvent};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Called with the `x-rate-limit-reset` epoch seconds (if present) whenever a
/// response comes back with HTTP 429.
pub type RateLimitSink = Arc<dyn Fn(Option<i64>) + Send + Sync>;

/// Chromium-backed automation surface.
pub struct ChromiumSurface {
    browser: Mutex<Browser>,
    page: Page,
    fingerprint: FingerprintConfig,
    navigation_timeout: Duration,
    closed: Arc<AtomicBool>,
}

impl ChromiumSurface {
    /// Launch Chromium with a randomized fingerprint sized from `config`.
    pub async fn launch(config: &cinder_core::BrowserConfig) -> Result<Self> {
        let fingerprint =
            FingerprintConfig::randomized().with_viewport(config.window_width, config.window_height);
        Self::with_fingerprint(config, fingerprint).await
    }

    /// Launch Chromium with a specific fingerprint.
    pub async fn with_fingerprint(
        config: &cinder_core::BrowserConfig,
        fingerprint: FingerprintConfig,
    ) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .args(fingerprint.launch_args());
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder
            .build()
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        let closed = Arc::new(AtomicBool::new(false));
        let handler_closed = closed.clone();
        // The CDP connection lives exactly as long as this task
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {}", e);
                }
            }
            handler_closed.store(true, Ordering::SeqCst);
            tracing::info!("browser handler finished, surface torn down");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        tracing::info!(
            headless = config.headless,
            width = fingerprint.viewport_width,
            height = fingerprint.viewport_height,
            "chromium surface launched"
        );

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            fingerprint,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            closed,
        })
    }

    pub fn fingerprint(&self) -> &FingerprintConfig {
        &self.fingerprint
    }

    /// Watch network responses and report 429s to `sink`.
    ///
    /// This is how the rate-limit oracle is populated out of band; the
    /// runtime never inspects responses itself.
    pub async fn observe_rate_limits(&self, sink: RateLimitSink) -> Result<()> {
        let mut responses = self
            .page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;

        tokio::spawn(async move {
            while let Some(event) = responses.next().await {
                if event.response.status != 429 {
                    continue;
                }
                let reset = event
                    .response
                    .headers
                    .inner()
                    .get("x-rate-limit-reset")
                    .and_then(|v| match v {
                        serde_json::Value::String(s) => s.parse::<i64>().ok(),
                        other => other.as_i64(),
                    });
                tracing::warn!(url = %event.response.url, ?reset, "rate limited response observed");
                sink(reset);
            }
        });
        Ok(())
    }

    /// Close the browser. The surface reports unavailable afterwards.
    pub async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    async fn dispatch_key(&self, kind: DispatchKeyEventType, key: String) -> Result<()> {
        let params = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(key)
            .build()
            .map_err(BrowserError::InputError)?;
        self.page
            .execute(params)
            .await
            .map_err(|e| BrowserError::InputError(e.to_string()))?;
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(BrowserError::SurfaceUnavailable)
        }
    }
}

#[async_trait::async_trait]
impl BrowserSurface for ChromiumSurface {
    async fn load_url(&self, url: &str) -> Result<()> {
        self.ensure_open()?;
        tracing::debug!(url, "loading url");
        let navigation = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
            Ok::<(), BrowserError>(())
        };
        tokio::time::timeout(self.navigation_timeout, navigation)
            .await
            .map_err(|_| {
                BrowserError::NavigationError(format!(
                    "{url}: no load after {:?}",
                    self.navigation_timeout
                ))
            })?
    }

    async fn get_url(&self) -> Result<String> {
        self.ensure_open()?;
        let url = self
            .page
            .url()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn execute_javascript(&self, script: &str) -> Result<serde_json::Value> {
        self.ensure_open()?;
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::ScriptError(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn send_input_event(&self, event: InputEvent) -> Result<()> {
        self.ensure_open()?;
        match event {
            InputEvent::Char { text } => {
                let params = DispatchKeyEventParams::builder()
                    .r#type(DispatchKeyEventType::Char)
                    .text(text.to_string())
                    .build()
                    .map_err(BrowserError::InputError)?;
                self.page
                    .execute(params)
                    .await
                    .map_err(|e| BrowserError::InputError(e.to_string()))?;
            }
            InputEvent::KeyDown { key } => {
                self.dispatch_key(DispatchKeyEventType::KeyDown, key).await?;
            }
            InputEvent::KeyUp { key } => {
                self.dispatch_key(DispatchKeyEventType::KeyUp, key).await?;
            }
            InputEvent::MouseClick { x, y } => {
                #[allow(clippy::cast_precision_loss)]
                let (x, y) = (x as f64, y as f64);
                for kind in [
                    DispatchMouseEventType::MousePressed,
                    DispatchMouseEventType::MouseReleased,
                ] {
                    let params = DispatchMouseEventParams::builder()
                        .r#type(kind)
                        .x(x)
                        .y(y)
                        .button(MouseButton::Left)
                        .click_count(1)
                        .build()
                        .map_err(BrowserError::InputError)?;
                    self.page
                        .execute(params)
                        .await
                        .map_err(|e| BrowserError::InputError(e.to_string()))?;
                }
            }
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}
