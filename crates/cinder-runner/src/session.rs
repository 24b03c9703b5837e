//! Per-account automation session.
//!
//! A session exclusively owns one automation surface. Exactly one job step
//! drives it at a time; nothing here is shared across accounts.

use crate::error::{Result, RunnerError};
use crate::events::{submit_progress_event, AutomationEvent, EventBus};
use crate::log_ring::LogRing;
use crate::pause::PauseController;
use crate::persistence::Persistence;
use crate::platform::Platform;
use crate::rate_limit::{RateLimitMonitor, RateLimitOracle};
use crate::report::{ErrorReport, ReportContext, Reporter};
use crate::retry::{dom_step_retry, network_delete_retry, DeleteOutcome, RetryPolicy};
use crate::state::RunnerState;
use cinder_browser::{BrowserSurface, Dom, DomTiming};
use cinder_core::{AccountId, AutomationSettings, Job, PlatformKind};
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// External collaborators injected into a session.
#[derive(Clone)]
pub struct Capabilities {
    pub persistence: Arc<dyn Persistence>,
    pub rate_limits: Arc<dyn RateLimitOracle>,
    pub events: Arc<dyn EventBus>,
    pub reporter: Arc<dyn Reporter>,
}

impl Capabilities {
    pub fn new(
        persistence: Arc<dyn Persistence>,
        rate_limits: Arc<dyn RateLimitOracle>,
        events: Arc<dyn EventBus>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            persistence,
            rate_limits,
            events,
            reporter,
        }
    }
}

/// Cooperative cancel flag, checked at explicit checkpoints only.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct ReportSlot {
    job_index: Option<usize>,
    job_type: Option<String>,
    state: Option<String>,
}

pub struct AutomationSession {
    account_id: AccountId,
    platform: PlatformKind,
    dom: Dom,
    pause: Arc<PauseController>,
    logs: Arc<LogRing>,
    rate_limits: RateLimitMonitor,
    cancel: CancelHandle,
    settings: AutomationSettings,
    caps: Capabilities,
    slot: Mutex<ReportSlot>,
}

impl AutomationSession {
    pub fn new(
        account_id: AccountId,
        platform: PlatformKind,
        surface: Arc<dyn BrowserSurface>,
        settings: AutomationSettings,
        caps: Capabilities,
    ) -> Self {
        let logs = Arc::new(LogRing::new());
        let pause = Arc::new(PauseController::new(settings.pause_poll_interval));
        let dom = Dom::new(surface)
            .with_timing(DomTiming {
                wait_timeout: settings.wait_for_selector_timeout,
                poll_interval: settings.selector_poll_interval,
            })
            .with_logger(logs.clone());
        let rate_limits = RateLimitMonitor::new(
            caps.rate_limits.clone(),
            account_id.clone(),
            settings.rate_limit_floor,
            pause.clone(),
        );

        Self {
            account_id,
            platform,
            dom,
            pause,
            logs,
            rate_limits,
            cancel: CancelHandle::default(),
            settings,
            caps,
            slot: Mutex::new(ReportSlot::default()),
        }
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    pub fn platform(&self) -> PlatformKind {
        self.platform
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn surface(&self) -> &Arc<dyn BrowserSurface> {
        self.dom.surface()
    }

    pub fn pause_controller(&self) -> &Arc<PauseController> {
        &self.pause
    }

    pub fn logs(&self) -> &Arc<LogRing> {
        &self.logs
    }

    pub fn rate_limits(&self) -> &RateLimitMonitor {
        &self.rate_limits
    }

    pub fn settings(&self) -> &AutomationSettings {
        &self.settings
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        tracing::info!(account_id = %self.account_id, "cancel requested");
        self.cancel.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    pub fn ensure_not_canceled(&self) -> Result<()> {
        if self.is_canceled() {
            Err(RunnerError::Canceled)
        } else {
            Ok(())
        }
    }

    pub(crate) fn reset_cancel(&self) {
        self.cancel.reset();
    }

    pub async fn wait_for_pause(&self) {
        self.pause.wait_for_pause().await;
    }

    /// Write to the log ring and to tracing.
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(account_id = %self.account_id, "{}", message);
        self.logs.push(message);
    }

    /// Run one DOM mutation with a pause check on either side.
    pub async fn between_pauses<T, Fut>(&self, mutation: Fut) -> T
    where
        Fut: Future<Output = T>,
    {
        self.wait_for_pause().await;
        let output = mutation.await;
        self.wait_for_pause().await;
        output
    }

    /// Sleep, honoring a pause on either side.
    pub async fn sleep(&self, duration: Duration) {
        self.wait_for_pause().await;
        tokio::time::sleep(duration).await;
        self.wait_for_pause().await;
    }

    pub async fn check_rate_limit(&self) -> bool {
        self.rate_limits.check_rate_limit().await
    }

    /// Fail with [`RunnerError::InternetDown`] when the surface reports offline.
    pub async fn check_internet(&self) -> Result<()> {
        if self.dom.is_online().await {
            return Ok(());
        }
        self.log("internet connection is down");
        Err(RunnerError::InternetDown)
    }

    /// Current page URL, or an empty string if the surface cannot say.
    pub async fn current_url(&self) -> String {
        self.surface().get_url().await.unwrap_or_default()
    }

    /// Wait for `selector` on the current page with the default or given budget.
    pub async fn wait_for_selector(&self, selector: &str, timeout: Option<Duration>) -> Result<()> {
        let context_url = self.current_url().await;
        self.dom
            .wait_for_selector(selector, &context_url, timeout)
            .await
            .map_err(RunnerError::from)
    }

    /// Network delete with the configured retry policy.
    pub async fn network_delete<F, Fut>(&self, delete: F) -> Result<DeleteOutcome>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<u16>>,
    {
        self.wait_for_pause().await;
        network_delete_retry(
            &self.rate_limits,
            RetryPolicy::network_delete(&self.settings),
            delete,
        )
        .await
    }

    /// UI step with the configured retry policy.
    pub async fn dom_step<T, F, Fut>(&self, label: &str, step: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.wait_for_pause().await;
        dom_step_retry(
            &self.rate_limits,
            RetryPolicy::dom_step(&self.settings),
            label,
            step,
        )
        .await
    }

    pub async fn get_config(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .caps
            .persistence
            .get_config(&self.account_id, key)
            .await?)
    }

    pub async fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.caps
            .persistence
            .set_config(&self.account_id, key, value)
            .await?;
        Ok(())
    }

    pub async fn update_job<J: Display + Clone>(&self, job: &Job<J>) -> Result<()> {
        let stored = job.clone().map_type(|job_type| job_type.to_string());
        self.caps
            .persistence
            .update_job(&self.account_id, &stored)
            .await?;
        Ok(())
    }

    pub(crate) async fn persist_state<P: Platform>(&self, state: &RunnerState<P>) -> Result<()> {
        let value = serde_json::to_value(state)?;
        self.caps
            .persistence
            .save_runner_state(&self.account_id, &value)
            .await?;
        Ok(())
    }

    pub fn emit(&self, name: impl Into<String>, payload: serde_json::Value) {
        self.caps.events.emit(AutomationEvent::new(name, payload));
    }

    /// Publish `submit-progress-<id>` with the serialized progress.
    pub fn emit_progress<T: Serialize>(&self, progress: &T) {
        match serde_json::to_value(progress) {
            Ok(payload) => self.emit(submit_progress_event(&self.account_id), payload),
            Err(e) => tracing::warn!(error = %e, "progress could not be serialized"),
        }
    }

    pub(crate) fn set_report_job(&self, index: Option<usize>, job_type: Option<String>) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.job_index = index;
        slot.job_type = job_type;
    }

    pub(crate) fn set_report_state(&self, state: impl Display) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state = Some(state.to_string());
    }

    /// Hand `err` to the reporter with the current URL, logs and job.
    pub async fn report(&self, err: &RunnerError, recoverable: bool) {
        let current_url = if self.surface().is_available() {
            self.surface().get_url().await.ok()
        } else {
            None
        };
        let (job_index, job_type, state) = {
            let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            (slot.job_index, slot.job_type.clone(), slot.state.clone())
        };

        let report = ErrorReport {
            error_type: err.error_type().to_string(),
            data: err.report_data(),
            context: ReportContext {
                account_id: self.account_id.to_string(),
                platform: self.platform.as_str().to_string(),
                job_index,
                job_type,
                current_url,
                logs: self.logs.entries(),
                state,
            },
            recoverable,
        };
        self.caps.reporter.error(report).await;
    }
}
