//! Out-of-band rate-limit detection and timed backoff.

use crate::pause::PauseController;
use async_trait::async_trait;
use cinder_browser::RateLimitSink;
use cinder_core::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Rate-limit state observed for an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub is_rate_limited: bool,
    /// Epoch seconds at which the platform lifts the limit
    pub rate_limit_reset: i64,
}

/// Source of truth for whether an account is currently rate limited.
#[async_trait]
pub trait RateLimitOracle: Send + Sync {
    async fn is_rate_limited(&self, account_id: &AccountId) -> RateLimitInfo;

    async fn reset_rate_limit_info(&self, account_id: &AccountId);
}

/// Oracle fed by the surface's network observer.
#[derive(Debug, Default)]
pub struct SharedRateLimitOracle {
    infos: Mutex<HashMap<AccountId, RateLimitInfo>>,
    resets: AtomicUsize,
}

impl SharedRateLimitOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a limit. Without a reset time the monitor's floor applies.
    pub fn mark_rate_limited(&self, account_id: &AccountId, reset: Option<i64>) {
        self.lock().insert(
            account_id.clone(),
            RateLimitInfo {
                is_rate_limited: true,
                rate_limit_reset: reset.unwrap_or(0),
            },
        );
    }

    /// Number of `reset_rate_limit_info` calls seen.
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    /// Callback to hand to `ChromiumSurface::observe_rate_limits`.
    pub fn sink(self: &Arc<Self>, account_id: AccountId) -> RateLimitSink {
        let oracle = Arc::clone(self);
        Arc::new(move |reset| oracle.mark_rate_limited(&account_id, reset))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AccountId, RateLimitInfo>> {
        self.infos.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RateLimitOracle for SharedRateLimitOracle {
    async fn is_rate_limited(&self, account_id: &AccountId) -> RateLimitInfo {
        self.lock().get(account_id).copied().unwrap_or_default()
    }

    async fn reset_rate_limit_info(&self, account_id: &AccountId) {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.lock().remove(account_id);
    }
}

/// Longest wait a reset time from the network can ask for.
pub const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60 * 60);

/// `max(reset - now, floor)`, with `reset - now` capped at
/// [`MAX_RATE_LIMIT_WAIT`].
pub fn rate_limit_wait(info: &RateLimitInfo, now: i64, floor: Duration) -> Duration {
    let until_reset = u64::try_from(info.rate_limit_reset.saturating_sub(now)).unwrap_or(0);
    Duration::from_secs(until_reset)
        .min(MAX_RATE_LIMIT_WAIT)
        .max(floor)
}

/// Consults the oracle and sleeps out any active limit.
#[derive(Clone)]
pub struct RateLimitMonitor {
    oracle: Arc<dyn RateLimitOracle>,
    account_id: AccountId,
    floor: Duration,
    pause: Arc<PauseController>,
}

impl RateLimitMonitor {
    pub fn new(
        oracle: Arc<dyn RateLimitOracle>,
        account_id: AccountId,
        floor: Duration,
        pause: Arc<PauseController>,
    ) -> Self {
        Self {
            oracle,
            account_id,
            floor,
            pause,
        }
    }

    pub async fn is_rate_limited(&self) -> bool {
        self.oracle
            .is_rate_limited(&self.account_id)
            .await
            .is_rate_limited
    }

    /// Wait out an active limit. Returns whether a wait happened, so callers
    /// can restart a multi-step sequence from scratch.
    pub async fn check_rate_limit(&self) -> bool {
        let info = self.oracle.is_rate_limited(&self.account_id).await;
        if !info.is_rate_limited {
            return false;
        }
        self.wait_out(info).await;
        true
    }

    /// Sleep between retries, honoring a pause on either side.
    pub async fn sleep(&self, duration: Duration) {
        self.pause.wait_for_pause().await;
        tokio::time::sleep(duration).await;
        self.pause.wait_for_pause().await;
    }

    /// Wait as if limited even if the oracle has not caught up yet (an HTTP
    /// 429 seen directly by a step).
    pub async fn wait_for_rate_limit(&self) {
        let info = self.oracle.is_rate_limited(&self.account_id).await;
        self.wait_out(RateLimitInfo {
            is_rate_limited: true,
            ..info
        })
        .await;
    }

    async fn wait_out(&self, info: RateLimitInfo) {
        let wait = rate_limit_wait(&info, chrono::Utc::now().timestamp(), self.floor);
        tracing::warn!(
            account_id = %self.account_id,
            reset = info.rate_limit_reset,
            wait_secs = wait.as_secs(),
            "rate limited, waiting"
        );
        tokio::time::sleep(wait).await;
        self.oracle.reset_rate_limit_info(&self.account_id).await;
        // A machine that slept through the wait must still honor a user pause
        self.pause.wait_for_pause().await;
        tracing::info!(account_id = %self.account_id, "rate limit wait finished");
    }
}
