//! Bounded retry loops shared by every job implementation.
//!
//! Rate limits never consume a try: they are expected and self-resolving, so
//! both loops wait them out and go again.

use crate::error::Result;
use crate::rate_limit::RateLimitMonitor;
use cinder_core::AutomationSettings;
use std::future::Future;
use std::time::Duration;

/// HTTP status a platform uses to signal a rate limit.
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Try budget and fixed sleep between failed tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_tries: u32,
    pub retry_sleep: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_tries: 3,
            retry_sleep: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn network_delete(settings: &AutomationSettings) -> Self {
        Self {
            max_tries: settings.network_delete_max_tries.max(1),
            retry_sleep: settings.network_delete_retry_sleep,
        }
    }

    pub fn dom_step(settings: &AutomationSettings) -> Self {
        Self {
            max_tries: settings.dom_step_max_tries.max(1),
            retry_sleep: settings.dom_step_retry_sleep,
        }
    }
}

/// How a network delete ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { attempts: u32 },
    Failed { attempts: u32, last_status: u16 },
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }
}

/// Run a delete call until it returns 200 or the try budget is spent.
///
/// `delete` yields the HTTP status. A 429 waits on the rate-limit monitor and
/// does not count as a try. An `Err` from `delete` propagates immediately.
pub async fn network_delete_retry<F, Fut>(
    monitor: &RateLimitMonitor,
    policy: RetryPolicy,
    mut delete: F,
) -> Result<DeleteOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<u16>>,
{
    let mut attempts = 0;
    loop {
        let status = delete().await?;
        if status == STATUS_TOO_MANY_REQUESTS {
            tracing::info!("delete rate limited");
            monitor.wait_for_rate_limit().await;
            continue;
        }

        attempts += 1;
        if status == 200 {
            return Ok(DeleteOutcome::Deleted { attempts });
        }

        if attempts >= policy.max_tries {
            tracing::error!(
                attempts,
                status,
                "delete failed after {} attempts",
                attempts
            );
            return Ok(DeleteOutcome::Failed {
                attempts,
                last_status: status,
            });
        }

        tracing::warn!(
            "delete returned {} on attempt {}/{}. Retrying in {:?}...",
            status,
            attempts,
            policy.max_tries,
            policy.retry_sleep
        );
        monitor.sleep(policy.retry_sleep).await;
    }
}

/// Run a UI step, retrying on failure.
///
/// Fatal errors (cancel, internet down) propagate at once. Otherwise a
/// rate-limited failure waits and retries without bound, and any other
/// failure is retried up to `policy.max_tries` before it surfaces.
pub async fn dom_step_retry<T, F, Fut>(
    monitor: &RateLimitMonitor,
    policy: RetryPolicy,
    label: &str,
    mut step: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut tries = 0;
    loop {
        let err = match step().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => err,
        };

        if monitor.check_rate_limit().await {
            tracing::info!(step = label, "step failed while rate limited, retrying");
            continue;
        }

        tries += 1;
        if tries >= policy.max_tries {
            tracing::error!(step = label, tries, error = %err, "step failed");
            return Err(err);
        }
        tracing::warn!(
            step = label,
            error = %err,
            "step failed on attempt {}/{}. Retrying in {:?}...",
            tries,
            policy.max_tries,
            policy.retry_sleep
        );
        monitor.sleep(policy.retry_sleep).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunnerError;
    use crate::pause::PauseController;
    use crate::rate_limit::SharedRateLimitOracle;
    use cinder_core::AccountId;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn account() -> AccountId {
        AccountId::new("acct").expect("valid id")
    }

    fn monitor(oracle: &Arc<SharedRateLimitOracle>) -> RateLimitMonitor {
        RateLimitMonitor::new(
            oracle.clone(),
            account(),
            Duration::from_secs(60),
            Arc::new(PauseController::default()),
        )
    }

    /// Queued statuses and a call counter.
    fn statuses(list: &[u16]) -> (Arc<Mutex<VecDeque<u16>>>, Arc<Mutex<u32>>) {
        (
            Arc::new(Mutex::new(list.iter().copied().collect())),
            Arc::new(Mutex::new(0)),
        )
    }

    async fn run_delete(oracle: &Arc<SharedRateLimitOracle>, list: &[u16]) -> (DeleteOutcome, u32) {
        let (queue, calls) = statuses(list);
        let outcome = network_delete_retry(&monitor(oracle), RetryPolicy::default(), || {
            let queue = queue.clone();
            let calls = calls.clone();
            async move {
                *calls.lock().expect("lock") += 1;
                Ok(queue.lock().expect("lock").pop_front().unwrap_or(500))
            }
        })
        .await
        .expect("delete loop");
        let calls = *calls.lock().expect("lock");
        (outcome, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_succeeds_on_third_attempt() {
        let oracle = Arc::new(SharedRateLimitOracle::new());
        let started = Instant::now();
        let (outcome, calls) = run_delete(&oracle, &[500, 500, 200]).await;

        assert_eq!(outcome, DeleteOutcome::Deleted { attempts: 3 });
        assert_eq!(calls, 3);
        // One sleep after each of the two failures
        assert_eq!(started.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_gives_up_with_last_status() {
        let oracle = Arc::new(SharedRateLimitOracle::new());
        let (outcome, calls) = run_delete(&oracle, &[500, 502, 503]).await;

        assert_eq!(
            outcome,
            DeleteOutcome::Failed {
                attempts: 3,
                last_status: 503
            }
        );
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_429_does_not_count() {
        let oracle = Arc::new(SharedRateLimitOracle::new());
        let started = Instant::now();
        let (outcome, calls) = run_delete(&oracle, &[429, 429, 500, 200]).await;

        assert_eq!(outcome, DeleteOutcome::Deleted { attempts: 2 });
        assert_eq!(calls, 4);
        assert_eq!(oracle.reset_count(), 2);
        assert!(started.elapsed() >= Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dom_step_bounded_when_not_rate_limited() {
        let oracle = Arc::new(SharedRateLimitOracle::new());
        let calls = Arc::new(Mutex::new(0));
        let result: Result<()> =
            dom_step_retry(&monitor(&oracle), RetryPolicy::default(), "click", || {
                let calls = calls.clone();
                async move {
                    *calls.lock().expect("lock") += 1;
                    Err(RunnerError::Timeout {
                        selector: "#menu".into(),
                        context_url: "https://x.com".into(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(RunnerError::Timeout { .. })));
        assert_eq!(*calls.lock().expect("lock"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dom_step_rate_limited_failures_are_free() {
        let oracle = Arc::new(SharedRateLimitOracle::new());
        let calls = Arc::new(Mutex::new(0u32));
        let value = dom_step_retry(&monitor(&oracle), RetryPolicy::default(), "scroll", || {
            let calls = calls.clone();
            let oracle = oracle.clone();
            async move {
                let n = {
                    let mut calls = calls.lock().expect("lock");
                    *calls += 1;
                    *calls
                };
                if n <= 5 {
                    oracle.mark_rate_limited(&account(), None);
                    Err(RunnerError::Unknown("limited".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .expect("eventually succeeds");

        assert_eq!(value, 6);
        assert_eq!(oracle.reset_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dom_step_fatal_propagates_immediately() {
        let oracle = Arc::new(SharedRateLimitOracle::new());
        let calls = Arc::new(Mutex::new(0));
        let result: Result<()> =
            dom_step_retry(&monitor(&oracle), RetryPolicy::default(), "login", || {
                let calls = calls.clone();
                async move {
                    *calls.lock().expect("lock") += 1;
                    Err(RunnerError::InternetDown)
                }
            })
            .await;

        assert!(matches!(result, Err(RunnerError::InternetDown)));
        assert_eq!(*calls.lock().expect("lock"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_retry_waits_out_a_pause() {
        let oracle = Arc::new(SharedRateLimitOracle::new());
        let pause = Arc::new(PauseController::default());
        let monitor = RateLimitMonitor::new(
            oracle.clone(),
            account(),
            Duration::from_secs(60),
            pause.clone(),
        );
        let calls = Arc::new(Mutex::new(0u32));

        let task = tokio::spawn({
            let calls = calls.clone();
            let pause = pause.clone();
            async move {
                network_delete_retry(&monitor, RetryPolicy::default(), || {
                    let calls = calls.clone();
                    let pause = pause.clone();
                    async move {
                        let n = {
                            let mut calls = calls.lock().expect("lock");
                            *calls += 1;
                            *calls
                        };
                        if n == 1 {
                            // User pauses while the first try is in flight
                            pause.pause();
                            Ok(500)
                        } else {
                            Ok(200)
                        }
                    }
                })
                .await
            }
        });

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(*calls.lock().expect("lock"), 1);
        assert!(!task.is_finished());

        pause.resume();
        let outcome = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("retry resumes")
            .expect("retry task")
            .expect("delete loop");
        assert_eq!(outcome, DeleteOutcome::Deleted { attempts: 2 });
    }
}
