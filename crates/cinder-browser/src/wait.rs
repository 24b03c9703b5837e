//! Poll-until combinator shared by every wait site.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// The predicate never held within the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimeout {
    pub elapsed: Duration,
}

/// Call `predicate` every `interval` until it yields `Some`, or fail once
/// `timeout` has elapsed.
///
/// The predicate is always evaluated at least once, and once more after the
/// deadline passes, so a condition that becomes true during the last sleep is
/// not reported as a timeout.
pub async fn poll_until<T, F, Fut>(
    mut predicate: F,
    interval: Duration,
    timeout: Duration,
) -> Result<T, PollTimeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let started = Instant::now();
    let deadline = started + timeout;

    loop {
        if let Some(value) = predicate().await {
            return Ok(value);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(PollTimeout {
                elapsed: now - started,
            });
        }

        let remaining = deadline - now;
        tokio::time::sleep(interval.min(remaining)).await;
    }
}

/// Boolean form of [`poll_until`].
pub async fn poll_until_true<F, Fut>(
    mut predicate: F,
    interval: Duration,
    timeout: Duration,
) -> Result<(), PollTimeout>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    poll_until(
        || {
            let check = predicate();
            async move { check.await.then_some(()) }
        },
        interval,
        timeout,
    )
    .await
}
