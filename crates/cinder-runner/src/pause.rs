//! Cooperative pause, including OS power suspend/resume.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Pause flag every long-running step checks between actions.
///
/// A user pause survives a suspend/resume cycle: the power-monitor path only
/// auto-resumes when it was the one that paused.
#[derive(Debug)]
pub struct PauseController {
    paused: AtomicBool,
    suspend_lock: AtomicBool,
    resume_after_suspend: AtomicBool,
    poll_interval: Duration,
}

impl Default for PauseController {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl PauseController {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            paused: AtomicBool::new(false),
            suspend_lock: AtomicBool::new(false),
            resume_after_suspend: AtomicBool::new(false),
            poll_interval,
        }
    }

    pub fn pause(&self) {
        if !self.paused.swap(true, Ordering::SeqCst) {
            tracing::info!("automation paused");
        }
    }

    pub fn resume(&self) {
        if self.paused.swap(false, Ordering::SeqCst) {
            tracing::info!("automation resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Return once unpaused, polling at the configured interval.
    pub async fn wait_for_pause(&self) {
        if !self.is_paused() {
            return;
        }
        tracing::debug!("waiting for resume");
        while self.is_paused() {
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// The machine is going to sleep. Repeated notifications are ignored
    /// until the matching resume.
    pub fn power_monitor_suspend(&self) {
        if self.suspend_lock.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("system suspending");
        if !self.is_paused() {
            self.resume_after_suspend.store(true, Ordering::SeqCst);
            self.pause();
        }
    }

    /// The machine woke up.
    pub fn power_monitor_resume(&self) {
        self.suspend_lock.store(false, Ordering::SeqCst);
        tracing::info!("system resumed");
        if self.resume_after_suspend.swap(false, Ordering::SeqCst) {
            self.resume();
        }
    }
}
