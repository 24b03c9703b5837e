//! OS signal wiring.
//!
//! `SIGUSR1`/`SIGUSR2` stand in for the power monitor's suspend and resume
//! notifications. Ctrl-C cancels the run at its next checkpoint.

use cinder_runner::{CancelHandle, PauseController};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Listen for signals until the returned task is aborted.
pub fn spawn(pause: Arc<PauseController>, cancel: CancelHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = listen(&pause, &cancel).await {
            tracing::warn!(error = %e, "signal handling unavailable");
        }
    })
}

#[cfg(unix)]
async fn listen(pause: &PauseController, cancel: &CancelHandle) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut suspend = signal(SignalKind::user_defined1())?;
    let mut resume = signal(SignalKind::user_defined2())?;
    loop {
        tokio::select! {
            _ = suspend.recv() => {
                tracing::info!("suspend requested");
                pause.power_monitor_suspend();
            }
            _ = resume.recv() => {
                tracing::info!("resume requested");
                pause.power_monitor_resume();
            }
            interrupted = tokio::signal::ctrl_c() => {
                interrupted?;
                interrupt(cancel);
            }
        }
    }
}

#[cfg(not(unix))]
async fn listen(_pause: &PauseController, cancel: &CancelHandle) -> std::io::Result<()> {
    loop {
        tokio::signal::ctrl_c().await?;
        interrupt(cancel);
    }
}

fn interrupt(cancel: &CancelHandle) {
    if cancel.is_canceled() {
        tracing::warn!("already canceling, waiting for the current step");
    } else {
        tracing::info!("interrupted, canceling the run");
        cancel.cancel();
    }
}
