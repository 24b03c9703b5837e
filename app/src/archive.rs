//! Writes built archives to disk.

use anyhow::{Context, Result};
use cinder_core::AccountId;
use cinder_runner::{archive_built_event, AutomationEvent};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Write one archive payload as pretty JSON, returning the file written.
pub async fn write_archive(
    dir: &Path,
    account_id: &AccountId,
    payload: &serde_json::Value,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
    let path = dir.join(format!("archive-{account_id}-{stamp}.json"));
    let body = serde_json::to_vec_pretty(payload)?;
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Listen for `archive-built-<id>` and write each payload under `dir`.
///
/// The task ends once every sender of the bus is gone.
pub fn spawn_writer(
    mut events: broadcast::Receiver<AutomationEvent>,
    dir: PathBuf,
    account_id: AccountId,
) -> JoinHandle<Vec<PathBuf>> {
    let name = archive_built_event(&account_id);
    tokio::spawn(async move {
        let mut written = Vec::new();
        loop {
            match events.recv().await {
                Ok(event) if event.name == name => {
                    match write_archive(&dir, &account_id, &event.payload).await {
                        Ok(path) => {
                            tracing::info!(path = %path.display(), "archive written");
                            written.push(path);
                        }
                        Err(e) => tracing::error!(error = %e, "archive could not be written"),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "archive writer fell behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
        written
    })
}
