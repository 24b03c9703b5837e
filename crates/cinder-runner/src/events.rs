//! Fire-and-forget notifications to sibling components.

use cinder_core::AccountId;
use serde::Serialize;
use tokio::sync::broadcast;

/// A named event with a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutomationEvent {
    pub name: String,
    pub payload: serde_json::Value,
}

impl AutomationEvent {
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Never awaited, never answered.
pub trait EventBus: Send + Sync {
    fn emit(&self, event: AutomationEvent);
}

/// `submit-progress-<id>`, carrying the serialized progress.
pub fn submit_progress_event(account_id: &AccountId) -> String {
    format!("submit-progress-{account_id}")
}

/// `cancel-automation-<id>`, emitted when a run is canceled from inside.
pub fn cancel_automation_event(account_id: &AccountId) -> String {
    format!("cancel-automation-{account_id}")
}

/// `archive-built-<id>`, emitted once an archive has been written.
pub fn archive_built_event(account_id: &AccountId) -> String {
    format!("archive-built-{account_id}")
}

/// Broadcast-channel bus. Emitting with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<AutomationEvent>,
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl BroadcastEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AutomationEvent> {
        self.sender.subscribe()
    }
}

impl EventBus for BroadcastEventBus {
    fn emit(&self, event: AutomationEvent) {
        tracing::debug!(name = %event.name, "emit event");
        // No receivers just means nobody is listening yet
        let _ = self.sender.send(event);
    }
}
