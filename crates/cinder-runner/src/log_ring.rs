//! Bounded per-job log attached to error reports.

use cinder_browser::ScriptLogger;
use cinder_core::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Entries kept before the oldest is evicted.
pub const LOG_RING_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: Timestamp,
    pub message: String,
}

/// FIFO ring of the most recent [`LOG_RING_CAPACITY`] messages.
#[derive(Debug, Default)]
pub struct LogRing {
    entries: Mutex<VecDeque<LogEntry>>,
}

impl LogRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: impl Into<String>) {
        let mut entries = self.lock();
        if entries.len() == LOG_RING_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            timestamp: Timestamp::now(),
            message: message.into(),
        });
    }

    /// Oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ScriptLogger for LogRing {
    fn log_failure(&self, context: &str, message: &str) {
        self.push(format!("{context}: script failed: {message}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_never_exceeds_capacity() {
        let ring = LogRing::new();
        for i in 0..57 {
            ring.push(format!("entry {i}"));
            assert!(ring.len() <= LOG_RING_CAPACITY);
        }
        assert_eq!(ring.len(), LOG_RING_CAPACITY);
    }

    #[test]
    fn test_oldest_evicted_first() {
        let ring = LogRing::new();
        for i in 0..25 {
            ring.push(format!("entry {i}"));
        }
        let messages = ring.messages();
        assert_eq!(messages.first().map(String::as_str), Some("entry 5"));
        assert_eq!(messages.last().map(String::as_str), Some("entry 24"));
    }

    #[test]
    fn test_clear_and_script_failures() {
        let ring = LogRing::new();
        ring.push("before");
        ring.clear();
        assert!(ring.is_empty());

        ring.log_failure("get_cookie", "boom");
        assert_eq!(ring.messages(), vec!["get_cookie: script failed: boom"]);
    }
}
