//! Structured error reports handed to the reporting collaborator.

use crate::log_ring::LogEntry;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Where a failure happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportContext {
    pub account_id: String,
    pub platform: String,
    pub job_index: Option<usize>,
    pub job_type: Option<String>,
    pub current_url: Option<String>,
    /// Log ring snapshot, oldest first
    pub logs: Vec<LogEntry>,
    /// Wizard state name at the time of failure
    pub state: Option<String>,
}

/// One structured failure report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub error_type: String,
    pub data: serde_json::Value,
    pub context: ReportContext,
    /// Whether the job continues after this report
    pub recoverable: bool,
}

#[async_trait]
pub trait Reporter: Send + Sync {
    async fn error(&self, report: ErrorReport);
}

/// Writes reports to the tracing pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

#[async_trait]
impl Reporter for TracingReporter {
    async fn error(&self, report: ErrorReport) {
        let logs: Vec<&str> = report
            .context
            .logs
            .iter()
            .map(|entry| entry.message.as_str())
            .collect();
        tracing::error!(
            error_type = %report.error_type,
            account_id = %report.context.account_id,
            job_index = ?report.context.job_index,
            job_type = ?report.context.job_type,
            url = ?report.context.current_url,
            recoverable = report.recoverable,
            data = %report.data,
            ?logs,
            "automation error reported"
        );
    }
}

/// Keeps every report in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<ErrorReport>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Reporter for RecordingReporter {
    async fn error(&self, report: ErrorReport) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_reporter_keeps_reports() {
        let reporter = RecordingReporter::new();
        reporter
            .error(ErrorReport {
                error_type: "timeout".to_string(),
                data: serde_json::json!({"selector": "#x"}),
                context: ReportContext {
                    account_id: "acct".to_string(),
                    job_index: Some(1),
                    ..ReportContext::default()
                },
                recoverable: false,
            })
            .await;

        let reports = reporter.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].context.job_index, Some(1));
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = ErrorReport {
            error_type: "url_changed".to_string(),
            data: serde_json::Value::Null,
            context: ReportContext::default(),
            recoverable: true,
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["errorType"], "url_changed");
        assert!(json["context"]["currentUrl"].is_null());
    }
}
