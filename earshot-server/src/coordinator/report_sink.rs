use async_trait::async_trait;
use earshot_core::ParticipantId;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::info;

/// A user report, as handed to the moderation backend.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserReport {
    pub reporter_id: ParticipantId,
    pub reporter_username: String,
    pub reported_id: ParticipantId,
    pub reported_username: String,
    pub reason: String,
    /// Milliseconds since the Unix epoch.
    pub time: u64,
}

impl UserReport {
    pub fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

/// Hook for the moderation collaborator.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn submit(&self, report: UserReport);
}

/// Reports retained by [`LoggingReportSink::new`].
pub const DEFAULT_RETAINED_REPORTS: usize = 256;

/// Logs every report and keeps the most recent ones in memory. Stands in for
/// a moderation backend.
pub struct LoggingReportSink {
    reports: Mutex<VecDeque<UserReport>>,
    capacity: usize,
}

impl Default for LoggingReportSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingReportSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RETAINED_REPORTS)
    }

    /// Keeps at most `capacity` reports; older ones are dropped first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            reports: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Retained reports, oldest first.
    pub async fn reports(&self) -> Vec<UserReport> {
        self.reports.lock().await.iter().cloned().collect()
    }

    pub async fn clear(&self) {
        self.reports.lock().await.clear();
    }
}

#[async_trait]
impl ReportSink for LoggingReportSink {
    async fn submit(&self, report: UserReport) {
        info!(
            reporter = %report.reporter_id,
            reported = %report.reported_id,
            reason = %report.reason,
            "User report received"
        );
        if self.capacity == 0 {
            return;
        }
        let mut reports = self.reports.lock().await;
        while reports.len() >= self.capacity {
            reports.pop_front();
        }
        reports.push_back(report);
    }
}
