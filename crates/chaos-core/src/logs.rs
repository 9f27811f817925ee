//! Bounded buffer of synthetic service log lines.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use crate::types::{ChaosMode, LogEntry, Severity};

/// Number of entries served to pollers.
pub const LOG_WINDOW: usize = 5;

pub const DEFAULT_LOG_RETENTION: usize = 50;

/// Largest retention the service accepts from config.
pub const MAX_LOG_RETENTION: usize = 10_000;

const PAYMENT_AMOUNTS: [u32; 12] = [44, 88, 99, 142, 176, 210, 255, 304, 89, 133, 67, 198];
const FIRST_TXN_ID: u64 = 1000;

#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    retention: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_retention(DEFAULT_LOG_RETENTION)
    }
}

impl LogBuffer {
    /// Retention below the served window is raised to the window size. The
    /// buffer grows on demand, so a large retention costs nothing up front.
    pub fn with_retention(retention: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            retention: retention.max(LOG_WINDOW),
        }
    }

    pub fn push(&mut self, at: DateTime<Utc>, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(?severity, %message, "service log");
        self.entries.push_back(LogEntry {
            timestamp: at,
            severity,
            message,
        });
        while self.entries.len() > self.retention {
            self.entries.pop_front();
        }
    }

    /// Last [`LOG_WINDOW`] entries, oldest first.
    pub fn recent(&self) -> Vec<LogEntry> {
        let skip = self.entries.len().saturating_sub(LOG_WINDOW);
        self.entries.iter().skip(skip).cloned().collect()
    }
}

/// Canned background traffic. Cycles through its catalogues in order.
#[derive(Debug, Clone, Default)]
pub struct TrafficFeed {
    payments: u64,
    failures: usize,
}

impl TrafficFeed {
    pub fn healthy_line(&mut self) -> (Severity, String) {
        let amount = PAYMENT_AMOUNTS[(self.payments % PAYMENT_AMOUNTS.len() as u64) as usize];
        let txn = FIRST_TXN_ID + self.payments;
        self.payments += 1;
        (
            Severity::Info,
            format!("Payment processed OK, ${amount} (txn #{txn})"),
        )
    }

    pub fn failure_line(&mut self, mode: ChaosMode) -> (Severity, String) {
        let catalogue = failure_catalogue(mode);
        let (severity, message) = catalogue[self.failures % catalogue.len()];
        self.failures += 1;
        (severity, message.to_string())
    }

    pub fn payments_processed(&self) -> u64 {
        self.payments
    }
}

fn failure_catalogue(mode: ChaosMode) -> &'static [(Severity, &'static str)] {
    match mode {
        ChaosMode::ConnectionPool => &[
            (
                Severity::Error,
                "Connection pool exhausted (100/100 connections in use)",
            ),
            (Severity::Warn, "Retry 3/3 failed, no connections available"),
            (
                Severity::Error,
                "DB timeout after 30s, connection pool saturated",
            ),
            (
                Severity::Error,
                "Payment rejected, cannot acquire DB connection",
            ),
            (Severity::Warn, "Queue depth: 847 pending requests"),
        ],
        ChaosMode::Timeout => &[
            (Severity::Error, "Request timeout after 30000ms"),
            (Severity::Warn, "Downstream service not responding"),
            (Severity::Error, "Circuit breaker OPEN for payment-service"),
            (Severity::Error, "Health probe failed (3/3 retries)"),
        ],
        ChaosMode::RandomCrash => &[
            (Severity::Error, "Unexpected panic in payment handler"),
            (
                Severity::Error,
                "nil pointer dereference at payment.go:142",
            ),
            (
                Severity::Error,
                "Service crashed, restarting (attempt 1/3)",
            ),
            (Severity::Error, "Restart failed, still crashing"),
        ],
    }
}
