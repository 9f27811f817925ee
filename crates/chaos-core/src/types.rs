//! Domain types for the payment-service chaos demo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ChaosError;

/// Identifier of a single incident. Issued monotonically per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(pub u64);

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INC-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Healthy,
    Chaos,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Chaos => "chaos",
        };
        f.write_str(tag)
    }
}

/// Simulated failure category. Nothing is actually injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaosMode {
    ConnectionPool,
    Timeout,
    RandomCrash,
}

impl ChaosMode {
    pub const ALL: [ChaosMode; 3] = [
        ChaosMode::ConnectionPool,
        ChaosMode::Timeout,
        ChaosMode::RandomCrash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChaosMode::ConnectionPool => "connection_pool",
            ChaosMode::Timeout => "timeout",
            ChaosMode::RandomCrash => "random_crash",
        }
    }

    /// Headline used in the incident log line.
    pub fn label(&self) -> &'static str {
        match self {
            ChaosMode::ConnectionPool => "Connection pool exhausted",
            ChaosMode::Timeout => "Downstream timeout",
            ChaosMode::RandomCrash => "Service panic / crash",
        }
    }

    /// Root cause reported by the runbook analysis step.
    pub fn root_cause(&self) -> &'static str {
        match self {
            ChaosMode::ConnectionPool => "Connection pool exhausted (100/100)",
            ChaosMode::Timeout => "Downstream timeout, circuit breaker tripped",
            ChaosMode::RandomCrash => "Nil pointer dereference in payment handler",
        }
    }
}

impl fmt::Display for ChaosMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChaosMode {
    type Err = ChaosError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ChaosMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value.trim())
            .ok_or_else(|| ChaosError::InvalidMode(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
}

/// How an incident was brought back to healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Automated,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub mode: ChaosMode,
    pub started_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution: Option<Resolution>,
}

impl Incident {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }

    /// Recovery time in seconds, once resolved.
    pub fn mttr_seconds(&self) -> Option<f64> {
        let resolved_at = self.resolved_at?;
        let millis = (resolved_at - self.started_at).num_milliseconds().max(0);
        Some(millis as f64 / 1000.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunbookStepStatus {
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunbookStep {
    pub name: String,
    pub status: RunbookStepStatus,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    #[test]
    fn chaos_mode_parses_known_names_only() {
        assert_eq!("timeout".parse::<ChaosMode>().unwrap(), ChaosMode::Timeout);
        assert_eq!(
            " connection_pool ".parse::<ChaosMode>().unwrap(),
            ChaosMode::ConnectionPool
        );
        let err = "meteor_strike".parse::<ChaosMode>().unwrap_err();
        assert_eq!(err.to_string(), "invalid chaos mode: meteor_strike");
    }

    #[test]
    fn status_and_severity_serialize_for_the_frontend() {
        assert_eq!(
            serde_json::to_string(&ServiceStatus::Chaos).unwrap(),
            "\"chaos\""
        );
        assert_eq!(
            serde_json::to_string(&ChaosMode::RandomCrash).unwrap(),
            "\"random_crash\""
        );
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"WARN\"");
    }

    #[test]
    fn incident_mttr_is_only_known_once_resolved() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let mut incident = Incident {
            id: IncidentId(1),
            mode: ChaosMode::Timeout,
            started_at: start,
            resolved_at: None,
            resolution: None,
        };
        assert!(incident.is_open());
        assert_eq!(incident.mttr_seconds(), None);

        incident.resolved_at = Some(start + Duration::milliseconds(8_500));
        assert!(!incident.is_open());
        assert_eq!(incident.mttr_seconds(), Some(8.5));
    }

    #[test]
    fn incident_id_display_is_prefixed() {
        assert_eq!(IncidentId(7).to_string(), "INC-7");
    }
}
