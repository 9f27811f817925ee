use chaos_core::service::StateSnapshot;
use chaos_core::types::{ChaosMode, IncidentId, LogEntry, Resolution, RunbookStep, ServiceStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEMO_SERVICE_NAME: &str = "payment-service-demo";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootResponse {
    pub service: String,
    pub status: ServiceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
}

/// `/state` payload. Field names match what the dashboard polls for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateView {
    pub status: ServiceStatus,
    pub chaos_mode: Option<ChaosMode>,
    pub incident_id: Option<IncidentId>,
    pub incident_start: Option<DateTime<Utc>>,
    pub incident_end: Option<DateTime<Utc>>,
    pub incident_elapsed_seconds: Option<f64>,
    #[serde(rename = "mtttr_seconds")]
    pub mttr_seconds: Option<f64>,
    #[serde(rename = "manual_mtttr_minutes")]
    pub manual_mttr_minutes: u32,
    pub speedup: Option<f64>,
    pub resolution: Option<Resolution>,
    pub root_cause: Option<String>,
    pub runbook_steps: Vec<RunbookStep>,
    pub logs: Vec<LogEntry>,
    pub uptime_seconds: f64,
}

impl From<&StateSnapshot> for StateView {
    fn from(snapshot: &StateSnapshot) -> Self {
        Self {
            status: snapshot.status,
            chaos_mode: snapshot.chaos_mode,
            incident_id: snapshot.incident_id,
            incident_start: snapshot.incident_start,
            incident_end: snapshot.incident_end,
            incident_elapsed_seconds: snapshot.incident_elapsed_seconds,
            mttr_seconds: snapshot.mttr_seconds,
            manual_mttr_minutes: snapshot.manual_mttr_minutes,
            speedup: snapshot.speedup.map(round_tenths),
            resolution: snapshot.resolution,
            root_cause: snapshot.root_cause.clone(),
            runbook_steps: snapshot.runbook_steps.clone(),
            logs: snapshot.logs.clone(),
            uptime_seconds: snapshot.uptime_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosRequest {
    #[serde(default = "default_chaos_mode")]
    pub mode: String,
    #[serde(default)]
    pub auto_runbook_delay: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaosResponse {
    pub ok: bool,
    pub mode: ChaosMode,
    pub incident_id: IncidentId,
    pub auto_runbook_delay: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub ok: bool,
    pub closed_incident: Option<IncidentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebEventKind {
    ChaosTriggered {
        incident_id: IncidentId,
        mode: ChaosMode,
        delay_secs: f64,
    },
    RunbookCompleted {
        incident_id: IncidentId,
        mttr_seconds: Option<f64>,
    },
    Reset {
        closed_incident: Option<IncidentId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebEvent {
    pub at: DateTime<Utc>,
    pub kind: WebEventKind,
}

pub fn web_event_name(kind: &WebEventKind) -> &'static str {
    match kind {
        WebEventKind::ChaosTriggered { .. } => "chaos_triggered",
        WebEventKind::RunbookCompleted { .. } => "runbook_completed",
        WebEventKind::Reset { .. } => "reset",
    }
}

fn default_chaos_mode() -> String {
    ChaosMode::ConnectionPool.as_str().to_string()
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
