//! In-memory state of the simulated payment service.
//!
//! Every mutation takes the current time explicitly so callers decide which
//! clock drives the incident timeline. Status is derived from the incident
//! record: the service is in chaos exactly while an incident is open.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{DemoConfig, RetriggerPolicy};
use crate::error::ChaosError;
use crate::logs::{LogBuffer, TrafficFeed, DEFAULT_LOG_RETENTION};
use crate::types::{
    ChaosMode, Incident, IncidentId, LogEntry, Resolution, RunbookStep, RunbookStepStatus,
    ServiceStatus, Severity,
};

pub const SERVICE_NAME: &str = "payment-service";

const RUNBOOK_STEPS: [&str; 5] = [
    "Health check: UNHEALTHY detected",
    "Fetching logs & analyzing root cause",
    "Restarting service",
    "Verifying recovery",
    "Notifying team: incident report sent",
];
const ROOT_CAUSE_STEP: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub manual_mttr_minutes: u32,
    pub retrigger: RetriggerPolicy,
    pub log_retention: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            manual_mttr_minutes: crate::config::DEFAULT_MANUAL_MTTR_MINUTES,
            retrigger: RetriggerPolicy::default(),
            log_retention: DEFAULT_LOG_RETENTION,
        }
    }
}

impl From<&DemoConfig> for ServiceSettings {
    fn from(config: &DemoConfig) -> Self {
        Self {
            manual_mttr_minutes: config.incident.manual_mttr_minutes,
            retrigger: config.runbook.retrigger,
            log_retention: config.incident.log_retention,
        }
    }
}

/// Result of a successful chaos trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChaosTriggered {
    pub incident: IncidentId,
    /// Open incident discarded by a restart, whose timer must be cancelled.
    pub superseded: Option<IncidentId>,
}

/// Result of an explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetOutcome {
    pub closed: Option<IncidentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub status: ServiceStatus,
    pub chaos_mode: Option<ChaosMode>,
    pub incident_id: Option<IncidentId>,
    pub incident_start: Option<DateTime<Utc>>,
    pub incident_end: Option<DateTime<Utc>>,
    pub incident_elapsed_seconds: Option<f64>,
    pub mttr_seconds: Option<f64>,
    pub manual_mttr_minutes: u32,
    pub speedup: Option<f64>,
    pub resolution: Option<Resolution>,
    pub root_cause: Option<String>,
    pub runbook_steps: Vec<RunbookStep>,
    pub logs: Vec<LogEntry>,
    pub uptime_seconds: f64,
}

#[derive(Debug, Clone)]
pub struct ServiceState {
    settings: ServiceSettings,
    started_at: DateTime<Utc>,
    incident: Option<Incident>,
    runbook_steps: Vec<RunbookStep>,
    logs: LogBuffer,
    traffic: TrafficFeed,
    next_incident: u64,
}

impl ServiceState {
    pub fn new(settings: ServiceSettings, now: DateTime<Utc>) -> Self {
        let mut logs = LogBuffer::with_retention(settings.log_retention);
        logs.push(now, Severity::Info, format!("{SERVICE_NAME} started successfully"));
        logs.push(
            now,
            Severity::Info,
            "Connected to database pool (max: 100 connections)",
        );
        logs.push(now, Severity::Info, "Listening on :8080");

        Self {
            settings,
            started_at: now,
            incident: None,
            runbook_steps: Vec::new(),
            logs,
            traffic: TrafficFeed::default(),
            next_incident: 1,
        }
    }

    pub fn status(&self) -> ServiceStatus {
        match self.open_incident() {
            Some(_) => ServiceStatus::Chaos,
            None => ServiceStatus::Healthy,
        }
    }

    pub fn chaos_mode(&self) -> Option<ChaosMode> {
        self.incident
            .as_ref()
            .filter(|incident| incident.is_open())
            .map(|incident| incident.mode)
    }

    pub fn open_incident(&self) -> Option<IncidentId> {
        self.incident
            .as_ref()
            .filter(|incident| incident.is_open())
            .map(|incident| incident.id)
    }

    pub fn last_incident(&self) -> Option<&Incident> {
        self.incident.as_ref()
    }

    pub fn trigger_chaos(
        &mut self,
        mode: ChaosMode,
        now: DateTime<Utc>,
    ) -> Result<ChaosTriggered, ChaosError> {
        let superseded = self.open_incident();
        if let (Some(incident), RetriggerPolicy::Reject) = (superseded, self.settings.retrigger) {
            return Err(ChaosError::AlreadyInChaos { incident });
        }

        let id = IncidentId(self.next_incident);
        self.next_incident += 1;

        if let Some(previous) = superseded {
            self.logs.push(
                now,
                Severity::Warn,
                format!("{previous} superseded by {id}, runbook timer restarted"),
            );
        }

        self.incident = Some(Incident {
            id,
            mode,
            started_at: now,
            resolved_at: None,
            resolution: None,
        });
        self.runbook_steps.clear();
        self.logs.push(
            now,
            Severity::Error,
            format!("INCIDENT {id}: {}", mode.label()),
        );

        Ok(ChaosTriggered {
            incident: id,
            superseded,
        })
    }

    pub fn reset(&mut self, now: DateTime<Utc>) -> ResetOutcome {
        let closed = self.close_open_incident(Resolution::Manual, now);
        match closed {
            Some(id) => self.logs.push(
                now,
                Severity::Info,
                format!("Manual reset: {id} closed, {SERVICE_NAME} restored to healthy"),
            ),
            None => self.logs.push(
                now,
                Severity::Info,
                format!("Reset requested: {SERVICE_NAME} already healthy"),
            ),
        }
        ResetOutcome { closed }
    }

    /// Runbook completion for `id`. Returns false if that incident is no
    /// longer open (reset or superseded), leaving state untouched.
    pub fn resolve_automated(&mut self, id: IncidentId, now: DateTime<Utc>) -> bool {
        let Some(mode) = self
            .incident
            .as_ref()
            .filter(|incident| incident.id == id && incident.is_open())
            .map(|incident| incident.mode)
        else {
            return false;
        };

        self.logs
            .push(now, Severity::Info, "Runbook triggered automatically");
        self.runbook_steps = RUNBOOK_STEPS
            .iter()
            .enumerate()
            .map(|(idx, name)| RunbookStep {
                name: (*name).to_string(),
                status: RunbookStepStatus::Done,
                at: now,
                detail: (idx == ROOT_CAUSE_STEP).then(|| mode.root_cause().to_string()),
            })
            .collect();
        self.logs.push(
            now,
            Severity::Info,
            format!("Root cause identified: {}", mode.root_cause()),
        );

        self.close_open_incident(Resolution::Automated, now);
        self.logs.push(
            now,
            Severity::Info,
            "Service restarted successfully, health check PASSED",
        );

        let mttr = self
            .incident
            .as_ref()
            .and_then(Incident::mttr_seconds)
            .unwrap_or_default();
        self.logs.push(
            now,
            Severity::Info,
            format!("Incident report: MTTR={}s | Root cause: {mode}", mttr.round()),
        );
        true
    }

    /// Appends one line of synthetic background traffic.
    pub fn record_traffic(&mut self, now: DateTime<Utc>) {
        let (severity, message) = match self.chaos_mode() {
            Some(mode) => self.traffic.failure_line(mode),
            None => self.traffic.healthy_line(),
        };
        self.logs.push(now, severity, message);
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.recent()
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> StateSnapshot {
        let incident = self.incident.as_ref();
        let mttr_seconds = incident.and_then(Incident::mttr_seconds);
        let resolution = incident.and_then(|incident| incident.resolution);
        let speedup = match (resolution, mttr_seconds) {
            (Some(Resolution::Automated), Some(mttr)) if mttr > 0.0 => {
                Some(self.manual_mttr().as_secs_f64() / mttr)
            }
            _ => None,
        };

        StateSnapshot {
            status: self.status(),
            chaos_mode: self.chaos_mode(),
            incident_id: incident.map(|incident| incident.id),
            incident_start: incident.map(|incident| incident.started_at),
            incident_end: incident.and_then(|incident| incident.resolved_at),
            incident_elapsed_seconds: incident
                .filter(|incident| incident.is_open())
                .map(|incident| seconds_between(incident.started_at, now)),
            mttr_seconds,
            manual_mttr_minutes: self.settings.manual_mttr_minutes,
            speedup,
            resolution,
            root_cause: self
                .runbook_steps
                .iter()
                .find_map(|step| step.detail.clone()),
            runbook_steps: self.runbook_steps.clone(),
            logs: self.logs(),
            uptime_seconds: seconds_between(self.started_at, now),
        }
    }

    pub fn manual_mttr(&self) -> Duration {
        Duration::from_secs(u64::from(self.settings.manual_mttr_minutes) * 60)
    }

    fn close_open_incident(
        &mut self,
        resolution: Resolution,
        now: DateTime<Utc>,
    ) -> Option<IncidentId> {
        let incident = self.incident.as_mut().filter(|incident| incident.is_open())?;
        incident.resolved_at = Some(now.max(incident.started_at));
        incident.resolution = Some(resolution);
        Some(incident.id)
    }
}

/// Validates a requested runbook delay in seconds.
pub fn runbook_delay(secs: f64) -> Result<Duration, ChaosError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ChaosError::InvalidDelay(format!(
            "auto_runbook_delay must be a positive number of seconds, got {secs}"
        )));
    }
    Duration::try_from_secs_f64(secs).map_err(|err| ChaosError::InvalidDelay(err.to_string()))
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds().max(0) as f64 / 1000.0
}
