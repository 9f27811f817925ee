use chaos_core::config::DemoConfig;
use chaos_core::error::ChaosError;
use chaos_core::service::{
    ChaosTriggered, ResetOutcome, ServiceSettings, ServiceState, StateSnapshot,
};
use chaos_core::types::{ChaosMode, IncidentId, LogEntry, ServiceStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::RuntimeClock;
use crate::model::{WebEvent, WebEventKind};

/// Pending runbook timer for one incident.
#[derive(Debug)]
struct RunbookTimer {
    incident: IncidentId,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
struct WebStateInner {
    service: ServiceState,
    runbook: Option<RunbookTimer>,
}

#[derive(Debug, Clone)]
pub struct WebState {
    inner: Arc<RwLock<WebStateInner>>,
    events_tx: broadcast::Sender<WebEvent>,
    clock: RuntimeClock,
    default_delay: Duration,
}

impl Default for WebState {
    fn default() -> Self {
        Self::new(&DemoConfig::default())
    }
}

impl WebState {
    pub fn new(config: &DemoConfig) -> Self {
        let (events_tx, _) = broadcast::channel(1024);
        let clock = RuntimeClock::start();
        let default_delay = Duration::try_from_secs_f64(config.runbook.default_delay_secs)
            .unwrap_or(Duration::from_secs(8));
        let service = ServiceState::new(ServiceSettings::from(config), clock.now());
        Self {
            inner: Arc::new(RwLock::new(WebStateInner {
                service,
                runbook: None,
            })),
            events_tx,
            clock,
            default_delay,
        }
    }

    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }

    /// Opens an incident and schedules its runbook `delay` from now. Any
    /// timer belonging to a superseded incident is cancelled.
    pub async fn trigger_chaos(
        &self,
        mode: ChaosMode,
        delay: Duration,
    ) -> Result<ChaosTriggered, ChaosError> {
        let mut guard = self.inner.write().await;
        let triggered = guard.service.trigger_chaos(mode, self.clock.now())?;
        if let Some(previous) = guard.runbook.take() {
            debug!(incident = %previous.incident, "cancelling superseded runbook timer");
            previous.handle.abort();
        }
        guard.runbook = Some(RunbookTimer {
            incident: triggered.incident,
            handle: self.schedule_runbook(triggered.incident, delay),
        });
        drop(guard);

        info!(incident = %triggered.incident, %mode, delay_secs = delay.as_secs_f64(), "chaos triggered");
        self.emit(WebEventKind::ChaosTriggered {
            incident_id: triggered.incident,
            mode,
            delay_secs: delay.as_secs_f64(),
        });
        Ok(triggered)
    }

    /// Restores healthy status. A pending runbook timer is cancelled under the
    /// same lock, so it can never resolve the incident afterwards.
    pub async fn reset(&self) -> ResetOutcome {
        let mut guard = self.inner.write().await;
        if let Some(timer) = guard.runbook.take() {
            debug!(incident = %timer.incident, "cancelling runbook timer on reset");
            timer.handle.abort();
        }
        let outcome = guard.service.reset(self.clock.now());
        drop(guard);

        info!(closed = ?outcome.closed, "service reset");
        self.emit(WebEventKind::Reset {
            closed_incident: outcome.closed,
        });
        outcome
    }

    pub async fn snapshot(&self) -> StateSnapshot {
        let guard = self.inner.read().await;
        guard.service.snapshot(self.clock.now())
    }

    pub async fn logs(&self) -> Vec<LogEntry> {
        let guard = self.inner.read().await;
        guard.service.logs()
    }

    pub async fn status(&self) -> ServiceStatus {
        let guard = self.inner.read().await;
        guard.service.status()
    }

    pub async fn pending_runbook(&self) -> Option<IncidentId> {
        let guard = self.inner.read().await;
        guard.runbook.as_ref().map(|timer| timer.incident)
    }

    pub async fn record_traffic(&self) {
        let mut guard = self.inner.write().await;
        guard.service.record_traffic(self.clock.now());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WebEvent> {
        self.events_tx.subscribe()
    }

    fn schedule_runbook(&self, incident: IncidentId, delay: Duration) -> JoinHandle<()> {
        debug!(%incident, delay_secs = delay.as_secs_f64(), "runbook timer scheduled");
        let state = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.complete_runbook(incident).await;
        })
    }

    async fn complete_runbook(&self, incident: IncidentId) {
        let mut guard = self.inner.write().await;
        if guard
            .runbook
            .as_ref()
            .is_some_and(|timer| timer.incident == incident)
        {
            guard.runbook = None;
        }
        let now = self.clock.now();
        if !guard.service.resolve_automated(incident, now) {
            debug!(%incident, "runbook fired for an incident that is no longer open");
            return;
        }
        let mttr_seconds = guard
            .service
            .last_incident()
            .and_then(|record| record.mttr_seconds());
        drop(guard);

        info!(%incident, mttr_seconds = ?mttr_seconds, "runbook resolved incident");
        self.emit(WebEventKind::RunbookCompleted {
            incident_id: incident,
            mttr_seconds,
        });
    }

    fn emit(&self, kind: WebEventKind) {
        let _ = self.events_tx.send(WebEvent {
            at: self.clock.now(),
            kind,
        });
    }
}
