#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChaosError {
    #[error("invalid chaos mode: {0}")]
    InvalidMode(String),
    #[error("invalid runbook delay: {0}")]
    InvalidDelay(String),
    #[error("service is already in chaos (incident {incident}), reset first")]
    AlreadyInChaos { incident: crate::types::IncidentId },
}
