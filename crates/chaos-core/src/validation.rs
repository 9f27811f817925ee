//! Validation for the demo configuration.

use serde::{Deserialize, Serialize};

use crate::config::DemoConfig;
use crate::logs::{LOG_WINDOW, MAX_LOG_RETENTION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub level: ValidationLevel,
    pub code: &'static str,
    pub message: String,
}

pub trait Validate {
    fn validate(&self) -> Vec<ValidationIssue>;
}

impl Validate for DemoConfig {
    fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if self.server.bind.trim().is_empty() {
            issues.push(ValidationIssue {
                level: ValidationLevel::Error,
                code: "server.bind.empty",
                message: "bind address must not be empty".to_string(),
            });
        }

        let delay = self.runbook.default_delay_secs;
        if !delay.is_finite() || delay <= 0.0 {
            issues.push(ValidationIssue {
                level: ValidationLevel::Error,
                code: "runbook.default_delay.not_positive",
                message: format!("default runbook delay must be a positive number, got {delay}"),
            });
        }

        if self.incident.manual_mttr_minutes == 0 {
            issues.push(ValidationIssue {
                level: ValidationLevel::Error,
                code: "incident.manual_mttr.zero",
                message: "manual MTTR must be greater than zero".to_string(),
            });
        }

        if self.incident.log_retention > MAX_LOG_RETENTION {
            issues.push(ValidationIssue {
                level: ValidationLevel::Error,
                code: "incident.log_retention.too_large",
                message: format!(
                    "log retention {} exceeds the maximum of {MAX_LOG_RETENTION}",
                    self.incident.log_retention
                ),
            });
        }

        if self.incident.log_retention < LOG_WINDOW {
            issues.push(ValidationIssue {
                level: ValidationLevel::Warning,
                code: "incident.log_retention.below_window",
                message: format!(
                    "log retention {} is below the served window of {LOG_WINDOW}; using {LOG_WINDOW}",
                    self.incident.log_retention
                ),
            });
        }

        if self.traffic.interval_secs == 0 {
            issues.push(ValidationIssue {
                level: ValidationLevel::Warning,
                code: "traffic.interval.disabled",
                message: "traffic interval is 0, background log generator disabled".to_string(),
            });
        }

        issues
    }
}
