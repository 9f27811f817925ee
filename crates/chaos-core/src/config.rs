//! Configuration for the chaos demo service.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logs::DEFAULT_LOG_RETENTION;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_RUNBOOK_DELAY_SECS: f64 = 8.0;
pub const DEFAULT_MANUAL_MTTR_MINUTES: u32 = 47;
pub const DEFAULT_TRAFFIC_INTERVAL_SECS: u64 = 12;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub server: ServerConfig,
    pub runbook: RunbookConfig,
    pub incident: IncidentConfig,
    pub traffic: TrafficConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// What a chaos trigger does while an incident is already open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetriggerPolicy {
    /// Replace the open incident and restart the runbook timer.
    #[default]
    Restart,
    /// Refuse the trigger until the service is reset.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunbookConfig {
    pub default_delay_secs: f64,
    pub retrigger: RetriggerPolicy,
}

impl Default for RunbookConfig {
    fn default() -> Self {
        Self {
            default_delay_secs: DEFAULT_RUNBOOK_DELAY_SECS,
            retrigger: RetriggerPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentConfig {
    /// Hardcoded human response time the runbook is compared against.
    pub manual_mttr_minutes: u32,
    pub log_retention: usize,
}

impl Default for IncidentConfig {
    fn default() -> Self {
        Self {
            manual_mttr_minutes: DEFAULT_MANUAL_MTTR_MINUTES,
            log_retention: DEFAULT_LOG_RETENTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// Seconds between synthetic traffic lines; 0 disables the generator.
    pub interval_secs: u64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_TRAFFIC_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

pub fn parse_demo_config(contents: &str) -> Result<DemoConfig, toml::de::Error> {
    toml::from_str(contents)
}

pub fn load_demo_config(path: impl AsRef<Path>) -> Result<DemoConfig, ConfigError> {
    let path_ref = path.as_ref();
    let body = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
        path: path_ref.to_path_buf(),
        source,
    })?;
    parse_demo_config(&body).map_err(|source| ConfigError::Parse {
        path: path_ref.to_path_buf(),
        source,
    })
}
