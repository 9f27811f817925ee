use chaos_core::config::{load_demo_config, ConfigError, DemoConfig};
use chaos_core::validation::{Validate, ValidationIssue, ValidationLevel};
use chaos_web::{
    init_tracing, run_web_server, shutdown_signal, spawn_traffic_generator, WebError, WebState,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_DEMO_CONFIG: &str = "config/demo.toml";

/// Payment-service chaos demo backend.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "chaos-web", version)]
struct Cli {
    /// TOML config file. Defaults to config/demo.toml, or built-in defaults
    /// when that file does not exist.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Listen address, overrides `server.bind`.
    #[arg(long, env = "CHAOS_DEMO_BIND")]
    bind: Option<String>,
    /// Log filter, overrides `logging.level` (RUST_LOG still wins).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum MainError {
    #[error("{0}")]
    Args(String),
    #[error("failed to load config at {path}: {source}")]
    LoadConfig {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
    #[error("{0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Web(#[from] WebError),
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        eprintln!("chaos-web failed: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), MainError> {
    let config = match resolve_config_path(cli.config.clone(), Path::new(DEFAULT_DEMO_CONFIG)) {
        Some(path) => load_demo_config(&path).map_err(|source| MainError::LoadConfig {
            path: path.clone(),
            source,
        })?,
        None => DemoConfig::default(),
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, config.logging.json)?;

    let issues = config.validate();
    let warnings = validate_config(&issues)?;
    for issue in warnings {
        warn!(code = issue.code, "{}", issue.message);
    }
    let bind = resolve_bind(cli.bind, &config.server.bind)?;

    let state = WebState::new(&config);
    let traffic = (config.traffic.interval_secs > 0).then(|| {
        spawn_traffic_generator(
            state.clone(),
            Duration::from_secs(config.traffic.interval_secs),
        )
    });

    info!(
        %bind,
        default_delay_secs = config.runbook.default_delay_secs,
        retrigger = ?config.runbook.retrigger,
        "starting chaos demo"
    );
    let served = run_web_server(&bind, state, shutdown_signal()).await;
    if let Some(handle) = traffic {
        handle.abort();
    }
    served?;
    Ok(())
}

/// An explicit path is always loaded; the default path only when present.
fn resolve_config_path(explicit: Option<PathBuf>, default_path: &Path) -> Option<PathBuf> {
    explicit.or_else(|| default_path.is_file().then(|| default_path.to_path_buf()))
}

fn resolve_bind(bind_override: Option<String>, config_bind: &str) -> Result<String, MainError> {
    let candidate = bind_override.unwrap_or_else(|| config_bind.to_string());
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(MainError::Args(
            "bind address must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Fails on any error-level issue, otherwise hands back the warnings.
fn validate_config(issues: &[ValidationIssue]) -> Result<Vec<&ValidationIssue>, MainError> {
    let (errors, warnings): (Vec<_>, Vec<_>) = issues
        .iter()
        .partition(|issue| issue.level == ValidationLevel::Error);
    if errors.is_empty() {
        return Ok(warnings);
    }

    let rendered = errors
        .iter()
        .map(|issue| format!("{}: {}", issue.code, issue.message))
        .collect::<Vec<_>>()
        .join("; ");
    Err(MainError::InvalidConfig(format!(
        "config validation failed ({rendered})"
    )))
}
