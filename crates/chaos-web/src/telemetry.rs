use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::WebError;

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(level: &str, json: bool) -> Result<(), WebError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if json {
        subscriber.with(fmt::layer().json()).try_init()
    } else {
        subscriber.with(fmt::layer()).try_init()
    };
    installed.map_err(|err| WebError::Internal {
        message: format!("failed to init logging: {err}"),
    })
}
