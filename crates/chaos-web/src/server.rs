use std::future::Future;

use axum::serve;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::WebError;
use crate::routes::router;
use crate::state::WebState;

pub async fn run_web_server<F>(bind_addr: &str, state: WebState, shutdown: F) -> Result<(), WebError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind_addr).await?;
    info!(addr = %listener.local_addr()?, "chaos-web listening");
    serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| WebError::Internal {
            message: err.to_string(),
        })?;
    info!("chaos-web stopped");
    Ok(())
}

/// Resolves on ctrl-c. If the signal handler cannot be installed the server
/// runs until killed.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
