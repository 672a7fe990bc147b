//! Server lifecycle: bind, serve until Ctrl-C, shut down gracefully.

use std::future::Future;
use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::api::router::app_router;
use crate::api::types::ServerConfig;
use crate::predict::Predictor;

/// Serve the API on `config.addr` until interrupted
pub async fn serve(predictor: Predictor, config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    let addr = listener
        .local_addr()
        .context("Failed to read server address")?;

    let predictor = Arc::new(predictor);
    tracing::info!(
        %addr,
        symptoms = predictor.schema().len(),
        diseases = predictor.encoder().num_classes(),
        "Server started"
    );

    let app = app_router(predictor, config);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolve once `signal` fires. If the listener itself fails, never resolve:
/// the server keeps running instead of stopping at startup.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_error_does_not_stop_server() {
        let failing = async { Err(io::Error::other("no signal handler")) };
        let waited = tokio::time::timeout(Duration::from_millis(50), wait_for_shutdown(failing)).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn signal_triggers_shutdown() {
        let waited =
            tokio::time::timeout(Duration::from_millis(50), wait_for_shutdown(async { Ok(()) })).await;
        assert!(waited.is_ok());
    }
}
