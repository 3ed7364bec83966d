//! Observer server startup helper for embedding in the engine.
//!
//! [`spawn_observer`] binds eagerly, so a port conflict surfaces as a
//! startup error, then serves on a background Tokio task alongside the
//! scheduler.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind `0.0.0.0:{port}` and serve the Observer API on a background task.
///
/// Returns the bound address (useful when `port` is 0) and the task
/// handle. The server stops when `shutdown` fires.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address cannot be bound.
pub async fn spawn_observer(
    port: u16,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> Result<(SocketAddr, JoinHandle<()>), StartupError> {
    let config = ServerConfig {
        host: String::from("0.0.0.0"),
        port,
    };
    let listener = server::bind(&config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("listener has no local address: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state, shutdown).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(%addr, "Observer server spawned on background task");
    Ok((addr, handle))
}
