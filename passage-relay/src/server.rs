//! Relay server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::routes::create_router;
use crate::state::AppState;
use crate::stats::spawn_bitrate_sampler;

/// Relay server.
pub struct RelayServer {
    config: RelayConfig,
    state: Arc<AppState>,
}

impl RelayServer {
    /// Creates a new relay server.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        let state = Arc::new(AppState::new(config.clone()));
        Self { config, state }
    }

    /// Creates a new relay server with custom state.
    #[must_use]
    pub fn with_state(config: RelayConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Runs the relay server until it fails.
    pub async fn run(self) -> Result<(), RelayError> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs the relay server with graceful shutdown.
    ///
    /// In-flight handlers observe errors on their next read once the
    /// listener closes and unwind through their normal cleanup paths.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), RelayError> {
        let addr: SocketAddr = self
            .config
            .address
            .parse()
            .map_err(|e| RelayError::InvalidAddress(format!("{}: {e}", self.config.address)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RelayError::Bind(format!("{addr}: {e}")))?;

        let sampler = spawn_bitrate_sampler(Arc::clone(&self.state));
        let app = create_router(Arc::clone(&self.state)).layer(TraceLayer::new_for_http());

        info!(%addr, "relay server listening");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| RelayError::Serve(e.to_string()));

        sampler.abort();
        warn!("relay server shutting down");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_server_new() {
        let server = RelayServer::new(RelayConfig::default());
        assert!(server.state().registry.is_empty());
    }

    #[test]
    fn test_relay_server_with_state() {
        let config = RelayConfig::default();
        let state = Arc::new(AppState::new(config.clone()));
        let server = RelayServer::with_state(config, state.clone());
        assert!(Arc::ptr_eq(server.state(), &state));
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_address() {
        let config = RelayConfig {
            address: "not-an-address".to_string(),
            ..RelayConfig::default()
        };
        let err = RelayServer::new(config).run().await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidAddress(_)));
    }
}
