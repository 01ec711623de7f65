//! Route definitions.

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::handlers;
use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// Creates the relay router.
///
/// Anything that is not a relay endpoint falls through to the static
/// file server over the configured directory.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/bridge/control/{bridge_id}", get(ws_handler::bridge_control))
        .route(
            "/bridge/data/{bridge_id}/{connection_id}",
            get(ws_handler::bridge_data),
        )
        .route(
            "/remote-controller/{bridge_id}",
            get(ws_handler::remote_controller),
        )
        .route("/status/{bridge_id}", get(ws_handler::status))
        .route("/stats.json", get(handlers::stats_json))
        .route("/config.js", get(handlers::config_js))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;

    #[test]
    fn test_create_router() {
        let state = Arc::new(AppState::new(RelayConfig::default()));
        let _router = create_router(state);
        // Router creation should not panic.
    }
}
