//! Plain HTTP handlers.

use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::state::AppState;
use crate::stats::StatsSnapshot;

/// Statistics snapshot handler.
///
/// GET /stats.json
pub async fn stats_json(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    Json(
        state
            .stats
            .snapshot(state.registry.len(), state.start_time.timestamp()),
    )
}

/// Base URL script handler for the bundled UI.
///
/// GET /config.js
pub async fn config_js(State(state): State<Arc<AppState>>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/javascript")],
        render_config_js(&state.config.reverse_proxy_base),
    )
        .into_response()
}

fn render_config_js(reverse_proxy_base: &str) -> String {
    format!("const baseUrl = `${{window.location.host}}{reverse_proxy_base}`;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;

    #[tokio::test]
    async fn test_stats_json() {
        let state = Arc::new(AppState::new(RelayConfig::default()));
        state.stats.controller_rejected_no_bridge();

        let Json(snapshot) = stats_json(State(state)).await;
        assert_eq!(snapshot.bridges.connected, 0);
        assert_eq!(snapshot.remote_controllers.rejected_websockets_no_bridge, 1);
        assert!(snapshot.general.start_time > 0);
    }

    #[test]
    fn test_render_config_js() {
        assert_eq!(
            render_config_js(""),
            "const baseUrl = `${window.location.host}`;"
        );
        assert_eq!(
            render_config_js("/passage"),
            "const baseUrl = `${window.location.host}/passage`;"
        );
    }
}
