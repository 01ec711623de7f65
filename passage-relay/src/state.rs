//! Shared application state.

use chrono::{DateTime, Utc};

use crate::config::RelayConfig;
use crate::registry::BridgeRegistry;
use crate::stats::RelayStats;

/// State shared by every handler.
///
/// One long-lived value constructed at startup and passed around in an
/// `Arc`; nothing here is a module-level singleton.
#[derive(Debug)]
pub struct AppState {
    /// Relay configuration
    pub config: RelayConfig,
    /// Connected bridges
    pub registry: BridgeRegistry,
    /// Process-wide counters and gauges
    pub stats: RelayStats,
    /// Process start time, reported in `/stats.json`
    pub start_time: DateTime<Utc>,
}

impl AppState {
    /// Creates fresh state from a configuration.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            registry: BridgeRegistry::new(),
            stats: RelayStats::new(),
            start_time: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_new() {
        let state = AppState::new(RelayConfig::default());
        assert!(state.registry.is_empty());
        assert_eq!(state.stats.snapshot(0, 0).bridges.accepted_control_websockets, 0);
    }
}
