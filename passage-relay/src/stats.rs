//! Process-wide relay statistics.
//!
//! Counters are plain atomics owned by the shared [`AppState`] rather
//! than module-level globals. The bitrate gauges are refreshed once per
//! second by the sampler task.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::state::AppState;

/// Relay counters and gauges.
#[derive(Debug, Default)]
pub struct RelayStats {
    accepted_bridge_control: AtomicU64,
    accepted_bridge_data: AtomicU64,
    kicked_bridges: AtomicU64,
    accepted_controllers: AtomicU64,
    rejected_controllers_no_bridge: AtomicU64,
    bridge_to_controller_bytes: AtomicU64,
    controller_to_bridge_bytes: AtomicU64,
    rate_limit_exceeded: AtomicU64,
    bridge_to_controller_bitrate: AtomicU64,
    controller_to_bridge_bitrate: AtomicU64,
}

impl RelayStats {
    /// Creates zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an accepted bridge control channel.
    pub fn bridge_control_accepted(&self) {
        self.accepted_bridge_control.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an accepted bridge data channel.
    pub fn bridge_data_accepted(&self) {
        self.accepted_bridge_data.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a bridge displaced by a newer registration.
    pub fn bridge_kicked(&self) {
        self.kicked_bridges.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an accepted remote controller channel.
    pub fn controller_accepted(&self) {
        self.accepted_controllers.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a remote controller refused for lack of a bridge.
    pub fn controller_rejected_no_bridge(&self) {
        self.rejected_controllers_no_bridge
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Accounts bytes read off a bridge data channel.
    pub fn add_bridge_to_controller_bytes(&self, n: u64) {
        self.bridge_to_controller_bytes
            .fetch_add(n, Ordering::Relaxed);
    }

    /// Accounts bytes read off a remote controller channel.
    pub fn add_controller_to_bridge_bytes(&self, n: u64) {
        self.controller_to_bridge_bytes
            .fetch_add(n, Ordering::Relaxed);
    }

    /// Records a session closed for exceeding its rate limit.
    pub fn rate_limit_tripped(&self) {
        self.rate_limit_exceeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Builds a snapshot for `/stats.json`.
    #[must_use]
    pub fn snapshot(&self, bridges_connected: usize, start_time: i64) -> StatsSnapshot {
        StatsSnapshot {
            general: GeneralStats {
                start_time,
                rate_limit_exceeded: self.rate_limit_exceeded.load(Ordering::Relaxed),
            },
            bridges: BridgeStats {
                connected: bridges_connected,
                accepted_control_websockets: self.accepted_bridge_control.load(Ordering::Relaxed),
                accepted_data_websockets: self.accepted_bridge_data.load(Ordering::Relaxed),
                kicked: self.kicked_bridges.load(Ordering::Relaxed),
            },
            remote_controllers: RemoteControllerStats {
                accepted_websockets: self.accepted_controllers.load(Ordering::Relaxed),
                rejected_websockets_no_bridge: self
                    .rejected_controllers_no_bridge
                    .load(Ordering::Relaxed),
            },
            traffic: TrafficStats {
                bridges_to_remote_controllers: TrafficDirection {
                    total_bytes: self.bridge_to_controller_bytes.load(Ordering::Relaxed),
                    current_bitrate: self.bridge_to_controller_bitrate.load(Ordering::Relaxed),
                },
                remote_controllers_to_bridges: TrafficDirection {
                    total_bytes: self.controller_to_bridge_bytes.load(Ordering::Relaxed),
                    current_bitrate: self.controller_to_bridge_bitrate.load(Ordering::Relaxed),
                },
            },
        }
    }

    fn update_bitrates(&self, prev: &mut BitrateWindow) {
        let b2c = self.bridge_to_controller_bytes.load(Ordering::Relaxed);
        self.bridge_to_controller_bitrate
            .store(8 * (b2c - prev.bridge_to_controller), Ordering::Relaxed);
        prev.bridge_to_controller = b2c;

        let c2b = self.controller_to_bridge_bytes.load(Ordering::Relaxed);
        self.controller_to_bridge_bitrate
            .store(8 * (c2b - prev.controller_to_bridge), Ordering::Relaxed);
        prev.controller_to_bridge = c2b;
    }
}

#[derive(Debug, Default)]
struct BitrateWindow {
    bridge_to_controller: u64,
    controller_to_bridge: u64,
}

/// Spawns the 1 Hz bitrate sampler.
///
/// Each tick stores `8 x` the byte delta since the previous tick into
/// the corresponding gauge. The task runs until aborted.
pub fn spawn_bitrate_sampler(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        let mut window = BitrateWindow::default();
        loop {
            interval.tick().await;
            state.stats.update_bitrates(&mut window);
        }
    })
}

/// Snapshot served at `/stats.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Process-level figures
    pub general: GeneralStats,
    /// Bridge-side figures
    pub bridges: BridgeStats,
    /// Controller-side figures
    pub remote_controllers: RemoteControllerStats,
    /// Relayed traffic figures
    pub traffic: TrafficStats,
}

/// Process-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralStats {
    /// Unix timestamp of process start
    pub start_time: i64,
    /// Sessions closed for exceeding their rate limit
    pub rate_limit_exceeded: u64,
}

/// Bridge-side statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStats {
    /// Bridges currently registered
    pub connected: usize,
    /// Control channels accepted since start
    pub accepted_control_websockets: u64,
    /// Data channels accepted since start
    pub accepted_data_websockets: u64,
    /// Bridges displaced by a newer registration
    pub kicked: u64,
}

/// Controller-side statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteControllerStats {
    /// Controller channels accepted since start
    pub accepted_websockets: u64,
    /// Controller channels refused for lack of a bridge
    pub rejected_websockets_no_bridge: u64,
}

/// Relayed traffic statistics, per direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficStats {
    /// Bridge to controller direction
    pub bridges_to_remote_controllers: TrafficDirection,
    /// Controller to bridge direction
    pub remote_controllers_to_bridges: TrafficDirection,
}

/// Totals and current bitrate for one direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficDirection {
    /// Bytes relayed since start
    pub total_bytes: u64,
    /// Bits per second over the last sampler window
    pub current_bitrate: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = RelayStats::new();
        stats.bridge_control_accepted();
        stats.bridge_kicked();
        stats.add_controller_to_bridge_bytes(10);
        stats.add_controller_to_bridge_bytes(32);
        stats.rate_limit_tripped();

        let snapshot = stats.snapshot(1, 0);
        assert_eq!(snapshot.bridges.connected, 1);
        assert_eq!(snapshot.bridges.accepted_control_websockets, 1);
        assert_eq!(snapshot.bridges.kicked, 1);
        assert_eq!(snapshot.traffic.remote_controllers_to_bridges.total_bytes, 42);
        assert_eq!(snapshot.general.rate_limit_exceeded, 1);
    }

    #[test]
    fn test_bitrate_window() {
        let stats = RelayStats::new();
        let mut window = BitrateWindow::default();

        stats.add_bridge_to_controller_bytes(1_000);
        stats.update_bitrates(&mut window);
        assert_eq!(
            stats
                .snapshot(0, 0)
                .traffic
                .bridges_to_remote_controllers
                .current_bitrate,
            8_000
        );

        // No new bytes, the next window reads zero.
        stats.update_bitrates(&mut window);
        assert_eq!(
            stats
                .snapshot(0, 0)
                .traffic
                .bridges_to_remote_controllers
                .current_bitrate,
            0
        );
    }

    #[test]
    fn test_snapshot_wire_format() {
        let stats = RelayStats::new();
        let json = serde_json::to_string(&stats.snapshot(0, 1_700_000_000)).unwrap();
        assert!(json.contains(r#""general":{"startTime":1700000000,"rateLimitExceeded":0}"#));
        assert!(json.contains(r#""remoteControllers""#));
        assert!(json.contains(r#""bridgesToRemoteControllers":{"totalBytes":0,"currentBitrate":0}"#));
    }
}
