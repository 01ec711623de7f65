//! # Passage Relay
//!
//! Connection broker for the Passage multiplexing WebSocket relay.
//!
//! Bridges behind NAT or a firewall dial in and register a control
//! channel under a bridge id. Remote controllers connect by that id and
//! are paired with a bridge-side data channel, after which the relay
//! pumps bytes in both directions without interpreting them. Each
//! controller session carries its own token-bucket rate limiter.
//!
//! # Endpoints
//!
//! - `/bridge/control/{bridge_id}` - bridge control channel
//! - `/bridge/data/{bridge_id}/{connection_id}` - bridge data channel
//! - `/remote-controller/{bridge_id}` - remote controller channel
//! - `/status/{bridge_id}` - status observer channel
//! - `/stats.json` - statistics snapshot
//! - `/config.js` - base URL script for the bundled UI
//! - everything else - static assets
//!
//! # Lifecycle
//!
//! Registering a bridge id that is already taken kicks the previous
//! bridge (close code 3000) together with all of its sessions. A
//! session ends when either of its endpoints fails, when its rate
//! limiter trips (close code 3001), or when its bridge is torn down.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod message;
pub mod registry;
pub mod routes;
pub mod server;
pub mod state;
pub mod stats;
pub mod ws;

pub use config::{RateLimitConfig, RelayConfig};
pub use error::RelayError;
pub use routes::create_router;
pub use server::RelayServer;
pub use state::AppState;
pub use stats::{RelayStats, StatsSnapshot};
