//! # Passage Server
//!
//! Entry point for the Passage multiplexing WebSocket relay.
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (listen on 0.0.0.0:8080, serve ./static)
//! passage-server
//!
//! # Behind a reverse proxy under /passage
//! passage-server --address 127.0.0.1:9090 --reverse-proxy-base /passage
//!
//! # Environment variable overrides
//! PASSAGE_ADDRESS=0.0.0.0:8081 passage-server
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod shutdown;

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use passage_relay::{RelayConfig, RelayServer};

/// Passage WebSocket relay
#[derive(Parser, Debug)]
#[command(name = "passage-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Listen address
    #[arg(long, env = "PASSAGE_ADDRESS", default_value = "0.0.0.0:8080")]
    address: String,

    /// Path prefix injected into config.js for reverse-proxy deployments
    #[arg(long, env = "PASSAGE_REVERSE_PROXY_BASE", default_value = "")]
    reverse_proxy_base: String,

    /// Directory served for non-relay paths
    #[arg(long, env = "PASSAGE_STATIC_DIR", default_value = "static")]
    static_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    let config = RelayConfig {
        address: args.address,
        reverse_proxy_base: args.reverse_proxy_base,
        static_dir: args.static_dir,
        ..RelayConfig::default()
    };

    let server = RelayServer::new(config);
    match server.run_with_shutdown(shutdown::shutdown_signal()).await {
        Ok(()) => info!("passage server stopped"),
        Err(e) => {
            error!("server error: {e}");
            std::process::exit(1);
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` wins when set; otherwise the level follows `--debug`.
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
