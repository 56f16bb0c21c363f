//! Signalpost relay server -- in-memory signaling relay over HTTP.
//!
//! Peers exchange join/leave presence and WebRTC offers, answers and ICE
//! candidates through a single JSON resource. The relay never interprets
//! payloads; it only routes them by peer id and tracks room membership.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:9000
//! cargo run --bin signalpost-relay
//!
//! # Run on custom address
//! cargo run --bin signalpost-relay -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! RELAY_ADDR=127.0.0.1:8080 cargo run --bin signalpost-relay
//! ```

use clap::Parser;
use signalpost_relay::config::{RelayCliArgs, RelayConfig};
use signalpost_relay::server;

#[tokio::main]
async fn main() {
    let cli = RelayCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match RelayConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        addr = %config.bind_addr,
        max_queue_size = ?config.max_queue_size,
        "starting signalpost relay"
    );

    match server::start_server_with_config(&config).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "relay server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "relay server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start relay server");
            std::process::exit(1);
        }
    }
}
