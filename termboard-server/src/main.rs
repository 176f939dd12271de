//! `TermBoard` task server -- in-memory kanban backend.
//!
//! An axum HTTP server that stores tasks and answers the board
//! client's session, snapshot, and mutation requests. Mutations are
//! guarded by a double-submit CSRF token.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:8350
//! cargo run --bin termboard-server
//!
//! # Run on custom address
//! cargo run --bin termboard-server -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! TERMBOARD_SERVER_ADDR=127.0.0.1:8080 cargo run --bin termboard-server
//! ```

use std::sync::Arc;

use clap::Parser;
use termboard_server::config::{ServerCliArgs, ServerConfig};
use termboard_server::server::{self, ServerState};

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
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

    tracing::info!(addr = %config.bind_addr, "starting termboard task server");

    let state = Arc::new(ServerState::with_config(config.max_tasks));

    match server::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "task server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "task server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start task server");
            std::process::exit(1);
        }
    }
}
