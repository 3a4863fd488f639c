//! TodoTerm development API server.
//!
//! Serves the todolist REST API in memory: captcha-gated authentication,
//! bearer-token sessions, and todolist CRUD.
//!
//! ```bash
//! # Run on the default address 127.0.0.1:7878
//! cargo run --bin todoterm-server
//!
//! # Run on a custom address with a stricter captcha gate
//! cargo run --bin todoterm-server -- --bind 127.0.0.1:8080 \
//!     --captcha-after-failures 1
//!
//! # Or via environment variable
//! TODOTERM_SERVER_ADDR=127.0.0.1:8080 cargo run --bin todoterm-server
//! ```

use std::sync::Arc;

use clap::Parser;

use todoterm_server::config::{ServerCliArgs, ServerConfig};
use todoterm_server::server::{self, ServerState};

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

    tracing::info!(addr = %config.bind_addr, "starting todoterm dev server");

    let state = Arc::new(ServerState::new(&config));

    match server::start_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "todoterm dev server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
