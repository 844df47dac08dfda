//! line-lookup query server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client query
//!   ──────────────▶ net::listener ──▶ net::tls (optional) ──▶ server::handler
//!                                                                   │
//!                                                                   ▼
//!   Response line                                           dataset::store
//!   ◀────────────────────────────────────────────────────── (cached | reread)
//!
//!   Cross-cutting: config · lifecycle (startup/shutdown/signals) · observability
//! ```
//!
//! No command-line flags: configuration comes from `config.txt` in the working
//! directory, or from the file named by `LINE_LOOKUP_CONFIG`.

use std::time::Duration;

use line_lookup::lifecycle::{signals, startup};
use line_lookup::observability::logging::{init_logging, LogFormat};

/// How long to wait for in-flight queries after the accept loop stops.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LogFormat::from_env());

    tracing::info!("line-lookup v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = startup::config_path();
    let server = match startup::start(&config_path).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("line-lookup: {}", e);
            std::process::exit(1);
        }
    };

    let connections = server.connections();
    signals::spawn_signal_handler(server.handle());

    server.run().await?;

    if !connections.wait_for_idle(DRAIN_TIMEOUT).await {
        tracing::warn!(
            in_flight = connections.active_count(),
            "Drain deadline passed, exiting with queries in flight"
        );
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
