//! OS signal handling.
//!
//! SIGINT and SIGTERM both translate into a graceful stop of the accept loop.

use tokio::task::JoinHandle;

use crate::server::ServerHandle;

/// Wait for the first termination signal and return its name.
pub async fn wait_for_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => "SIGINT",
                    _ = term.recv() => "SIGTERM",
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler, listening for Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
                "SIGINT"
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        "SIGINT"
    }
}

/// Stop the server when a termination signal arrives.
pub fn spawn_signal_handler(handle: ServerHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        tracing::info!(signal = signal, "Termination signal received");
        handle.stop();
    })
}
