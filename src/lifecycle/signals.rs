//! OS signal handling.
//!
//! - SIGINT (Ctrl+C) and SIGTERM trigger graceful shutdown
//! - SIGHUP reloads the configuration file

use std::sync::Arc;

use crate::lifecycle::Shutdown;
use crate::server::LookupServer;

/// Translate process signals into shutdown and reload until shutdown.
pub async fn handle_signals(server: Arc<LookupServer>, shutdown: Shutdown) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut hangup, mut terminate) =
            match (signal(SignalKind::hangup()), signal(SignalKind::terminate())) {
                (Ok(hangup), Ok(terminate)) => (hangup, terminate),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::error!(error = %e, "Failed to install signal handlers; Ctrl+C only");
                    wait_for_ctrl_c().await;
                    shutdown.trigger();
                    return;
                }
            };

        loop {
            tokio::select! {
                _ = wait_for_ctrl_c() => break,
                _ = terminate.recv() => {
                    tracing::info!("SIGTERM received");
                    break;
                }
                _ = hangup.recv() => {
                    tracing::info!("SIGHUP received, reloading configuration");
                    if let Err(e) = server.reload_in_background().await {
                        tracing::error!(error = %e, "Reload failed. Keeping current configuration.");
                    }
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = &server;
        wait_for_ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
