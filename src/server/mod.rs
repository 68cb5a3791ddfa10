//! Lookup server: accept loop, per-connection tasks and explicit reload.
//!
//! # Responsibilities
//! - Hand each accepted connection (plain or TLS) to its own handler task
//! - Share the current settings/index snapshot with every handler
//! - Reload the configuration on request, swapping the snapshot atomically
//! - Stop accepting on shutdown and drain open connections

pub mod snapshot;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;

use crate::config::{try_load_settings, validate_settings, ConfigError, ServerOptions, Settings, ValidationError};
use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::net::listener::ConnectionPermit;
use crate::net::{ConnectionHandler, ConnectionId, ConnectionTracker, HandlerOptions, Listener, ListenerError};

pub use snapshot::{SharedSnapshot, Snapshot};

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("no configuration file to reload from")]
    NoConfigPath,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("reloaded configuration is invalid: {0:?}")]
    Invalid(Vec<ValidationError>),

    #[error("reload task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The line-lookup server.
pub struct LookupServer {
    snapshot: SharedSnapshot,
    options: ServerOptions,
    tls: Option<TlsAcceptor>,
    config_path: Option<PathBuf>,
    tracker: ConnectionTracker,
}

impl LookupServer {
    /// Create a server over `settings`, building the index eagerly.
    pub fn new(settings: Settings, options: ServerOptions) -> Self {
        Self {
            snapshot: SharedSnapshot::new(Snapshot::new(settings)),
            options,
            tls: None,
            config_path: None,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Wrap every accepted connection in TLS.
    pub fn with_tls(mut self, acceptor: TlsAcceptor) -> Self {
        self.tls = Some(acceptor);
        self
    }

    /// Remember where the settings came from so [`reload`](Self::reload) can re-read it.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// The snapshot handlers are currently served from.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load()
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Re-read the configuration file and swap in a freshly built snapshot.
    ///
    /// Queries already searching finish against the old snapshot; later ones
    /// see the new one. On any error the current snapshot stays in place.
    /// The bind address and TLS material are fixed for the process lifetime.
    pub fn reload(&self) -> Result<(), ReloadError> {
        let path = self.config_path.as_deref().ok_or(ReloadError::NoConfigPath)?;
        let settings = try_load_settings(path)?;
        validate_settings(&settings).map_err(ReloadError::Invalid)?;

        let previous = self.snapshot.load();
        if settings.tls() != previous.settings().tls() {
            tracing::warn!("TLS settings changed; restart to apply them");
        }

        let previous = self.snapshot.replace(Snapshot::new(settings));
        let current = self.snapshot.load();
        tracing::info!(
            source_path = ?current.settings().source_path,
            reread_on_query = current.settings().reread_on_query,
            previous_source_path = ?previous.settings().source_path,
            "Configuration reloaded"
        );
        Ok(())
    }

    /// [`reload`](Self::reload) on the blocking pool.
    ///
    /// Building a cached index reads the whole source file, which must not
    /// stall the runtime workers serving queries.
    pub async fn reload_in_background(self: &Arc<Self>) -> Result<(), ReloadError> {
        let server = Arc::clone(self);
        tokio::task::spawn_blocking(move || server.reload()).await?
    }

    /// Accept connections until `shutdown` fires, then drain.
    ///
    /// Handlers are spawned fire-and-forget; an error inside one never reaches
    /// this loop or any other connection.
    pub async fn run(self: Arc<Self>, listener: Listener, shutdown: Shutdown) -> Result<(), ListenerError> {
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(
            address = %local_addr,
            tls = self.tls.is_some(),
            "Listening on {local_addr}"
        );

        let mut stop = shutdown.subscribe();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr, permit)) => {
                        tracing::info!(%peer_addr, "Accepted connection");
                        self.spawn_connection(stream, peer_addr, permit, &shutdown);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                _ = stop.recv() => break,
            }
        }

        drop(listener);
        tracing::info!(
            active_connections = self.tracker.active_count(),
            "Stopped accepting, draining connections"
        );
        if !self.tracker.wait_for_drain(self.options.drain_timeout).await {
            tracing::warn!(
                remaining = self.tracker.active_count(),
                "Drain timeout elapsed with connections still open"
            );
        }
        tracing::info!("Server stopped");
        Ok(())
    }

    fn spawn_connection(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
        permit: ConnectionPermit,
        shutdown: &Shutdown,
    ) {
        let guard = self.tracker.track();
        let snapshot = self.snapshot.clone();
        let options = HandlerOptions {
            idle_timeout: self.options.idle_timeout,
            null_byte_policy: self.options.null_byte_policy,
        };
        let mut stop = shutdown.subscribe();
        let tls = self.tls.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let connection_id = guard.id();
            match tls {
                None => {
                    ConnectionHandler::new(stream, peer_addr, snapshot, options, stop, guard)
                        .run()
                        .await;
                }
                Some(acceptor) => {
                    let Some(tls_stream) =
                        accept_tls(&acceptor, stream, options.idle_timeout, &mut stop, connection_id, peer_addr)
                            .await
                    else {
                        return;
                    };
                    ConnectionHandler::new(tls_stream, peer_addr, snapshot, options, stop, guard)
                        .run()
                        .await;
                }
            }
        });
    }
}

/// Finish the TLS handshake unless the idle timeout or shutdown comes first.
///
/// A client that connects and never speaks is treated like an idle one.
async fn accept_tls(
    acceptor: &TlsAcceptor,
    stream: TcpStream,
    idle_timeout: Option<Duration>,
    stop: &mut ShutdownSignal,
    connection_id: ConnectionId,
    peer_addr: SocketAddr,
) -> Option<TlsStream<TcpStream>> {
    let handshake = async {
        match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, acceptor.accept(stream)).await.ok(),
            None => Some(acceptor.accept(stream).await),
        }
    };

    tokio::select! {
        outcome = handshake => match outcome {
            Some(Ok(tls_stream)) => Some(tls_stream),
            Some(Err(e)) => {
                tracing::warn!(%connection_id, %peer_addr, error = %e, "TLS handshake failed");
                None
            }
            None => {
                tracing::info!(%connection_id, %peer_addr, "TLS handshake timed out");
                None
            }
        },
        _ = stop.recv() => {
            tracing::debug!(%connection_id, %peer_addr, "Shutdown during TLS handshake");
            None
        }
    }
}
