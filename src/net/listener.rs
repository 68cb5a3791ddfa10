//! TCP listener with an optional connection ceiling.
//!
//! # Responsibilities
//! - Bind to the configured address with `SO_REUSEADDR` and a fixed backlog
//! - Accept incoming TCP connections
//! - Refuse connections beyond `max_connections` without blocking accept

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ServerOptions;
use crate::observability::metrics;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid bind address {address:?}: {source}")]
    Address {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error("failed to bind: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to accept: {0}")]
    Accept(#[source] std::io::Error),
}

/// A TCP listener that optionally limits concurrent connections.
///
/// Connections over the limit are closed straight away so the accept loop
/// never waits on a handler finishing.
pub struct Listener {
    inner: TcpListener,
    connection_limit: Option<Arc<Semaphore>>,
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(options: &ServerOptions) -> Result<Self, ListenerError> {
        let addr: SocketAddr =
            options
                .bind_address
                .parse()
                .map_err(|source| ListenerError::Address {
                    address: options.bind_address.clone(),
                    source,
                })?;

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(ListenerError::Bind)?;
        socket.set_reuseaddr(true).map_err(ListenerError::Bind)?;
        socket.bind(addr).map_err(ListenerError::Bind)?;
        let listener = socket.listen(options.backlog).map_err(ListenerError::Bind)?;

        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;
        tracing::info!(
            address = %local_addr,
            backlog = options.backlog,
            max_connections = ?options.max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: options.max_connections.map(|n| Arc::new(Semaphore::new(n))),
        })
    }

    /// Accept the next connection that fits under the limit.
    ///
    /// The returned permit must be held for the connection's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        loop {
            let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

            let Some(limit) = &self.connection_limit else {
                tracing::debug!(peer_addr = %addr, "Connection accepted");
                return Ok((stream, addr, ConnectionPermit { _permit: None }));
            };

            match Arc::clone(limit).try_acquire_owned() {
                Ok(permit) => {
                    tracing::debug!(
                        peer_addr = %addr,
                        available_permits = limit.available_permits(),
                        "Connection accepted"
                    );
                    return Ok((stream, addr, ConnectionPermit { _permit: Some(permit) }));
                }
                Err(_) => {
                    tracing::warn!(peer_addr = %addr, "Connection limit reached, closing connection");
                    metrics::connection_refused();
                    drop(stream);
                }
            }
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Free connection slots, or `None` when unlimited.
    pub fn available_permits(&self) -> Option<usize> {
        self.connection_limit.as_ref().map(|s| s.available_permits())
    }
}

/// A connection slot. Released when dropped, even if the handler panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: Option<OwnedSemaphorePermit>,
}
