//! Connection state machine and lifecycle tracking.
//!
//! # Responsibilities
//! - Run the request/response loop for one client
//!   (AwaitingRequest → Validating → Searching → Responding → AwaitingRequest | Closed)
//! - Generate unique connection IDs for tracing
//! - Count live connections for metrics and shutdown draining

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::NullBytePolicy;
use crate::index::{LookupMode, LookupResult};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::protocol::{Query, QueryError, Response, BUFFER_SIZE};
use crate::server::{SharedSnapshot, Snapshot};

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough: only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Where a handler is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    AwaitingRequest,
    Validating,
    Searching,
    Responding,
    Closed,
}

/// Why a handler stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client closed its side (zero-byte read).
    ClientClosed,
    /// The connection was reset or aborted mid-read or mid-write.
    Reset,
    /// No request arrived within the idle timeout.
    IdleTimeout,
    /// The server is shutting down.
    Shutdown,
    /// Any other I/O failure.
    Io(io::ErrorKind),
}

impl CloseReason {
    fn from_io(e: &io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => CloseReason::Reset,
            kind => CloseReason::Io(kind),
        }
    }
}

/// What a finished handler did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSummary {
    /// Responses sent, error responses included.
    pub responses: u64,
    pub reason: CloseReason,
}

/// Tracks active connections for metrics and graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        let active = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::connection_opened(active);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every connection has closed or `timeout` elapses.
    ///
    /// Returns `true` when fully drained.
    pub async fn wait_for_drain(&self, timeout: Duration) -> bool {
        let drained = async {
            while self.active_count() > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        tokio::time::timeout(timeout, drained).await.is_ok()
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements the active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let active = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::connection_closed(active);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// Per-connection knobs taken from the server options.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlerOptions {
    pub idle_timeout: Option<Duration>,
    pub null_byte_policy: NullBytePolicy,
}

/// Serves one client until it disconnects.
///
/// Owns the stream exclusively; it is dropped on every exit path.
pub struct ConnectionHandler<S> {
    stream: S,
    peer_addr: SocketAddr,
    snapshot: SharedSnapshot,
    options: HandlerOptions,
    shutdown: ShutdownSignal,
    guard: ConnectionGuard,
}

impl<S> ConnectionHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(
        stream: S,
        peer_addr: SocketAddr,
        snapshot: SharedSnapshot,
        options: HandlerOptions,
        shutdown: ShutdownSignal,
        guard: ConnectionGuard,
    ) -> Self {
        Self {
            stream,
            peer_addr,
            snapshot,
            options,
            shutdown,
            guard,
        }
    }

    /// Run the request/response loop.
    ///
    /// Each response is written before the next request is read, so responses
    /// stay 1:1 and in order with requests.
    pub async fn run(mut self) -> ConnectionSummary {
        let connection_id = self.guard.id();
        let peer_addr = self.peer_addr;
        let mut buf = vec![0u8; BUFFER_SIZE];
        let mut responses = 0;

        let reason = loop {
            enter(connection_id, ConnectionState::AwaitingRequest);
            let n = match self.receive(&mut buf).await {
                Ok(0) => break CloseReason::ClientClosed,
                Ok(n) => n,
                Err(reason) => break reason,
            };

            enter(connection_id, ConnectionState::Validating);
            let response = match Query::parse(&buf[..n], self.options.null_byte_policy) {
                Err(QueryError::TooLong { length, preview }) => {
                    tracing::error!(
                        %connection_id,
                        %peer_addr,
                        length,
                        "Query string too long: {preview}... (truncated)"
                    );
                    metrics::record_rejected();
                    Response::TooLong
                }
                Ok(query) => {
                    tracing::debug!(
                        %connection_id,
                        %peer_addr,
                        query = %query,
                        "Received search query"
                    );
                    enter(connection_id, ConnectionState::Searching);
                    let result = search(self.snapshot.load(), query).await;
                    metrics::record_query(result.found, result.elapsed);
                    Response::from(result)
                }
            };

            enter(connection_id, ConnectionState::Responding);
            let line = response.as_line();
            if let Err(e) = self.stream.write_all(line.as_bytes()).await {
                break CloseReason::from_io(&e);
            }
            responses += 1;
            tracing::debug!(
                %connection_id,
                %peer_addr,
                response = line.trim_end(),
                "Sent response"
            );
        };

        enter(connection_id, ConnectionState::Closed);
        match reason {
            CloseReason::ClientClosed | CloseReason::Reset => {
                tracing::debug!(%connection_id, %peer_addr, ?reason, "Connection closed by the client")
            }
            CloseReason::IdleTimeout => {
                tracing::info!(%connection_id, %peer_addr, "Closing idle connection")
            }
            CloseReason::Shutdown => {
                tracing::debug!(%connection_id, %peer_addr, "Closing connection for shutdown")
            }
            CloseReason::Io(kind) => {
                tracing::warn!(%connection_id, %peer_addr, ?kind, "Connection error")
            }
        }

        ConnectionSummary { responses, reason }
    }

    /// Read one request, honoring the idle timeout and shutdown.
    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, CloseReason> {
        let idle_timeout = self.options.idle_timeout;
        let stream = &mut self.stream;
        let read = async move {
            match idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, stream.read(buf)).await {
                    Ok(result) => result.map_err(|e| CloseReason::from_io(&e)),
                    Err(_) => Err(CloseReason::IdleTimeout),
                },
                None => stream.read(buf).await.map_err(|e| CloseReason::from_io(&e)),
            }
        };

        tokio::select! {
            result = read => result,
            _ = self.shutdown.recv() => Err(CloseReason::Shutdown),
        }
    }
}

/// Run the lookup, moving reread-mode file I/O off the async workers.
async fn search(snapshot: Arc<Snapshot>, query: Query) -> LookupResult {
    match snapshot.index().mode() {
        LookupMode::Cached => snapshot.lookup(query.as_str()),
        LookupMode::Reread => {
            match tokio::task::spawn_blocking(move || snapshot.lookup(query.as_str())).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "Reread lookup task failed");
                    LookupResult {
                        found: false,
                        elapsed: Duration::ZERO,
                    }
                }
            }
        }
    }
}

fn enter(connection_id: ConnectionId, state: ConnectionState) {
    tracing::trace!(%connection_id, ?state, "Connection state");
}
