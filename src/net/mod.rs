//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, optional connection ceiling)
//!     → tls.rs (optional TLS handshake, run inside the connection task)
//!     → connection.rs (request/response loop, lifecycle tracking)
//!
//! Connection States:
//!     AwaitingRequest → Validating → Searching → Responding → AwaitingRequest
//!     any read/write failure, EOF, idle timeout or shutdown → Closed
//! ```
//!
//! # Design Decisions
//! - Accept never waits on a handler; each connection runs in its own task
//! - TLS is optional and handled transparently: handlers are generic over the stream
//! - Each connection is tracked for metrics and graceful shutdown

pub mod connection;
pub mod listener;
pub mod tls;

pub use connection::{
    CloseReason, ConnectionHandler, ConnectionId, ConnectionState, ConnectionSummary,
    ConnectionTracker, HandlerOptions,
};
pub use listener::{Listener, ListenerError};
pub use tls::{load_tls_acceptor, TlsError};
