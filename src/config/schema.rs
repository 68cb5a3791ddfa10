//! Configuration schema definitions.
//!
//! Two layers feed the server:
//! - [`Settings`]: the key=value file naming the source file and TLS policy.
//! - [`ServerOptions`]: process parameters (bind address, limits, timeouts)
//!   supplied by the command line.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default bind address for the lookup listener.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:9997";

/// Pending-connection queue length passed to `listen(2)`.
pub const DEFAULT_BACKLOG: u32 = 5;

/// Snapshot of the key=value configuration file.
///
/// Built once at startup (or on an explicit reload) and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// File whose lines are searched (`linuxpath`).
    pub source_path: Option<PathBuf>,

    /// Re-read and re-sort the source file for every query (`REREAD_ON_QUERY`).
    pub reread_on_query: bool,

    /// Wrap accepted connections in TLS (`SSL_ENABLED`).
    pub tls_enabled: bool,

    /// PEM certificate chain (`CERT_FILE`).
    pub cert_path: Option<PathBuf>,

    /// PEM private key (`KEY_FILE`).
    pub key_path: Option<PathBuf>,
}

impl Settings {
    /// TLS material when TLS is enabled and both paths are present.
    pub fn tls(&self) -> Option<TlsConfig> {
        if !self.tls_enabled {
            return None;
        }
        match (&self.cert_path, &self.key_path) {
            (Some(cert_path), Some(key_path)) => Some(TlsConfig {
                cert_path: cert_path.clone(),
                key_path: key_path.clone(),
            }),
            _ => None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// How NUL bytes inside a request payload are treated before decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NullBytePolicy {
    /// Remove every NUL byte (`b"a\0b"` becomes `"ab"`).
    #[default]
    Strip,
    /// Replace every NUL byte with a space (`b"a\0b"` becomes `"a b"`).
    Space,
}

/// Process-level options for the listener and connection handlers.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Bind address (e.g., "0.0.0.0:9997").
    pub bind_address: String,

    /// Listen backlog.
    pub backlog: u32,

    /// Maximum concurrent connections. `None` accepts without limit.
    pub max_connections: Option<usize>,

    /// Close a connection that sends nothing for this long. `None` waits forever.
    pub idle_timeout: Option<Duration>,

    /// NUL byte handling for incoming requests.
    pub null_byte_policy: NullBytePolicy,

    /// Prometheus scrape endpoint, if metrics export is wanted.
    pub metrics_address: Option<SocketAddr>,

    /// How long shutdown waits for open connections to finish.
    pub drain_timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            backlog: DEFAULT_BACKLOG,
            max_connections: None,
            idle_timeout: None,
            null_byte_policy: NullBytePolicy::Strip,
            metrics_address: None,
            drain_timeout: Duration::from_secs(5),
        }
    }
}
