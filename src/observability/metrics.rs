//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lookup_queries_total` (counter): answered queries by `result` (found, not_found)
//! - `lookup_rejected_total` (counter): queries refused as too long
//! - `lookup_duration_seconds` (histogram): search time per query
//! - `lookup_connections_total` (counter): connections handed to a handler
//! - `lookup_connections_refused_total` (counter): connections closed at the limit
//! - `lookup_active_connections` (gauge): current connection count
//!
//! Recording is a no-op until a recorder is installed, so handlers call these
//! unconditionally.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_query(found: bool, elapsed: Duration) {
    let result = if found { "found" } else { "not_found" };
    ::metrics::counter!("lookup_queries_total", "result" => result).increment(1);
    ::metrics::histogram!("lookup_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_rejected() {
    ::metrics::counter!("lookup_rejected_total").increment(1);
}

pub fn connection_opened(active: u64) {
    ::metrics::counter!("lookup_connections_total").increment(1);
    ::metrics::gauge!("lookup_active_connections").set(active as f64);
}

pub fn connection_closed(active: u64) {
    ::metrics::gauge!("lookup_active_connections").set(active as f64);
}

pub fn connection_refused() {
    ::metrics::counter!("lookup_connections_refused_total").increment(1);
}
