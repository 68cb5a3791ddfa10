//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! listener, handlers, index:
//!     → logging.rs (tracing events: queries, responses, connection lifecycle)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → optional Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Logging and metrics never fail or block the request path
//! - Peer address and connection id travel as structured fields

pub mod logging;
pub mod metrics;
