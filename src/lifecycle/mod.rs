//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load settings → Validate → TLS material → Build index → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Close idle handlers → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Reload configuration
//! ```
//!
//! # Design Decisions
//! - Configuration problems abort startup before anything is bound
//! - Shutdown has a deadline: connections still open after it are abandoned

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{start, start_with_settings, Started, StartupError};
