//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (KEY=value lines)
//!     → loader.rs (parse, unknown keys ignored)
//!     → validation.rs (source path present, TLS material complete)
//!     → Settings (immutable)
//!     → shared via Arc inside the server snapshot
//!
//! On explicit reload:
//!     loader.rs loads new settings
//!     → validation.rs validates
//!     → new snapshot swapped in atomically
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded; changes require a reload or restart
//! - Every key has a default so a minimal file only names `linuxpath`
//! - An unreadable file is logged, never fatal inside the loader

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, parse_settings, try_load_settings, ConfigError};
pub use schema::{NullBytePolicy, ServerOptions, Settings, TlsConfig};
pub use validation::{validate_settings, ValidationError};
