//! Line lookup server library.
//!
//! Clients send a line of text over TCP (optionally TLS); the server answers
//! whether that exact line exists in a configured file, with the search time.

pub mod config;
pub mod index;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod server;

pub use config::{ServerOptions, Settings};
pub use index::{LineIndex, LineSet, LookupResult};
pub use lifecycle::Shutdown;
pub use server::LookupServer;
