//! Wire protocol.
//!
//! ```text
//! client → server: up to BUFFER_SIZE raw bytes, one query per read
//! server → client: exactly one newline-terminated status line
//!     STRING EXISTS (Execution Time: 0.0001 seconds)
//!     STRING NOT FOUND (Execution Time: 0.0001 seconds)
//!     ERROR: Query string too long.
//! ```

pub mod query;
pub mod response;

pub use query::{Query, QueryError};
pub use response::Response;

/// Largest request read from a connection in one go.
pub const BUFFER_SIZE: usize = 1024;

/// Longest accepted query, in characters after trimming.
pub const MAX_STRING_LENGTH: usize = 256;
