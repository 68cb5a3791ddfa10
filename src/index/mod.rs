//! Line lookup engine.
//!
//! # Data Flow
//! ```text
//! Settings
//!     → LineIndex::from_settings
//!         REREAD_ON_QUERY=false → line_set.rs builds the set once (O(1) lookups)
//!         REREAD_ON_QUERY=true  → search.rs reads, sorts and bisects per query
//!     → LookupResult { found, elapsed }
//! ```
//!
//! # Design Decisions
//! - Lines and queries are compared byte-for-byte after trimming
//! - File errors are logged and read as "no matching lines"
//! - The cached set has no write path after construction, so handlers share it
//!   without locking

pub mod line_set;
pub mod search;

pub use line_set::LineSet;
pub use search::{lookup, LineIndex, LookupMode, LookupResult};
