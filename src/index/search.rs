//! Exact-match lookup over the cached set or a fresh read of the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::index::line_set::{read_trimmed_lines, LineSet};

/// Outcome of one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupResult {
    pub found: bool,
    /// Time spent searching, excluding socket I/O.
    pub elapsed: Duration,
}

/// Which search path a [`LineIndex`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    Cached,
    Reread,
}

/// The active search strategy for one server snapshot.
///
/// The variant is fixed at construction from `reread_on_query`, so exactly one
/// path is live for the snapshot's lifetime.
#[derive(Debug, Clone)]
pub enum LineIndex {
    /// Membership test against a set built once at startup.
    Cached(Arc<LineSet>),
    /// Read, sort and binary-search the file on every query.
    Reread(PathBuf),
}

impl LineIndex {
    /// Build the index chosen by `settings`.
    ///
    /// Cached mode loads the file eagerly. A missing source path yields an
    /// empty cached index; startup validation rejects that before serving.
    pub fn from_settings(settings: &Settings) -> Self {
        match (&settings.source_path, settings.reread_on_query) {
            (Some(path), true) => Self::Reread(path.clone()),
            (Some(path), false) => {
                let set = LineSet::build(path);
                tracing::info!(
                    path = %path.display(),
                    lines = set.len(),
                    "File content cached for future queries (REREAD_ON_QUERY=false)"
                );
                Self::Cached(Arc::new(set))
            }
            (None, _) => Self::Cached(Arc::new(LineSet::default())),
        }
    }

    pub fn mode(&self) -> LookupMode {
        match self {
            Self::Cached(_) => LookupMode::Cached,
            Self::Reread(_) => LookupMode::Reread,
        }
    }

    /// Look up `query`, timing only the search.
    ///
    /// In reread mode this performs blocking file I/O.
    pub fn lookup(&self, query: &str) -> LookupResult {
        let start = Instant::now();
        let found = match self {
            Self::Cached(set) => set.contains(query),
            Self::Reread(path) => reread_contains(path, query),
        };
        LookupResult {
            found,
            elapsed: start.elapsed(),
        }
    }
}

/// Look up `query` using the strategy `settings` selects.
///
/// `cached` is consulted only when `reread_on_query` is false; `None` there
/// behaves like an empty set.
pub fn lookup(query: &str, settings: &Settings, cached: Option<&LineSet>) -> LookupResult {
    let start = Instant::now();
    let found = if settings.reread_on_query {
        match &settings.source_path {
            Some(path) => reread_contains(path, query),
            None => {
                tracing::error!("Reread lookup requested without a source path");
                false
            }
        }
    } else {
        cached.is_some_and(|set| set.contains(query))
    };
    LookupResult {
        found,
        elapsed: start.elapsed(),
    }
}

/// Read the file fresh, sort it and binary-search for `query`.
fn reread_contains(path: &Path, query: &str) -> bool {
    let mut lines = match read_trimmed_lines(path) {
        Ok(lines) => lines,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Cannot reread source file");
            return false;
        }
    };
    lines.sort_unstable();
    lines.binary_search_by(|line| line.as_str().cmp(query)).is_ok()
}
