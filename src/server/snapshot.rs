//! Immutable settings + index pairs shared with connection handlers.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::Settings;
use crate::index::{LineIndex, LookupResult};

/// What every handler queries: the settings and the index built from them.
#[derive(Debug)]
pub struct Snapshot {
    settings: Settings,
    index: LineIndex,
}

impl Snapshot {
    /// Build the index `settings` asks for. Cached mode reads the file here.
    pub fn new(settings: Settings) -> Self {
        let index = LineIndex::from_settings(&settings);
        Self { settings, index }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn index(&self) -> &LineIndex {
        &self.index
    }

    pub fn lookup(&self, query: &str) -> LookupResult {
        self.index.lookup(query)
    }
}

/// Handle to the current [`Snapshot`].
///
/// Readers take an `Arc` to whichever snapshot is current; a reload swaps in a
/// fully built replacement, so no reader sees a partial one.
#[derive(Debug, Clone)]
pub struct SharedSnapshot {
    current: Arc<ArcSwap<Snapshot>>,
}

impl SharedSnapshot {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(snapshot)),
        }
    }

    pub fn load(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Publish `snapshot`, returning the one it replaced.
    pub fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        self.current.swap(Arc::new(snapshot))
    }
}
