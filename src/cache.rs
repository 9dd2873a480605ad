use std::collections::HashMap;
use std::sync::Arc;

use crate::data::loader::{self, LoadOptions, LoadOutcome, Source};
use crate::data::model::EventTable;

/// A loaded table plus the warning produced while loading it.
#[derive(Debug, Clone)]
pub struct CachedTable {
    pub table: Arc<EventTable>,
    pub warning: Option<String>,
}

/// Loaded tables keyed by source identifier.
///
/// A source is loaded on first access and reused until it is invalidated.
/// Tables are shared read-only through `Arc`.
pub struct DatasetCache {
    options: LoadOptions,
    loader: Box<dyn Fn(&Source, &LoadOptions) -> LoadOutcome>,
    entries: HashMap<String, CachedTable>,
}

impl DatasetCache {
    pub fn new(options: LoadOptions) -> Self {
        Self::with_loader(options, loader::load)
    }

    /// Cache backed by a custom load function.
    pub fn with_loader(
        options: LoadOptions,
        loader: impl Fn(&Source, &LoadOptions) -> LoadOutcome + 'static,
    ) -> Self {
        Self {
            options,
            loader: Box::new(loader),
            entries: HashMap::new(),
        }
    }

    /// Return the cached table for `source`, loading it on first use.
    pub fn get_or_load(&mut self, source: &Source) -> CachedTable {
        let key = source.id();
        if let Some(hit) = self.entries.get(&key) {
            log::debug!("Dataset cache hit for {key}");
            return hit.clone();
        }

        let outcome = (self.loader)(source, &self.options);
        let entry = CachedTable {
            table: Arc::new(outcome.table),
            warning: outcome.warning,
        };
        self.entries.insert(key, entry.clone());
        entry
    }

    /// Drop one source so the next access re-fetches it.
    pub fn invalidate(&mut self, source: &Source) -> bool {
        self.entries.remove(&source.id()).is_some()
    }

    /// Drop every cached source.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, source: &Source) -> bool {
        self.entries.contains_key(&source.id())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
