//! Process-wide cache of module reference handles.
//!
//! Describing a module is the expensive part of preparing a compilation, so
//! handles are computed once per module identity and shared by every
//! validator and every language for the life of the process. The map is
//! append-only: entries are never replaced or evicted.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use snipcheck_types::{ModuleId, ReferenceHandle};

use crate::error::EngineError;

static GLOBAL: LazyLock<Arc<ReferenceCache>> = LazyLock::new(|| Arc::new(ReferenceCache::new()));

/// Append-only map from module identity to reference handle.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    entries: RwLock<HashMap<ModuleId, ReferenceHandle>>,
}

impl ReferenceCache {
    /// Create an empty cache, independent of the global one.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by the whole process.
    pub fn global() -> Arc<ReferenceCache> {
        Arc::clone(&GLOBAL)
    }

    /// Return the cached handle for `module`, describing it on first use.
    ///
    /// Returns `None` if `describe` fails; nothing is cached in that case.
    /// `describe` runs without holding the lock, so two threads may both
    /// describe the same module. The first insert wins and both get its handle.
    pub fn ensure<F>(&self, module: &ModuleId, describe: F) -> Option<ReferenceHandle>
    where
        F: FnOnce(&ModuleId) -> Result<ReferenceHandle, EngineError>,
    {
        if let Some(handle) = self.get(module) {
            return Some(handle);
        }

        match describe(module) {
            Ok(handle) => {
                let stored = self.insert_if_absent(module.clone(), handle);
                tracing::debug!(module = %module, "cached module reference");
                Some(stored)
            }
            Err(e) => {
                tracing::debug!(
                    module = %module,
                    error = %e,
                    "skipping module that failed to load"
                );
                None
            }
        }
    }

    /// Insert `handle` unless `module` is already cached. Returns the stored handle.
    pub fn insert_if_absent(&self, module: ModuleId, handle: ReferenceHandle) -> ReferenceHandle {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.entry(module).or_insert(handle).clone()
    }

    pub fn get(&self, module: &ModuleId) -> Option<ReferenceHandle> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(module).cloned()
    }

    pub fn contains(&self, module: &ModuleId) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(module)
    }

    /// Every cached handle, ordered by module identity.
    pub fn handles(&self) -> Vec<ReferenceHandle> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut handles: Vec<_> = entries.values().cloned().collect();
        handles.sort_by(|a, b| a.module().cmp(b.module()));
        handles
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
