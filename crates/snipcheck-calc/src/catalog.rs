//! Loadable module definitions for the calc engine.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use snipcheck_kernel::EngineError;
use snipcheck_types::{CORE_MODULE, ModuleId, ModuleMetadata, ReferenceHandle, TypeExport};

/// Modules the engine knows how to describe.
///
/// Every successful [`describe`](Self::describe) counts as a load, which is
/// how callers can observe that a reference cache is doing its job.
#[derive(Debug, Default)]
pub struct ModuleCatalog {
    modules: BTreeMap<ModuleId, ModuleMetadata>,
    loads: AtomicUsize,
}

impl ModuleCatalog {
    /// A catalog holding only the `core` module.
    pub fn new() -> Self {
        Self::empty().with_module(core_module())
    }

    /// A catalog with nothing in it, not even `core`.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, metadata: ModuleMetadata) -> Self {
        self.add(metadata);
        self
    }

    /// Add or replace a module definition.
    pub fn add(&mut self, metadata: ModuleMetadata) {
        self.modules.insert(metadata.id.clone(), metadata);
    }

    pub fn contains(&self, module: &ModuleId) -> bool {
        self.modules.contains_key(module)
    }

    /// Known module ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.modules.keys()
    }

    /// Build a fresh reference handle for `module`.
    pub fn describe(&self, module: &ModuleId) -> Result<ReferenceHandle, EngineError> {
        let metadata = self
            .modules
            .get(module)
            .ok_or_else(|| EngineError::ModuleNotFound(module.clone()))?;
        let loads = self.loads.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(%module, types = metadata.types.len(), loads, "module loaded");
        Ok(ReferenceHandle::new(metadata.clone()))
    }

    /// How many times a module has been described.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

/// The always-available `core` module.
///
/// Primitive types are built into the language; `core` contributes the
/// namespace and the root object type.
pub fn core_module() -> ModuleMetadata {
    ModuleMetadata::new(CORE_MODULE)
        .with_namespace(CORE_MODULE)
        .with_type(TypeExport::new("core.Object"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_counts_loads() {
        let catalog = ModuleCatalog::new();
        let core = ModuleId::new("core");
        let a = catalog.describe(&core).expect("core exists");
        let b = catalog.describe(&core).expect("core exists");
        assert_eq!(catalog.loads(), 2);
        // Each describe is a fresh handle.
        assert_eq!(a, b);
        assert!(!a.same_handle(&b));
    }

    #[test]
    fn unknown_module_is_not_found() {
        let catalog = ModuleCatalog::new();
        let err = catalog
            .describe(&ModuleId::new("geo"))
            .expect_err("geo is not in the catalog");
        assert!(matches!(err, EngineError::ModuleNotFound(id) if id.as_str() == "geo"));
        assert_eq!(catalog.loads(), 0);
    }

    #[test]
    fn add_replaces_definitions() {
        let mut catalog = ModuleCatalog::empty();
        assert!(!catalog.contains(&ModuleId::new("core")));
        catalog.add(ModuleMetadata::new("geo"));
        catalog.add(ModuleMetadata::new("geo").with_namespace("geo"));
        catalog.add(ModuleMetadata::new("core"));

        let ids: Vec<&str> = catalog.ids().map(ModuleId::as_str).collect();
        assert_eq!(ids, vec!["core", "geo"]);
        let geo = catalog.describe(&ModuleId::new("geo")).expect("added");
        assert!(geo.metadata().provides_namespace("geo"));
    }
}
