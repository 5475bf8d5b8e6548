//! Module identities and the reference metadata engines compile against.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identity of a unit of compiled code (a library, assembly, package).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModuleId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A type exported by a module, with the names of its direct base types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeExport {
    /// Fully qualified name, e.g. `geo.Square`.
    pub name: String,
    /// Fully qualified names of direct base types and interfaces.
    #[serde(default)]
    pub bases: Vec<String>,
}

impl TypeExport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.bases.push(base.into());
        self
    }
}

/// Everything an engine needs to know about a referenced module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub id: ModuleId,
    /// Namespaces the module contributes to. Imports are checked against these.
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// Types visible to code compiled against this module.
    #[serde(default)]
    pub types: Vec<TypeExport>,
}

impl ModuleMetadata {
    pub fn new(id: impl Into<ModuleId>) -> Self {
        Self {
            id: id.into(),
            namespaces: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces.push(namespace.into());
        self
    }

    pub fn with_type(mut self, export: TypeExport) -> Self {
        self.types.push(export);
        self
    }

    /// Look up an exported type by fully qualified name.
    pub fn find_type(&self, name: &str) -> Option<&TypeExport> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn provides_namespace(&self, namespace: &str) -> bool {
        self.namespaces.iter().any(|n| n == namespace)
    }
}

/// Opaque engine token standing for a module usable as a compile reference.
///
/// Cheap to clone; clones share the same metadata allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceHandle(Arc<ModuleMetadata>);

impl ReferenceHandle {
    pub fn new(metadata: ModuleMetadata) -> Self {
        Self(Arc::new(metadata))
    }

    pub fn module(&self) -> &ModuleId {
        &self.0.id
    }

    pub fn metadata(&self) -> &ModuleMetadata {
        &self.0
    }

    /// True when both handles are the very same allocation, not merely equal.
    pub fn same_handle(&self, other: &ReferenceHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
