//! Compilation units and the discovery → final pipeline.
//!
//! A validation moves one unit through four phases:
//!
//! ```text
//! Empty ──begin(discovery tree)──▶ Discovery
//!       ──finalize(wrapper tree)──▶ Final ──diagnose──▶ Diagnosed
//! ```
//!
//! Each phase is its own type, so a unit cannot be diagnosed before its
//! wrapper tree is installed. The unit holds exactly one tree once it has
//! left `Empty`: the discovery tree is replaced in place, never appended to.

use std::collections::BTreeMap;
use std::fmt;

use snipcheck_types::{Diagnostic, ModuleId, ReferenceHandle};

use crate::engine::LanguageEngine;
use crate::error::EngineError;

/// Where a unit is in the validation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Discovery,
    Final,
    Diagnosed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Empty => "empty",
            Phase::Discovery => "discovery",
            Phase::Final => "final",
            Phase::Diagnosed => "diagnosed",
        };
        f.write_str(s)
    }
}

/// Syntax trees plus the references and imports they compile against.
#[derive(Debug, Clone)]
pub struct CompilationUnit<T> {
    trees: Vec<T>,
    imports: Vec<String>,
    references: BTreeMap<ModuleId, ReferenceHandle>,
}

impl<T> CompilationUnit<T> {
    /// An empty unit with the given namespace imports.
    pub fn new(imports: Vec<String>) -> Self {
        Self {
            trees: Vec::new(),
            imports,
            references: BTreeMap::new(),
        }
    }

    /// A unit pre-seeded with a placeholder tree, as template units are.
    pub fn with_placeholder(imports: Vec<String>, placeholder: T) -> Self {
        let mut unit = Self::new(imports);
        unit.trees.push(placeholder);
        unit
    }

    pub fn trees(&self) -> &[T] {
        &self.trees
    }

    /// The tree being compiled, if any.
    pub fn tree(&self) -> Option<&T> {
        self.trees.first()
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Attached references, ordered by module identity.
    pub fn references(&self) -> impl Iterator<Item = &ReferenceHandle> {
        self.references.values()
    }

    pub fn has_reference(&self, module: &ModuleId) -> bool {
        self.references.contains_key(module)
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Attach handles with set-union semantics. Returns how many were new.
    pub fn add_references<I>(&mut self, handles: I) -> usize
    where
        I: IntoIterator<Item = ReferenceHandle>,
    {
        let mut added = 0;
        for handle in handles {
            if !self.references.contains_key(handle.module()) {
                self.references.insert(handle.module().clone(), handle);
                added += 1;
            }
        }
        added
    }

    /// Install `tree`: append into an empty unit, otherwise replace the first tree.
    fn install_tree(&mut self, tree: T) {
        match self.trees.first_mut() {
            Some(slot) => *slot = tree,
            None => self.trees.push(tree),
        }
    }

    /// Empty → Discovery.
    pub fn begin(mut self, discovery: T) -> DiscoveryUnit<T> {
        self.install_tree(discovery);
        DiscoveryUnit { unit: self }
    }
}

/// A unit holding the loosely parsed snippet.
#[derive(Debug)]
pub struct DiscoveryUnit<T> {
    unit: CompilationUnit<T>,
}

impl<T> DiscoveryUnit<T> {
    pub fn phase(&self) -> Phase {
        Phase::Discovery
    }

    pub fn discovery_tree(&self) -> &T {
        // begin() always installs a tree.
        &self.unit.trees[0]
    }

    pub fn unit(&self) -> &CompilationUnit<T> {
        &self.unit
    }

    /// Discovery → Final: swap the discovery tree for the wrapper tree.
    pub fn finalize(mut self, wrapper: T) -> FinalUnit<T> {
        self.unit.install_tree(wrapper);
        FinalUnit { unit: self.unit }
    }
}

/// A unit holding the synthesized wrapper, ready to compile.
#[derive(Debug)]
pub struct FinalUnit<T> {
    unit: CompilationUnit<T>,
}

impl<T> FinalUnit<T> {
    pub fn phase(&self) -> Phase {
        Phase::Final
    }

    pub fn unit(&self) -> &CompilationUnit<T> {
        &self.unit
    }

    /// Attach references the wrapper needs. Already attached ones are ignored.
    pub fn attach<I>(&mut self, handles: I) -> usize
    where
        I: IntoIterator<Item = ReferenceHandle>,
    {
        self.unit.add_references(handles)
    }

    /// Final → Diagnosed.
    pub fn diagnose<E>(self, engine: &E) -> Result<Compiled<T>, EngineError>
    where
        E: LanguageEngine<Tree = T>,
    {
        let diagnostics = engine.diagnostics(&self.unit)?;
        Ok(Compiled {
            unit: self.unit,
            diagnostics,
        })
    }
}

/// A diagnosed unit and everything the engine reported for it.
#[derive(Debug)]
pub struct Compiled<T> {
    pub unit: CompilationUnit<T>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Compiled<T> {
    pub fn phase(&self) -> Phase {
        Phase::Diagnosed
    }
}
