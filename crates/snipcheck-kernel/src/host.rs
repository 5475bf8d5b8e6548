//! Host-side collaborators: where imports and variables come from.
//!
//! The kernel only needs two questions answered by the host application:
//! which namespaces and modules are in effect at a node of its declarative
//! graph ([`HostNode`]), and what type a variable name has ([`HostEnvironment`]).
//! [`ActivityNode`] and [`VariableScope`] are ready-made answers for hosts
//! that model a workflow as a tree of activities with nested variable scopes.

use std::collections::HashMap;
use std::sync::Arc;

use snipcheck_types::{ModuleId, SemanticType};

/// A node of the host's declarative graph.
pub trait HostNode {
    /// Namespace imports and referenced modules in effect at this node.
    fn imports_and_local_modules(&self) -> (Vec<String>, Vec<ModuleId>);
}

/// The in-scope variable environment of one validation.
pub trait HostEnvironment {
    fn resolve_variable(&self, name: &str) -> Option<SemanticType>;
}

/// A host with no imports and no local modules.
impl HostNode for () {
    fn imports_and_local_modules(&self) -> (Vec<String>, Vec<ModuleId>) {
        (Vec::new(), Vec::new())
    }
}

impl<F> HostEnvironment for F
where
    F: Fn(&str) -> Option<SemanticType>,
{
    fn resolve_variable(&self, name: &str) -> Option<SemanticType> {
        self(name)
    }
}

/// One activity in a workflow tree.
///
/// Imports and references declared on an activity apply to it and every
/// activity nested below it.
#[derive(Debug, Clone, Default)]
pub struct ActivityNode {
    pub name: String,
    imports: Vec<String>,
    modules: Vec<ModuleId>,
    parent: Option<Arc<ActivityNode>>,
}

impl ActivityNode {
    /// Create a root activity.
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create an activity nested under `parent`.
    pub fn child(name: impl Into<String>, parent: Arc<ActivityNode>) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent),
            ..Self::default()
        }
    }

    pub fn with_import(mut self, namespace: impl Into<String>) -> Self {
        self.imports.push(namespace.into());
        self
    }

    pub fn with_module(mut self, module: impl Into<ModuleId>) -> Self {
        self.modules.push(module.into());
        self
    }

    pub fn parent(&self) -> Option<&ActivityNode> {
        self.parent.as_deref()
    }

    /// Path of activity names from the root down to this node.
    pub fn path(&self) -> Vec<&str> {
        let mut chain = self.ancestry();
        chain.reverse();
        chain.into_iter().map(|n| n.name.as_str()).collect()
    }

    /// This node followed by its ancestors, innermost first.
    fn ancestry(&self) -> Vec<&ActivityNode> {
        let mut chain = vec![self];
        let mut current = self.parent.as_deref();
        while let Some(node) = current {
            chain.push(node);
            current = node.parent.as_deref();
        }
        chain
    }
}

impl HostNode for ActivityNode {
    fn imports_and_local_modules(&self) -> (Vec<String>, Vec<ModuleId>) {
        let mut imports: Vec<String> = Vec::new();
        let mut modules: Vec<ModuleId> = Vec::new();

        // Root first so outer declarations keep their position.
        for node in self.ancestry().into_iter().rev() {
            for import in &node.imports {
                if !imports.contains(import) {
                    imports.push(import.clone());
                }
            }
            for module in &node.modules {
                if !modules.contains(module) {
                    modules.push(module.clone());
                }
            }
        }

        (imports, modules)
    }
}

/// Declared variable types across nested scopes.
///
/// Lookups search from the innermost frame outwards, so an inner
/// declaration shadows an outer one with the same name.
#[derive(Debug, Clone)]
pub struct VariableScope {
    frames: Vec<HashMap<String, SemanticType>>,
}

impl Default for VariableScope {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableScope {
    /// Create a scope with one (global) frame.
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    /// Push a new frame; declarations after this are local to it.
    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Pop the innermost frame. The global frame is never popped.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Declare a variable in the innermost frame.
    pub fn declare(&mut self, name: impl Into<String>, ty: SemanticType) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), ty);
        }
    }

    pub fn with(mut self, name: impl Into<String>, ty: SemanticType) -> Self {
        self.declare(name, ty);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&SemanticType> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// All visible names, sorted. Shadowed names appear once.
    pub fn visible_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .frames
            .iter()
            .flat_map(|f| f.keys().map(|s| s.as_str()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl HostEnvironment for VariableScope {
    fn resolve_variable(&self, name: &str) -> Option<SemanticType> {
        self.lookup(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_host_has_nothing() {
        let (imports, modules) = ().imports_and_local_modules();
        assert!(imports.is_empty());
        assert!(modules.is_empty());
    }

    #[test]
    fn activity_collects_from_root_down() {
        let root = Arc::new(
            ActivityNode::root("Workflow")
                .with_import("core")
                .with_import("geo")
                .with_module("geo"),
        );
        let seq = Arc::new(ActivityNode::child("Sequence", root).with_import("text"));
        let assign = ActivityNode::child("Assign", seq)
            .with_import("geo")
            .with_module("text")
            .with_module("geo");

        let (imports, modules) = assign.imports_and_local_modules();
        assert_eq!(imports, vec!["core", "geo", "text"]);
        assert_eq!(modules, vec![ModuleId::new("geo"), ModuleId::new("text")]);
        assert_eq!(assign.path(), vec!["Workflow", "Sequence", "Assign"]);
        assert_eq!(assign.parent().map(|p| p.name.as_str()), Some("Sequence"));
    }

    #[test]
    fn scope_shadowing() {
        let mut scope = VariableScope::new().with("x", SemanticType::integer());
        scope.push_frame();
        scope.declare("x", SemanticType::string());
        assert_eq!(scope.resolve_variable("x"), Some(SemanticType::string()));
        assert_eq!(scope.visible_names(), vec!["x"]);

        scope.pop_frame();
        assert_eq!(scope.resolve_variable("x"), Some(SemanticType::integer()));
    }

    #[test]
    fn global_frame_is_never_popped() {
        let mut scope = VariableScope::new();
        scope.declare("g", SemanticType::boolean());
        scope.pop_frame();
        assert_eq!(scope.depth(), 1);
        assert!(scope.lookup("g").is_some());
    }

    #[test]
    fn closures_are_environments() {
        let env = |name: &str| (name == "n").then(SemanticType::float);
        assert_eq!(env.resolve_variable("n"), Some(SemanticType::float()));
        assert_eq!(env.resolve_variable("m"), None);
    }
}
