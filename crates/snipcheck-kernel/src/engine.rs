//! The capability a language engine provides to the kernel.
//!
//! The kernel never parses or type-checks anything itself. One implementation
//! of [`LanguageEngine`] exists per supported expression language and is
//! chosen when the validator is constructed.

use std::fmt;

use snipcheck_types::{Diagnostic, ModuleId, ReferenceHandle, SemanticType, Span};

use crate::descriptor::ExpressionDescriptor;
use crate::error::EngineError;
use crate::unit::CompilationUnit;

/// A node visited while walking a syntax tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxNode<'a, K> {
    pub kind: K,
    pub text: &'a str,
    pub span: Span,
}

/// A parsed tree the kernel can enumerate.
pub trait SyntaxTree {
    /// Syntactic category of a node.
    type Kind: Copy + Eq + fmt::Debug;

    /// Every node in the tree, the root included.
    fn nodes(&self) -> Box<dyn Iterator<Item = SyntaxNode<'_, Self::Kind>> + '_>;
}

/// Per-language compilation capability.
pub trait LanguageEngine {
    type Tree: SyntaxTree;

    /// Short language name, used in logs and errors.
    fn name(&self) -> &str;

    /// The node category that counts as a resolvable identifier.
    fn identifier_kind(&self) -> <Self::Tree as SyntaxTree>::Kind;

    /// Produce the reference handle for a module.
    ///
    /// Errors mean the module cannot be loaded; the kernel skips it.
    fn describe_module(&self, module: &ModuleId) -> Result<ReferenceHandle, EngineError>;

    /// A fresh compilation unit for one validation call.
    ///
    /// Engines that keep a pre-seeded template may return a unit that already
    /// holds a placeholder tree; it is replaced, not appended to.
    fn new_compilation_unit(
        &self,
        descriptor: &ExpressionDescriptor<'_>,
    ) -> CompilationUnit<Self::Tree> {
        CompilationUnit::new(descriptor.local_imports().to_vec())
    }

    /// Loose parse of the raw snippet, just enough to enumerate its tokens.
    fn parse_discovery(&self, raw_text: &str) -> Self::Tree;

    /// Render a semantic type in this language's syntax.
    fn render_type_name(&self, ty: &SemanticType) -> String;

    /// Wrap `body` into a self-contained unit.
    ///
    /// `param_types` has one more element than `param_names`; the last is
    /// the result type.
    fn synthesize_wrapper(&self, param_types: &[String], param_names: &[String], body: &str)
    -> String;

    /// Parse synthesized wrapper source.
    ///
    /// Syntax errors in the embedded snippet belong in the tree (and later in
    /// the diagnostics). `Err` is for source the engine cannot handle at all.
    fn parse_final(&self, source: &str) -> Result<Self::Tree, EngineError>;

    /// Compile the unit and report everything found, in a stable order.
    fn diagnostics(&self, unit: &CompilationUnit<Self::Tree>)
    -> Result<Vec<Diagnostic>, EngineError>;
}
