//! The calc implementation of [`LanguageEngine`].

use snipcheck_kernel::{CompilationUnit, EngineError, LanguageEngine};
use snipcheck_types::{Diagnostic, ModuleId, ReferenceHandle, SemanticType};

use crate::catalog::ModuleCatalog;
use crate::checker;
use crate::syntax::{CalcTree, NodeKind};

/// Language engine for calc expressions.
#[derive(Debug, Default)]
pub struct CalcEngine {
    catalog: ModuleCatalog,
}

impl CalcEngine {
    /// An engine whose catalog holds only `core`.
    pub fn new() -> Self {
        Self::with_catalog(ModuleCatalog::new())
    }

    pub fn with_catalog(catalog: ModuleCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }
}

/// Render a semantic type in calc syntax.
///
/// Well-known core types map to calc primitives; everything else keeps its
/// qualified name.
pub fn render_type(ty: &SemanticType) -> String {
    let name = match ty.name.as_str() {
        "core.Integer" => "Int",
        "core.Float" => "Float",
        "core.Boolean" => "Bool",
        "core.String" => "Str",
        "core.Object" => "Any",
        other => other,
    };
    if ty.args.is_empty() {
        return name.to_string();
    }
    let args: Vec<String> = ty.args.iter().map(render_type).collect();
    format!("{name}<{}>", args.join(", "))
}

impl LanguageEngine for CalcEngine {
    type Tree = CalcTree;

    fn name(&self) -> &str {
        "calc"
    }

    fn identifier_kind(&self) -> NodeKind {
        NodeKind::Identifier
    }

    fn describe_module(&self, module: &ModuleId) -> Result<ReferenceHandle, EngineError> {
        self.catalog.describe(module)
    }

    fn parse_discovery(&self, raw_text: &str) -> CalcTree {
        CalcTree::discovery(raw_text)
    }

    fn render_type_name(&self, ty: &SemanticType) -> String {
        render_type(ty)
    }

    fn synthesize_wrapper(
        &self,
        param_types: &[String],
        param_names: &[String],
        body: &str,
    ) -> String {
        let (result, types) = match param_types.split_last() {
            Some((result, types)) => (result.as_str(), types),
            None => ("Any", param_types),
        };
        let params: Vec<String> = param_names
            .iter()
            .zip(types)
            .map(|(name, ty)| format!("{name}: {ty}"))
            .collect();
        // The body goes in verbatim right after `{` so spans map by offset.
        format!("|{}| -> {result} {{{body}}}", params.join(", "))
    }

    fn parse_final(&self, source: &str) -> Result<CalcTree, EngineError> {
        CalcTree::wrapper(source)
    }

    fn diagnostics(
        &self,
        unit: &CompilationUnit<CalcTree>,
    ) -> Result<Vec<Diagnostic>, EngineError> {
        let tree = unit.tree().ok_or(EngineError::MissingTree)?;
        if tree.body().is_none() {
            return Err(EngineError::Internal(
                "compilation unit holds a discovery tree, not a wrapper".into(),
            ));
        }
        Ok(checker::check(tree, unit.references(), unit.imports()))
    }
}
