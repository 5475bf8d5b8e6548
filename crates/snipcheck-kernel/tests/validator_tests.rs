//! Integration tests for the validation pipeline.
//!
//! Uses a deliberately tiny engine where the "language" is whitespace
//! separated words, so these tests exercise orchestration rather than any
//! real grammar.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rstest::rstest;
use snipcheck_kernel::{
    ActivityNode, CompilationUnit, Diagnostic, DiagnosticTranslator, EngineError,
    ExpressionDescriptor, ExpressionValidator, LanguageEngine, ModuleId, ModuleMetadata,
    ReferenceCache, ReferenceHandle, SemanticType, Span, SyntaxNode, SyntaxTree, ValidateError,
    ValidationError, ValidatorConfig, VariableScope,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordKind {
    Root,
    Ident,
    Other,
}

#[derive(Debug, Clone)]
struct WordTree {
    text: String,
    params: Vec<(String, String)>,
    result: Option<String>,
    body: String,
}

impl SyntaxTree for WordTree {
    type Kind = WordKind;

    fn nodes(&self) -> Box<dyn Iterator<Item = SyntaxNode<'_, WordKind>> + '_> {
        let root = SyntaxNode {
            kind: WordKind::Root,
            text: self.text.as_str(),
            span: Span::new(0, self.text.len()),
        };
        let words = self.body.split_whitespace().map(|w| SyntaxNode {
            kind: if w.chars().all(char::is_alphabetic) {
                WordKind::Ident
            } else {
                WordKind::Other
            },
            text: w,
            span: Span::new(0, 0),
        });
        Box::new(std::iter::once(root).chain(words))
    }
}

#[derive(Default)]
struct WordEngine {
    describes: AtomicUsize,
    template_placeholder: bool,
}

impl LanguageEngine for WordEngine {
    type Tree = WordTree;

    fn name(&self) -> &str {
        "words"
    }

    fn identifier_kind(&self) -> WordKind {
        WordKind::Ident
    }

    fn describe_module(&self, module: &ModuleId) -> Result<ReferenceHandle, EngineError> {
        match module.as_str() {
            "core" | "geo" | "text" => {
                self.describes.fetch_add(1, Ordering::SeqCst);
                Ok(ReferenceHandle::new(ModuleMetadata::new(module.clone())))
            }
            _ => Err(EngineError::ModuleNotFound(module.clone())),
        }
    }

    fn new_compilation_unit(
        &self,
        descriptor: &ExpressionDescriptor<'_>,
    ) -> CompilationUnit<WordTree> {
        let imports = descriptor.local_imports().to_vec();
        if self.template_placeholder {
            CompilationUnit::with_placeholder(imports, self.parse_discovery("placeholder"))
        } else {
            CompilationUnit::new(imports)
        }
    }

    fn parse_discovery(&self, raw_text: &str) -> WordTree {
        WordTree {
            text: raw_text.to_string(),
            params: Vec::new(),
            result: None,
            body: raw_text.to_string(),
        }
    }

    fn render_type_name(&self, ty: &SemanticType) -> String {
        ty.name.clone()
    }

    fn synthesize_wrapper(
        &self,
        param_types: &[String],
        param_names: &[String],
        body: &str,
    ) -> String {
        let params: Vec<String> = param_names
            .iter()
            .zip(param_types)
            .map(|(n, t)| format!("{n}: {t}"))
            .collect();
        let result = param_types.last().map(String::as_str).unwrap_or("?");
        format!("fn({}) -> {} = {}", params.join(", "), result, body)
    }

    fn parse_final(&self, source: &str) -> Result<WordTree, EngineError> {
        if source.contains("FAULT") {
            return Err(EngineError::Internal("parser crashed".into()));
        }
        let (header, body) = source
            .split_once(" = ")
            .ok_or_else(|| EngineError::MalformedSource(source.to_string()))?;
        let (params, result) = header
            .strip_prefix("fn(")
            .and_then(|h| h.split_once(") -> "))
            .ok_or_else(|| EngineError::MalformedSource(source.to_string()))?;
        let params = params
            .split(", ")
            .filter(|p| !p.is_empty())
            .filter_map(|p| p.split_once(": "))
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect();
        Ok(WordTree {
            text: source.to_string(),
            params,
            result: Some(result.to_string()),
            body: body.to_string(),
        })
    }

    fn diagnostics(
        &self,
        unit: &CompilationUnit<WordTree>,
    ) -> Result<Vec<Diagnostic>, EngineError> {
        let tree = unit.tree().ok_or(EngineError::MissingTree)?;
        let mut out = vec![Diagnostic::info("I001", "words compiled")];

        let result_module = tree.result.as_deref().and_then(|r| r.split_once('.'));
        if let Some((module, _)) = result_module {
            if !unit.has_reference(&ModuleId::new(module)) {
                out.push(Diagnostic::error("E002", format!("unknown module `{module}`")));
            }
        }
        let mut reported = Vec::new();
        for word in tree.body.split_whitespace() {
            let declared = tree.params.iter().any(|(n, _)| n == word);
            if word.chars().all(char::is_alphabetic) && !declared && !reported.contains(&word) {
                reported.push(word);
                out.push(Diagnostic::error("E100", format!("undeclared identifier `{word}`")));
            }
        }
        if tree.body.contains("/ 0") {
            out.push(Diagnostic::warning("W300", "division by literal zero"));
        }
        Ok(out)
    }
}

fn validator(engine: WordEngine) -> ExpressionValidator<WordEngine> {
    ExpressionValidator::with_cache(
        engine,
        ValidatorConfig::default(),
        Arc::new(ReferenceCache::new()),
    )
}

fn ints(names: &[&str]) -> VariableScope {
    names
        .iter()
        .fold(VariableScope::new(), |scope, n| scope.with(*n, SemanticType::integer()))
}

#[rstest]
#[case::resolved("x + 1", vec![])]
#[case::info_is_dropped("1", vec![])]
#[case::unresolved("x + y", vec![ValidationError::error("E100: undeclared identifier `y`")])]
#[case::warning("1 / 0", vec![ValidationError::warning("W300: division by literal zero")])]
#[case::error_and_warning(
    "y / 0",
    vec![
        ValidationError::error("E100: undeclared identifier `y`"),
        ValidationError::warning("W300: division by literal zero"),
    ]
)]
fn diagnostics_translate_by_severity(
    #[case] snippet: &str,
    #[case] expected: Vec<ValidationError>,
) {
    let v = validator(WordEngine::default());
    let errors = v
        .validate(&(), &ints(&["x"]), &SemanticType::integer(), snippet)
        .expect("engine ok");
    assert_eq!(errors, expected);
}

#[test]
fn unresolved_identifier_surfaces_through_engine() {
    let v = validator(WordEngine::default());
    let compiled = v
        .compile(&(), &ints(&["x"]), &SemanticType::integer(), "x + y")
        .expect("engine ok");

    let tree = compiled.unit.tree().expect("final tree");
    assert_eq!(tree.params, vec![("x".to_string(), "core.Integer".to_string())]);
    let codes: Vec<&str> = compiled.diagnostics.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["I001", "E100"]);
}

#[test]
fn repeated_identifiers_become_one_parameter() {
    let v = validator(WordEngine::default());
    let compiled = v
        .compile(&(), &ints(&["x"]), &SemanticType::integer(), "x * x + x")
        .expect("engine ok");
    let tree = compiled.unit.tree().expect("final tree");
    assert_eq!(tree.params.len(), 1);
    insta::assert_snapshot!(tree.text, @"fn(x: core.Integer) -> core.Integer = x * x + x");
}

#[test]
fn expected_type_module_is_cached_and_attached() {
    let v = validator(WordEngine::default());
    let point = SemanticType::named("geo.Point", "geo");
    assert!(!v.cache().contains(&ModuleId::new("geo")));

    let compiled = v
        .compile(&(), &VariableScope::new(), &point, "origin")
        .expect("engine ok");

    assert!(v.cache().contains(&ModuleId::new("geo")));
    assert!(compiled.unit.has_reference(&ModuleId::new("geo")));
    // `origin` is unbound, but the result type resolved.
    let codes: Vec<&str> = compiled.diagnostics.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["I001", "E100"]);
}

#[test]
fn base_type_modules_are_attached() {
    let v = validator(WordEngine::default());
    let square = SemanticType::named("geo.Square", "geo")
        .with_base(SemanticType::named("text.Printable", "text"));

    let compiled = v
        .compile(&(), &VariableScope::new(), &square, "1")
        .expect("engine ok");
    assert!(compiled.unit.has_reference(&ModuleId::new("text")));
}

#[test]
fn unloadable_local_module_is_skipped() {
    let v = validator(WordEngine::default());
    let node = ActivityNode::root("Workflow").with_module("ghost").with_import("geo");

    let compiled = v
        .compile(&node, &ints(&["x"]), &SemanticType::integer(), "x")
        .expect("engine ok");

    assert!(!v.cache().contains(&ModuleId::new("ghost")));
    assert!(!compiled.unit.has_reference(&ModuleId::new("ghost")));
    assert_eq!(compiled.unit.imports(), ["geo".to_string()]);
    let errors = v
        .validate(&node, &ints(&["x"]), &SemanticType::integer(), "x")
        .expect("engine ok");
    assert!(errors.is_empty());
}

#[test]
fn modules_are_described_once_across_calls() {
    let engine = WordEngine::default();
    let cache = Arc::new(ReferenceCache::new());
    let v =
        ExpressionValidator::with_cache(engine, ValidatorConfig::default(), Arc::clone(&cache));
    assert_eq!(v.template_references().len(), 1);

    let point = SemanticType::named("geo.Point", "geo");
    for _ in 0..3 {
        v.validate(&(), &VariableScope::new(), &point, "1").expect("engine ok");
    }
    // core at construction, geo on first validate.
    assert_eq!(v.engine().describes.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn cache_is_shared_between_validators() {
    let cache = Arc::new(ReferenceCache::new());
    let first = ExpressionValidator::with_cache(
        WordEngine::default(),
        ValidatorConfig::default().with_module("geo"),
        Arc::clone(&cache),
    );
    let second = ExpressionValidator::with_cache(
        WordEngine::default(),
        ValidatorConfig::default(),
        Arc::clone(&cache),
    );

    assert_eq!(first.engine().describes.load(Ordering::SeqCst), 2);
    assert_eq!(second.engine().describes.load(Ordering::SeqCst), 0);
}

#[rstest]
fn unit_holds_only_the_wrapper_tree(#[values(false, true)] template_placeholder: bool) {
    let v = validator(WordEngine {
        template_placeholder,
        ..WordEngine::default()
    });
    let compiled = v
        .compile(&(), &ints(&["x"]), &SemanticType::integer(), "x")
        .expect("engine ok");
    assert_eq!(compiled.unit.trees().len(), 1);
    assert!(compiled.unit.trees()[0].text.starts_with("fn("));
}

#[test]
fn validation_is_idempotent() {
    let v = validator(WordEngine::default());
    let scope = ints(&["x"]);
    let run = || {
        v.validate(&(), &scope, &SemanticType::integer(), "x + y + z / 0")
            .expect("engine ok")
    };
    let first = run();
    assert_eq!(first.len(), 3);
    assert_eq!(first, run());
}

#[test]
fn engine_fault_is_fatal() {
    let v = validator(WordEngine::default());
    let result = v.validate(&(), &VariableScope::new(), &SemanticType::integer(), "FAULT");
    match result {
        Err(ValidateError::Engine { language, source }) => {
            assert_eq!(language, "words");
            assert!(matches!(source, EngineError::Internal(_)));
        }
        other => panic!("expected engine failure, got {other:?}"),
    }
}

#[test]
fn closure_environment_and_span_config() {
    let v = ExpressionValidator::with_cache(
        WordEngine::default(),
        ValidatorConfig::default().with_spans(true),
        Arc::new(ReferenceCache::new()),
    );
    let env = |name: &str| (name == "n").then(SemanticType::integer);
    let errors = v.validate(&(), &env, &SemanticType::integer(), "n + m").expect("engine ok");
    assert_eq!(errors.len(), 1);
    // The word engine reports no spans, so none are attached.
    assert_eq!(errors[0].span, None);
}

struct Shouting;

impl DiagnosticTranslator for Shouting {
    fn translate(&self, diagnostics: Vec<Diagnostic>) -> Box<dyn Iterator<Item = ValidationError>> {
        Box::new(
            diagnostics
                .into_iter()
                .map(|d| ValidationError::error(d.message.to_uppercase())),
        )
    }
}

#[test]
fn custom_translator_replaces_policy() {
    let v = validator(WordEngine::default()).with_translator(Shouting);
    let errors = v
        .validate(&(), &VariableScope::new(), &SemanticType::integer(), "1")
        .expect("engine ok");
    // The custom policy keeps info diagnostics too.
    assert_eq!(errors, vec![ValidationError::error("WORDS COMPILED")]);
}
