//! Expression validation orchestration.
//!
//! One [`ExpressionValidator`] per expression language. Each `validate` call:
//!
//! 1. asks the host node for local imports and module references
//! 2. ensures every module defining the expected result type (and its bases
//!    and generic arguments) is in the reference cache
//! 3. parses the raw snippet loosely and resolves its free identifiers
//! 4. synthesizes a wrapper declaring those identifiers as parameters
//! 5. swaps the wrapper in for the discovery tree, attaches references
//! 6. collects engine diagnostics and translates them
//!
//! Findings come back as data. Only a failing engine produces `Err`.

use std::sync::Arc;

use snipcheck_types::{ModuleId, ReferenceHandle, SemanticType, ValidationError};

use crate::cache::ReferenceCache;
use crate::config::ValidatorConfig;
use crate::descriptor::ExpressionDescriptor;
use crate::engine::LanguageEngine;
use crate::error::ValidateError;
use crate::host::{HostEnvironment, HostNode};
use crate::resolver::{discover_identifiers, resolve_identifiers};
use crate::synthesizer::synthesize;
use crate::translate::{DiagnosticTranslator, SeverityTranslator, SpanTranslator};
use crate::unit::Compiled;

/// Validates expression snippets for one language engine.
pub struct ExpressionValidator<E: LanguageEngine> {
    engine: E,
    cache: Arc<ReferenceCache>,
    /// References every new compilation unit starts with.
    template: Vec<ReferenceHandle>,
    translator: Box<dyn DiagnosticTranslator>,
}

impl<E: LanguageEngine> ExpressionValidator<E> {
    /// Create a validator backed by the process-wide reference cache.
    pub fn new(engine: E, config: ValidatorConfig) -> Self {
        Self::with_cache(engine, config, ReferenceCache::global())
    }

    /// Create a validator backed by the given cache.
    ///
    /// The configured seed modules are ensured right away; modules that fail
    /// to load are left out.
    pub fn with_cache(engine: E, config: ValidatorConfig, cache: Arc<ReferenceCache>) -> Self {
        let template = ensure_modules(&engine, &cache, &config.seed_modules());
        let translator: Box<dyn DiagnosticTranslator> = if config.attach_spans {
            Box::new(SpanTranslator)
        } else {
            Box::new(SeverityTranslator)
        };

        tracing::debug!(
            language = engine.name(),
            seeded = template.len(),
            cached = cache.len(),
            "validator ready"
        );

        Self {
            engine,
            cache,
            template,
            translator,
        }
    }

    /// Replace the diagnostics translator.
    pub fn with_translator(mut self, translator: impl DiagnosticTranslator + 'static) -> Self {
        self.translator = Box::new(translator);
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn cache(&self) -> &Arc<ReferenceCache> {
        &self.cache
    }

    pub fn template_references(&self) -> &[ReferenceHandle] {
        &self.template
    }

    /// Validate `raw_text` as an expression producing `expected`.
    pub fn validate<N, V>(
        &self,
        node: &N,
        env: &V,
        expected: &SemanticType,
        raw_text: &str,
    ) -> Result<Vec<ValidationError>, ValidateError>
    where
        N: HostNode + ?Sized,
        V: HostEnvironment + ?Sized,
    {
        let compiled = self.compile(node, env, expected, raw_text)?;
        let errors: Vec<ValidationError> =
            self.translator.translate(compiled.diagnostics).collect();
        tracing::debug!(errors = errors.len(), "validation finished");
        Ok(errors)
    }

    /// Run the pipeline up to the diagnosed unit, without translating.
    pub fn compile<N, V>(
        &self,
        node: &N,
        env: &V,
        expected: &SemanticType,
        raw_text: &str,
    ) -> Result<Compiled<E::Tree>, ValidateError>
    where
        N: HostNode + ?Sized,
        V: HostEnvironment + ?Sized,
    {
        let _span = tracing::debug_span!("validate", language = self.engine.name()).entered();

        let (imports, local_modules) = node.imports_and_local_modules();

        // The wrapper's return type must resolve even if the body never names it.
        let mut required = ensure_modules(&self.engine, &self.cache, &expected.defining_modules());
        required.extend(ensure_modules(&self.engine, &self.cache, &local_modules));

        let descriptor = ExpressionDescriptor::new(
            raw_text,
            imports,
            |name: &str| env.resolve_variable(name),
            expected.clone(),
        );

        let mut unit = self.engine.new_compilation_unit(&descriptor);
        unit.add_references(self.template.iter().cloned());

        let discovery = unit.begin(self.engine.parse_discovery(descriptor.raw_text()));
        let names = discover_identifiers(discovery.discovery_tree(), self.engine.identifier_kind());
        let resolved = resolve_identifiers(&names, &descriptor);
        tracing::debug!(
            discovered = names.len(),
            resolved = resolved.len(),
            "identifiers resolved"
        );

        let source = synthesize(
            &self.engine,
            &resolved,
            descriptor.expected_type(),
            descriptor.raw_text(),
        );
        tracing::trace!(%source, "synthesized wrapper");

        let wrapper = self
            .engine
            .parse_final(&source)
            .map_err(|e| ValidateError::engine(self.engine.name(), e))?;
        let mut final_unit = discovery.finalize(wrapper);

        let attached = final_unit.attach(required);
        if attached > 0 {
            tracing::debug!(attached, "attached references beyond the template");
        }

        let compiled = final_unit
            .diagnose(&self.engine)
            .map_err(|e| ValidateError::engine(self.engine.name(), e))?;
        tracing::debug!(diagnostics = compiled.diagnostics.len(), "engine diagnostics");
        Ok(compiled)
    }
}

/// Ensure each module in the cache, returning the handles that loaded.
fn ensure_modules<E: LanguageEngine>(
    engine: &E,
    cache: &ReferenceCache,
    modules: &[ModuleId],
) -> Vec<ReferenceHandle> {
    modules
        .iter()
        .filter_map(|module| cache.ensure(module, |m| engine.describe_module(m)))
        .collect()
}
