//! snipcheck-kernel (核): validates expression snippets by compiling them.
//!
//! A host application (a workflow designer, say) holds short expressions
//! like `x + 1` inside its object graph. This crate checks one of them by:
//!
//! - **Resolving** its free identifiers against the host's variables
//! - **Synthesizing** a wrapper that declares them as typed parameters and
//!   fixes the result type
//! - **Compiling** the wrapper with a pluggable [`LanguageEngine`]
//! - **Translating** engine diagnostics into [`ValidationError`]s
//!
//! Module reference metadata is cached process-wide in a [`ReferenceCache`],
//! so repeated validations only pay for modules they have not seen before.
//!
//! # Example
//!
//! ```ignore
//! use snipcheck_kernel::{ExpressionValidator, ValidatorConfig, VariableScope};
//! use snipcheck_types::SemanticType;
//!
//! let validator = ExpressionValidator::new(engine, ValidatorConfig::default());
//! let scope = VariableScope::new().with("x", SemanticType::integer());
//! let errors = validator.validate(&(), &scope, &SemanticType::integer(), "x + 1")?;
//! assert!(errors.is_empty());
//! ```

pub mod cache;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod host;
pub mod resolver;
pub mod synthesizer;
pub mod translate;
pub mod unit;
pub mod validator;

pub use cache::ReferenceCache;
pub use config::ValidatorConfig;
pub use descriptor::ExpressionDescriptor;
pub use engine::{LanguageEngine, SyntaxNode, SyntaxTree};
pub use error::{EngineError, ValidateError};
pub use host::{ActivityNode, HostEnvironment, HostNode, VariableScope};
pub use resolver::ResolvedIdentifier;
pub use translate::{DiagnosticTranslator, SeverityTranslator, SpanTranslator};
pub use unit::{CompilationUnit, Compiled, Phase};
pub use validator::ExpressionValidator;

pub use snipcheck_types::{
    Diagnostic, ModuleId, ModuleMetadata, ReferenceHandle, SemanticType, Severity, Span,
    TypeExport, ValidationError,
};
