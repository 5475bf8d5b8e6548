//! snipcheck-types: pure data types shared across snipcheck crates.
//!
//! Nothing in here talks to a compiler. These are the values that flow
//! between the host application, the validation kernel, and a language
//! engine:
//!
//! - **Modules**: [`ModuleId`], [`ModuleMetadata`], [`ReferenceHandle`]
//! - **Types**: [`SemanticType`], the language-neutral type of a variable or result
//! - **Diagnostics**: [`Diagnostic`] from an engine, [`ValidationError`] for the host

mod diagnostic;
mod module;
mod semantic;

pub use diagnostic::{Diagnostic, Severity, Span, ValidationError};
pub use module::{ModuleId, ModuleMetadata, ReferenceHandle, TypeExport};
pub use semantic::{CORE_MODULE, SemanticType};
