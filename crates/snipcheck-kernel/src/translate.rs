//! Engine diagnostics → validation errors.
//!
//! Only warnings and errors reach the host. Everything below warning
//! severity is dropped. Validators that want richer errors plug in their own
//! [`DiagnosticTranslator`].

use snipcheck_types::{Diagnostic, Severity, ValidationError};

/// Lazy, single-pass conversion of engine output.
pub type ValidationErrors = Box<dyn Iterator<Item = ValidationError>>;

/// Maps engine diagnostics to validation errors.
pub trait DiagnosticTranslator: Send + Sync {
    fn translate(&self, diagnostics: Vec<Diagnostic>) -> ValidationErrors;
}

/// The default policy: severity ≥ warning becomes a [`ValidationError`]
/// carrying the rendered message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeverityTranslator;

impl DiagnosticTranslator for SeverityTranslator {
    fn translate(&self, diagnostics: Vec<Diagnostic>) -> ValidationErrors {
        Box::new(diagnostics.into_iter().filter_map(|d| to_validation_error(&d)))
    }
}

/// Like [`SeverityTranslator`], and also copies each diagnostic's span.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanTranslator;

impl DiagnosticTranslator for SpanTranslator {
    fn translate(&self, diagnostics: Vec<Diagnostic>) -> ValidationErrors {
        Box::new(diagnostics.into_iter().filter_map(|d| {
            let error = to_validation_error(&d)?;
            Some(match d.span {
                Some(span) => error.with_span(span),
                None => error,
            })
        }))
    }
}

fn to_validation_error(diagnostic: &Diagnostic) -> Option<ValidationError> {
    match diagnostic.severity {
        Severity::Error => Some(ValidationError::error(diagnostic.rendered_message())),
        Severity::Warning => Some(ValidationError::warning(diagnostic.rendered_message())),
        Severity::Info | Severity::Hidden => None,
    }
}
