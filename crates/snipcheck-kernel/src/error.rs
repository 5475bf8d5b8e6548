//! Error types for the validation kernel.
//!
//! Validation *findings* are never errors: they come back as
//! [`ValidationError`](snipcheck_types::ValidationError) values. The types here
//! cover the engine itself failing, which `validate` cannot recover from.

use snipcheck_types::ModuleId;
use thiserror::Error;

/// Failure inside a language engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("module not found: {0}")]
    ModuleNotFound(ModuleId),

    #[error("malformed wrapper source: {0}")]
    MalformedSource(String),

    #[error("compilation unit has no syntax tree")]
    MissingTree,

    #[error("internal compiler fault: {0}")]
    Internal(String),
}

/// Failure of a `validate` call as a whole.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("{language} engine failed: {source}")]
    Engine {
        language: String,
        #[source]
        source: EngineError,
    },
}

impl ValidateError {
    pub(crate) fn engine(language: &str, source: EngineError) -> Self {
        Self::Engine {
            language: language.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = EngineError::ModuleNotFound(ModuleId::new("geo"));
        assert_eq!(err.to_string(), "module not found: geo");

        let err = ValidateError::engine("calc", EngineError::MissingTree);
        assert_eq!(
            err.to_string(),
            "calc engine failed: compilation unit has no syntax tree"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
