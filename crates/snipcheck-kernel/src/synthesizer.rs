//! Wrapper code synthesis.
//!
//! Turns resolved identifiers and the expected result type into the
//! parameter/return signature the engine needs, then lets the engine
//! render the actual wrapper text.

use snipcheck_types::SemanticType;

use crate::engine::LanguageEngine;
use crate::resolver::ResolvedIdentifier;

/// Parameter names and rendered type names for a wrapper.
///
/// `types` holds one entry per parameter followed by the result type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperSignature {
    pub names: Vec<String>,
    pub types: Vec<String>,
}

impl WrapperSignature {
    /// Build a signature, rendering every type with `render`.
    pub fn build(
        params: &[ResolvedIdentifier],
        result: &SemanticType,
        render: impl Fn(&SemanticType) -> String,
    ) -> Self {
        let names = params.iter().map(|p| p.name.clone()).collect();
        let mut types: Vec<String> = params.iter().map(|p| render(&p.ty)).collect();
        types.push(render(result));
        Self { names, types }
    }

    pub fn result_type(&self) -> Option<&str> {
        self.types.last().map(String::as_str)
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .zip(&self.types)
            .map(|(n, t)| (n.as_str(), t.as_str()))
    }
}

/// Produce the wrapper source embedding `body` for `engine`.
pub fn synthesize<E: LanguageEngine>(
    engine: &E,
    params: &[ResolvedIdentifier],
    result: &SemanticType,
    body: &str,
) -> String {
    let signature = WrapperSignature::build(params, result, |ty| engine.render_type_name(ty));
    engine.synthesize_wrapper(&signature.types, &signature.names, body)
}
