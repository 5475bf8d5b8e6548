//! The immutable bundle describing one expression to validate.

use std::fmt;

use snipcheck_types::SemanticType;

/// Looks up the declared type of an in-scope variable.
pub type VariableResolver<'a> = Box<dyn Fn(&str) -> Option<SemanticType> + 'a>;

/// Raw snippet text, local imports, a variable resolver, and the expected
/// result type. Built once per `validate` call and owned by it.
pub struct ExpressionDescriptor<'a> {
    raw_text: String,
    local_imports: Vec<String>,
    resolver: VariableResolver<'a>,
    expected: SemanticType,
}

impl<'a> ExpressionDescriptor<'a> {
    pub fn new(
        raw_text: impl Into<String>,
        local_imports: Vec<String>,
        resolver: impl Fn(&str) -> Option<SemanticType> + 'a,
        expected: SemanticType,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            local_imports,
            resolver: Box::new(resolver),
            expected,
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn local_imports(&self) -> &[String] {
        &self.local_imports
    }

    pub fn expected_type(&self) -> &SemanticType {
        &self.expected
    }

    /// Declared type of `name`, or `None` if it is not a known variable.
    pub fn resolve(&self, name: &str) -> Option<SemanticType> {
        (self.resolver)(name)
    }
}

impl fmt::Debug for ExpressionDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionDescriptor")
            .field("raw_text", &self.raw_text)
            .field("local_imports", &self.local_imports)
            .field("expected", &self.expected.name)
            .finish_non_exhaustive()
    }
}
