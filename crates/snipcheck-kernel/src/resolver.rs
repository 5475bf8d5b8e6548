//! Free identifier discovery and resolution.
//!
//! Walks the discovery tree, collects the text of every identifier node,
//! and keeps the names the variable environment knows about. Unknown names
//! are dropped here without complaint; once they are left out of the wrapper's
//! parameter list the engine reports them as unbound.

use std::collections::HashSet;

use snipcheck_types::SemanticType;

use crate::descriptor::ExpressionDescriptor;
use crate::engine::SyntaxTree;

/// A variable referenced by the snippet, with its declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentifier {
    pub name: String,
    pub ty: SemanticType,
}

/// Distinct identifier texts in `tree`, in first-seen order.
pub fn discover_identifiers<T: SyntaxTree>(tree: &T, identifier_kind: T::Kind) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for node in tree.nodes() {
        if node.kind == identifier_kind && seen.insert(node.text) {
            names.push(node.text.to_string());
        }
    }

    names
}

/// Resolve each name through the descriptor, keeping only known variables.
pub fn resolve_identifiers(
    names: &[String],
    descriptor: &ExpressionDescriptor<'_>,
) -> Vec<ResolvedIdentifier> {
    names
        .iter()
        .filter_map(|name| match descriptor.resolve(name) {
            Some(ty) => Some(ResolvedIdentifier {
                name: name.clone(),
                ty,
            }),
            None => {
                tracing::trace!(name = %name, "identifier not in scope; leaving unbound");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SyntaxNode;
    use proptest::prelude::*;
    use snipcheck_types::Span;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        Root,
        Word,
        Other,
    }

    /// Whitespace-separated words; alphabetic ones are identifiers.
    struct Words(String);

    impl SyntaxTree for Words {
        type Kind = Kind;

        fn nodes(&self) -> Box<dyn Iterator<Item = SyntaxNode<'_, Kind>> + '_> {
            let root = SyntaxNode {
                kind: Kind::Root,
                text: self.0.as_str(),
                span: Span::new(0, self.0.len()),
            };
            let words = self.0.split_whitespace().map(|w| SyntaxNode {
                kind: if w.chars().all(char::is_alphabetic) { Kind::Word } else { Kind::Other },
                text: w,
                span: Span::new(0, 0),
            });
            Box::new(std::iter::once(root).chain(words))
        }
    }

    fn descriptor(known: &'static [&'static str]) -> ExpressionDescriptor<'static> {
        ExpressionDescriptor::new(
            "",
            Vec::new(),
            move |name: &str| known.contains(&name).then(SemanticType::integer),
            SemanticType::integer(),
        )
    }

    #[test]
    fn discovers_each_name_once() {
        let tree = Words("x + y * x - 1 + y".into());
        assert_eq!(discover_identifiers(&tree, Kind::Word), vec!["x", "y"]);
    }

    #[test]
    fn root_is_considered_when_it_matches() {
        let tree = Words("total".into());
        // Root has its own kind here, so only the word node counts.
        assert_eq!(discover_identifiers(&tree, Kind::Word), vec!["total"]);
        assert_eq!(discover_identifiers(&tree, Kind::Root), vec!["total"]);
    }

    #[test]
    fn unresolved_names_are_dropped() {
        let names = vec!["x".to_string(), "y".to_string()];
        let resolved = resolve_identifiers(&names, &descriptor(&["x"]));
        assert_eq!(
            resolved,
            vec![ResolvedIdentifier {
                name: "x".into(),
                ty: SemanticType::integer()
            }]
        );
    }

    proptest! {
        #[test]
        fn discovered_names_are_distinct(words in prop::collection::vec("[a-c]{1,2}", 0..30)) {
            let tree = Words(words.join(" "));
            let names = discover_identifiers(&tree, Kind::Word);
            let distinct: HashSet<&String> = names.iter().collect();
            prop_assert_eq!(distinct.len(), names.len());
            let expected: HashSet<&String> = words.iter().collect();
            prop_assert_eq!(distinct, expected);
        }
    }
}
