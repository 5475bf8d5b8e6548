//! Syntax trees the kernel walks.
//!
//! A [`CalcTree`] is either a discovery tree (a flat token list over the raw
//! snippet) or a wrapper tree (tokens plus the parsed [`Lambda`] and any
//! syntax errors). Both expose the same node list to the kernel.

use snipcheck_kernel::{EngineError, SyntaxNode, SyntaxTree};
use snipcheck_types::Span;

use crate::ast::Lambda;
use crate::lexer::{self, Spanned, Token};
use crate::parser::{self, SyntaxError};

/// Syntactic category of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    /// A name that is not immediately called.
    Identifier,
    /// A name followed by `(`.
    Function,
    Literal,
    Keyword,
    Operator,
    Punct,
    Unknown,
}

impl NodeKind {
    fn classify(token: &Token, next: Option<&Token>) -> Self {
        match token {
            Token::Ident(_) if next == Some(&Token::LParen) => NodeKind::Function,
            Token::Ident(_) => NodeKind::Identifier,
            Token::Int(_) | Token::Float(_) | Token::Str(_) | Token::True | Token::False => {
                NodeKind::Literal
            }
            Token::If | Token::Then | Token::Else => NodeKind::Keyword,
            Token::Error => NodeKind::Unknown,
            t if t.is_operator() => NodeKind::Operator,
            _ => NodeKind::Punct,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CalcTree {
    source: String,
    nodes: Vec<(NodeKind, Span)>,
    lambda: Option<Lambda>,
    syntax_errors: Vec<SyntaxError>,
    /// Where the user's snippet sits inside `source`.
    body: Option<Span>,
}

impl CalcTree {
    /// Flat token tree over a raw snippet. Never fails.
    pub fn discovery(raw_text: &str) -> Self {
        let tokens = lexer::tokenize(raw_text);
        Self {
            source: raw_text.to_string(),
            nodes: classify(&tokens),
            lambda: None,
            syntax_errors: Vec::new(),
            body: None,
        }
    }

    /// Parse synthesized wrapper source.
    ///
    /// Errors only when the source lacks the `{...}` body entirely; syntax
    /// errors inside the body are kept on the tree.
    pub fn wrapper(source: &str) -> Result<Self, EngineError> {
        let tokens = lexer::tokenize(source);
        let open = tokens
            .iter()
            .find(|t| t.token == Token::LBrace)
            .map(|t| t.span.end)
            .ok_or_else(|| EngineError::MalformedSource(source.to_string()))?;
        let close = source
            .strip_suffix('}')
            .map(str::len)
            .filter(|close| *close >= open)
            .ok_or_else(|| EngineError::MalformedSource(source.to_string()))?;

        let (lambda, syntax_errors) = parser::parse_wrapper(source, &tokens);
        Ok(Self {
            source: source.to_string(),
            nodes: classify(&tokens),
            lambda,
            syntax_errors,
            body: Some(Span::new(open, close)),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn lambda(&self) -> Option<&Lambda> {
        self.lambda.as_ref()
    }

    pub fn syntax_errors(&self) -> &[SyntaxError] {
        &self.syntax_errors
    }

    /// The snippet's range within the wrapper source.
    pub fn body(&self) -> Option<Span> {
        self.body
    }

    /// Map a span in this tree's source onto the user's snippet.
    ///
    /// `None` for spans outside the snippet, such as the wrapper header.
    pub fn snippet_span(&self, span: Span) -> Option<Span> {
        let Some(body) = self.body else {
            return Some(span);
        };
        if span.start < body.start || span.start > body.end {
            return None;
        }
        let end = span.end.clamp(span.start, body.end);
        Some(Span::new(span.start - body.start, end - body.start))
    }
}

fn classify(tokens: &[Spanned]) -> Vec<(NodeKind, Span)> {
    tokens
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let next = tokens.get(i + 1).map(|n| &n.token);
            (NodeKind::classify(&t.token, next), t.span)
        })
        .collect()
}

impl SyntaxTree for CalcTree {
    type Kind = NodeKind;

    fn nodes(&self) -> Box<dyn Iterator<Item = SyntaxNode<'_, NodeKind>> + '_> {
        let root = SyntaxNode {
            kind: NodeKind::Root,
            text: self.source.as_str(),
            span: Span::new(0, self.source.len()),
        };
        let tokens = self.nodes.iter().map(|(kind, span)| SyntaxNode {
            kind: *kind,
            text: self.source.get(span.range()).unwrap_or_default(),
            span: *span,
        });
        Box::new(std::iter::once(root).chain(tokens))
    }
}
