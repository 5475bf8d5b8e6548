//! Parser for synthesized calc wrappers.
//!
//! Transforms the lexer's token stream into a [`Lambda`]. Uses chumsky parser
//! combinators generic over the token input.
//!
//! Expression grammar, loosest binding first:
//!
//! ```text
//! expr        = conjunction { "||" conjunction }
//! conjunction = comparison { "&&" comparison }
//! comparison  = sum [ cmp_op sum ]
//! sum         = product { ("+" | "-") product }
//! product     = unary { ("*" | "/" | "%") unary }
//! unary       = { "-" | "!" } atom
//! atom        = literal | call | ident | if_expr | "(" expr ")"
//! ```

use chumsky::{input::ValueInput, prelude::*};
use snipcheck_types::Span;

use crate::ast::{BinaryOp, Expr, ExprKind, Lambda, Literal, Param, TypeRef, UnaryOp};
use crate::lexer::{Spanned, Token};

/// Span type chumsky works with.
type ChumSpan = SimpleSpan;

type Extra<'tokens> = extra::Err<Rich<'tokens, Token, ChumSpan>>;

/// A syntax error with its byte range in the parsed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub span: Span,
    pub message: String,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

/// Parse wrapper source from its tokens.
///
/// Lexer error tokens are reported and dropped before parsing, so one bad
/// character does not also produce a parse error.
pub fn parse_wrapper(source: &str, tokens: &[Spanned]) -> (Option<Lambda>, Vec<SyntaxError>) {
    // Error runs never extend over the wrapper's closing brace.
    let limit = source.strip_suffix('}').map_or(source.len(), str::len);

    let mut errors: Vec<SyntaxError> = tokens
        .iter()
        .filter(|s| s.token == Token::Error)
        .map(|s| lex_error(source, s.span, limit))
        .collect();

    let tokens: Vec<(Token, ChumSpan)> = tokens
        .iter()
        .filter(|s| s.token != Token::Error)
        .map(|s| (s.token.clone(), (s.span.start..s.span.end).into()))
        .collect();

    let end_span: ChumSpan = (source.len()..source.len()).into();

    let (lambda, parse_errors) = lambda_parser()
        .parse(tokens.as_slice().map(end_span, |(t, s)| (t, s)))
        .into_output_errors();

    errors.extend(parse_errors.into_iter().map(|e| SyntaxError {
        span: to_span(*e.span()),
        message: e.to_string(),
    }));

    (lambda, errors)
}

fn lex_error(source: &str, span: Span, limit: usize) -> SyntaxError {
    let span = Span::new(span.start, span.end.min(limit).max(span.start));
    let text = source.get(span.range()).unwrap_or("");

    let message = match text.chars().next() {
        Some('"') if text.len() > 1 && text.ends_with('"') => {
            "invalid escape in string literal".to_string()
        }
        Some('"') => "unterminated string literal".to_string(),
        Some(c) if c.is_ascii_digit() => format!("integer literal `{text}` out of range"),
        _ => format!("unexpected character `{text}`"),
    };

    SyntaxError { span, message }
}

fn to_span(span: ChumSpan) -> Span {
    Span::new(span.start, span.end)
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = Span::new(left.span.start, right.span.end);
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// Parser Combinators - generic over input type
// ═══════════════════════════════════════════════════════════════════════════

/// `|params| -> Type {expr}`, where `||` stands for an empty parameter list.
fn lambda_parser<'tokens, I>() -> impl Parser<'tokens, I, Lambda, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = ChumSpan>,
{
    let param = select! { Token::Ident(name) => name }
        .then_ignore(just(Token::Colon))
        .then(type_parser())
        .map_with(|(name, ty), e| Param {
            name,
            ty,
            span: to_span(e.span()),
        })
        .labelled("parameter");

    let params = choice((
        just(Token::Or).to(Vec::new()),
        param
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::Pipe), just(Token::Pipe)),
    ));

    let body = just(Token::LBrace)
        .map_with(|_, e| {
            let span: ChumSpan = e.span();
            span.end
        })
        .then(expr_parser())
        .then_ignore(just(Token::RBrace));

    params
        .then_ignore(just(Token::Arrow))
        .then(type_parser())
        .then(body)
        .map(|((params, ret), (body_offset, body))| Lambda {
            params,
            ret,
            body,
            body_offset,
        })
        .labelled("wrapper")
}

/// Dotted type path with optional generic arguments: `geo.List<Int>`.
fn type_parser<'tokens, I>() -> impl Parser<'tokens, I, TypeRef, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = ChumSpan>,
{
    recursive(|ty| {
        let path = select! { Token::Ident(segment) => segment }
            .separated_by(just(Token::Dot))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(|segments| segments.join("."));

        let args = ty
            .separated_by(just(Token::Comma))
            .at_least(1)
            .collect::<Vec<_>>()
            .delimited_by(just(Token::Lt), just(Token::Gt));

        path.then(args.or_not()).map_with(|(path, args), e| TypeRef {
            path,
            args: args.unwrap_or_default(),
            span: to_span(e.span()),
        })
    })
    .labelled("type")
}

fn expr_parser<'tokens, I>() -> impl Parser<'tokens, I, Expr, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = ChumSpan>,
{
    recursive(|expr| {
        let literal = select! {
            Token::Int(n) => Literal::Int(n),
            Token::Float(x) => Literal::Float(x),
            Token::Str(s) => Literal::Str(s),
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
        }
        .map_with(|lit, e| Expr::new(ExprKind::Literal(lit), to_span(e.span())))
        .labelled("literal");

        let name = select! { Token::Ident(name) => name }.labelled("identifier");

        let args = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let call = name
            .clone()
            .map_with(|callee, e| (callee, to_span(e.span())))
            .then(args)
            .map_with(|((callee, callee_span), args), e| {
                Expr::new(
                    ExprKind::Call {
                        callee,
                        callee_span,
                        args,
                    },
                    to_span(e.span()),
                )
            })
            .labelled("call");

        let variable = name.map_with(|name, e| Expr::new(ExprKind::Ident(name), to_span(e.span())));

        let conditional = just(Token::If)
            .ignore_then(expr.clone())
            .then_ignore(just(Token::Then))
            .then(expr.clone())
            .then_ignore(just(Token::Else))
            .then(expr.clone())
            .map_with(|((condition, then_branch), else_branch), e| {
                Expr::new(
                    ExprKind::If {
                        condition: Box::new(condition),
                        then_branch: Box::new(then_branch),
                        else_branch: Box::new(else_branch),
                    },
                    to_span(e.span()),
                )
            })
            .labelled("if expression");

        let atom = choice((
            literal,
            call,
            variable,
            conditional,
            expr.clone()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        ))
        .boxed();

        let unary = select! {
            Token::Minus => UnaryOp::Neg,
            Token::Bang => UnaryOp::Not,
        }
        .map_with(|op, e| (op, to_span(e.span())))
        .repeated()
        .foldr(atom, |(op, op_span), operand| {
            let span = Span::new(op_span.start, operand.span.end);
            Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            )
        })
        .boxed();

        let product = unary
            .clone()
            .foldl(
                select! {
                    Token::Star => BinaryOp::Mul,
                    Token::Slash => BinaryOp::Div,
                    Token::Percent => BinaryOp::Rem,
                }
                .then(unary)
                .repeated(),
                |left, (op, right)| binary(op, left, right),
            )
            .boxed();

        let sum = product
            .clone()
            .foldl(
                select! {
                    Token::Plus => BinaryOp::Add,
                    Token::Minus => BinaryOp::Sub,
                }
                .then(product)
                .repeated(),
                |left, (op, right)| binary(op, left, right),
            )
            .boxed();

        let comparison_op = select! {
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::Gt => BinaryOp::Gt,
            Token::LtEq => BinaryOp::LtEq,
            Token::GtEq => BinaryOp::GtEq,
        };

        // Comparisons do not chain.
        let comparison = sum
            .clone()
            .then(comparison_op.then(sum).or_not())
            .map(|(left, rhs)| match rhs {
                Some((op, right)) => binary(op, left, right),
                None => left,
            })
            .boxed();

        let conjunction = comparison
            .clone()
            .foldl(
                just(Token::And).to(BinaryOp::And).then(comparison).repeated(),
                |left, (op, right)| binary(op, left, right),
            )
            .boxed();

        conjunction
            .clone()
            .foldl(
                just(Token::Or).to(BinaryOp::Or).then(conjunction).repeated(),
                |left, (op, right)| binary(op, left, right),
            )
            .labelled("expression")
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::lexer::tokenize;

    fn parse(source: &str) -> (Option<Lambda>, Vec<SyntaxError>) {
        parse_wrapper(source, &tokenize(source))
    }

    fn body(snippet: &str) -> Expr {
        let source = format!("|| -> Int {{{snippet}}}");
        let (lambda, errors) = parse(&source);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        lambda.expect("parsed").body
    }

    /// Render an expression fully parenthesized.
    fn shape(expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Literal(Literal::Int(n)) => n.to_string(),
            ExprKind::Literal(Literal::Float(x)) => x.to_string(),
            ExprKind::Literal(Literal::Str(s)) => format!("{s:?}"),
            ExprKind::Literal(Literal::Bool(b)) => b.to_string(),
            ExprKind::Ident(name) => name.clone(),
            ExprKind::Unary { op, operand } => format!("({op}{})", shape(operand)),
            ExprKind::Binary { op, left, right } => {
                format!("({} {op} {})", shape(left), shape(right))
            }
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(if {} then {} else {})",
                shape(condition),
                shape(then_branch),
                shape(else_branch)
            ),
            ExprKind::Call { callee, args, .. } => {
                let args: Vec<String> = args.iter().map(shape).collect();
                format!("{callee}({})", args.join(", "))
            }
        }
    }

    #[test]
    fn parses_header() {
        let (lambda, errors) = parse("|x: Int, ys: geo.List<Float>| -> Bool {x > 1}");
        assert!(errors.is_empty());
        let lambda = lambda.expect("parsed");
        assert_eq!(lambda.params.len(), 2);
        assert_eq!(lambda.params[0].name, "x");
        assert_eq!(lambda.params[1].ty.to_string(), "geo.List<Float>");
        assert_eq!(lambda.ret.path, "Bool");
        assert_eq!(lambda.body_offset, 39);
        assert_eq!(lambda.body.span, Span::new(39, 44));
    }

    #[test]
    fn empty_parameter_list() {
        let (lambda, errors) = parse("|| -> Int {1}");
        assert!(errors.is_empty());
        let lambda = lambda.expect("parsed");
        assert!(lambda.params.is_empty());
        assert_eq!(lambda.body_offset, 11);
    }

    #[test]
    fn nested_generic_arguments() {
        let (lambda, errors) = parse("|m: c.Map<Str, c.List<Int>>| -> Any {m}");
        assert!(errors.is_empty(), "{errors:?}");
        let ty = &lambda.expect("parsed").params[0].ty;
        assert_eq!(ty.args.len(), 2);
        assert_eq!(ty.to_string(), "c.Map<Str, c.List<Int>>");
    }

    #[test]
    fn precedence() {
        assert_eq!(shape(&body("1 + 2 * 3")), "(1 + (2 * 3))");
        assert_eq!(shape(&body("a - b - c")), "((a - b) - c)");
        assert_eq!(shape(&body("a < b && c || d")), "(((a < b) && c) || d)");
        assert_eq!(shape(&body("-a * !b")), "((-a) * (!b))");
        assert_eq!(shape(&body("(1 + 2) * 3")), "((1 + 2) * 3)");
    }

    #[test]
    fn conditionals_and_calls() {
        assert_eq!(
            shape(&body("if len(s) > 3 then upper(s) else \"x\"")),
            "(if (len(s) > 3) then upper(s) else \"x\")"
        );
        assert_eq!(shape(&body("max(a, 2.5,)")), "max(a, 2.5)");
    }

    #[test]
    fn spans_cover_operands() {
        let expr = body("ab + 1");
        assert_eq!(expr.span, Span::new(11, 17));
        let ExprKind::Binary { left, right, .. } = &expr.kind else {
            panic!("expected binary, got {expr:?}");
        };
        assert_eq!(left.span, Span::new(11, 13));
        assert_eq!(right.span, Span::new(16, 17));
    }

    #[test]
    fn comparisons_do_not_chain() {
        let (lambda, errors) = parse("|| -> Bool {1 < 2 < 3}");
        assert!(lambda.is_none());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn dangling_operator_is_a_syntax_error() {
        let (lambda, errors) = parse("|x: Int| -> Int {x +}");
        assert!(lambda.is_none());
        assert!(!errors.is_empty());
    }

    #[test]
    fn lexer_errors_are_reported_once() {
        let (lambda, errors) = parse("|x: Int| -> Int {x # }");
        // The stray character is dropped, so the rest still parses.
        assert!(lambda.is_some());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unexpected character `#`");
        assert_eq!(errors[0].span, Span::new(19, 20));
    }

    #[rstest]
    #[case::unterminated_string("|| -> Any {\"abc}", "unterminated string literal")]
    #[case::bad_escape("|| -> Any {\"a\\q\"}", "invalid escape in string literal")]
    #[case::int_overflow(
        "|| -> Any {99999999999999999999}",
        "integer literal `99999999999999999999` out of range"
    )]
    fn lexer_error_runs_stop_at_the_body(#[case] source: &str, #[case] message: &str) {
        let (_, errors) = parse(source);
        assert_eq!(errors.first().map(|e| e.message.as_str()), Some(message), "{errors:?}");
        let body_end = source.len() - 1;
        assert!(errors[0].span.end <= body_end, "{:?}", errors[0].span);
        assert_eq!(errors[0].span.start, 11);
    }
}
