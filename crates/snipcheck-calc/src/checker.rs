//! Type checker for calc wrappers.
//!
//! Walks a parsed [`Lambda`] against the references attached to its
//! compilation unit and reports everything it finds as [`Diagnostic`]s, in
//! source order. Spans are mapped onto the user's snippet; findings in the
//! wrapper header carry no span.
//!
//! | code | severity | meaning |
//! |------|----------|---------|
//! | E001 | error    | syntax error |
//! | E002 | error    | unknown type |
//! | E100 | error    | undeclared identifier |
//! | E104 | error    | unknown function |
//! | E105 | error    | wrong argument count |
//! | E200 | error    | type mismatch in an operator or argument |
//! | E201 | error    | non-boolean condition |
//! | E202 | error    | mismatched `if` branches |
//! | E300 | error    | result not convertible to the return type |
//! | W300 | warning  | division by literal zero |
//! | W400 | warning  | imported namespace provided by no referenced module |
//! | I001 | info     | constant expression |

use std::collections::{HashMap, HashSet};
use std::fmt;

use snipcheck_types::{Diagnostic, ReferenceHandle, Severity, Span};

use crate::ast::{BinaryOp, Expr, ExprKind, Lambda, Literal, TypeRef, UnaryOp};
use crate::syntax::CalcTree;

/// The type of a calc value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalcType {
    Int,
    Float,
    Bool,
    Str,
    /// Top type; everything converts to it.
    Any,
    /// A type exported by a referenced module.
    Named { name: String, args: Vec<CalcType> },
    /// Stand-in after an error, so one mistake is reported once.
    Unknown,
}

impl CalcType {
    fn is_numeric(&self) -> bool {
        matches!(self, CalcType::Int | CalcType::Float)
    }
}

impl fmt::Display for CalcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcType::Int => f.write_str("Int"),
            CalcType::Float => f.write_str("Float"),
            CalcType::Bool => f.write_str("Bool"),
            CalcType::Str => f.write_str("Str"),
            CalcType::Any => f.write_str("Any"),
            CalcType::Unknown => f.write_str("{unknown}"),
            CalcType::Named { name, args } => {
                f.write_str(name)?;
                if let Some((first, rest)) = args.split_first() {
                    write!(f, "<{first}")?;
                    for arg in rest {
                        write!(f, ", {arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

/// Check a wrapper tree against the unit's references and imports.
pub fn check<'a>(
    tree: &'a CalcTree,
    references: impl IntoIterator<Item = &'a ReferenceHandle>,
    imports: &[String],
) -> Vec<Diagnostic> {
    let mut checker = Checker::new(tree, references);

    for error in tree.syntax_errors() {
        checker.report(Diagnostic::error("E001", &error.message), Some(error.span));
    }

    for namespace in imports {
        if !checker.namespaces.contains(namespace.as_str()) {
            checker.report(
                Diagnostic::warning(
                    "W400",
                    format!("namespace `{namespace}` is not provided by any referenced module"),
                ),
                None,
            );
        }
    }

    if let Some(lambda) = tree.lambda() {
        checker.check_lambda(lambda);
    }

    checker.diagnostics
}

struct Checker<'a> {
    tree: &'a CalcTree,
    /// Exported type name to its direct bases.
    exports: HashMap<&'a str, &'a [String]>,
    namespaces: HashSet<&'a str>,
    scope: HashMap<&'a str, CalcType>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Checker<'a> {
    fn new(tree: &'a CalcTree, references: impl IntoIterator<Item = &'a ReferenceHandle>) -> Self {
        let mut exports = HashMap::new();
        let mut namespaces = HashSet::new();
        for handle in references {
            let metadata = handle.metadata();
            namespaces.extend(metadata.namespaces.iter().map(String::as_str));
            for export in &metadata.types {
                exports.insert(export.name.as_str(), export.bases.as_slice());
            }
        }
        Self {
            tree,
            exports,
            namespaces,
            scope: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    fn report(&mut self, diagnostic: Diagnostic, span: Option<Span>) {
        let diagnostic = match span.and_then(|s| self.tree.snippet_span(s)) {
            Some(span) => diagnostic.with_span(span),
            None => diagnostic,
        };
        self.diagnostics.push(diagnostic);
    }

    fn error(&mut self, code: &str, message: String, span: Span) {
        self.report(Diagnostic::error(code, message), Some(span));
    }

    fn check_lambda(&mut self, lambda: &'a Lambda) {
        for param in &lambda.params {
            let ty = self.resolve_type(&param.ty);
            self.scope.insert(param.name.as_str(), ty);
        }
        let ret = self.resolve_type(&lambda.ret);

        let errors_before = self.error_count();
        let body = self.expr(&lambda.body);

        if !self.assignable(&body, &ret) {
            self.error(
                "E300",
                format!("expression of type `{body}` cannot be converted to `{ret}`"),
                lambda.body.span,
            );
        }

        if !lambda.body.mentions_variable() && self.error_count() == errors_before {
            self.report(
                Diagnostic::info("I001", "expression is constant"),
                Some(lambda.body.span),
            );
        }
    }

    fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    fn resolve_type(&mut self, ty: &TypeRef) -> CalcType {
        let primitive = match ty.path.as_str() {
            "Int" => Some(CalcType::Int),
            "Float" => Some(CalcType::Float),
            "Bool" => Some(CalcType::Bool),
            "Str" => Some(CalcType::Str),
            "Any" => Some(CalcType::Any),
            _ => None,
        };
        if let Some(primitive) = primitive.filter(|_| ty.args.is_empty()) {
            return primitive;
        }

        if !self.exports.contains_key(ty.path.as_str()) {
            self.error(
                "E002",
                format!("unknown type `{}`; no referenced module exports it", ty.path),
                ty.span,
            );
            return CalcType::Unknown;
        }

        let args = ty.args.iter().map(|arg| self.resolve_type(arg)).collect();
        CalcType::Named {
            name: ty.path.clone(),
            args,
        }
    }

    /// Whether a value of type `from` may be used where `to` is expected.
    fn assignable(&self, from: &CalcType, to: &CalcType) -> bool {
        match (from, to) {
            (CalcType::Unknown, _) | (_, CalcType::Unknown) | (_, CalcType::Any) => true,
            (CalcType::Int, CalcType::Float) => true,
            (CalcType::Named { name, .. }, CalcType::Named { name: target, .. }) => {
                from == to || self.derives_from(name, target, &mut HashSet::new())
            }
            _ => from == to,
        }
    }

    fn derives_from<'n>(
        &'n self,
        name: &'n str,
        target: &str,
        seen: &mut HashSet<&'n str>,
    ) -> bool {
        if !seen.insert(name) {
            return false;
        }
        let Some(bases) = self.exports.get(name) else {
            return false;
        };
        bases
            .iter()
            .any(|base| base == target || self.derives_from(base, target, seen))
    }

    fn expr(&mut self, expr: &Expr) -> CalcType {
        match &expr.kind {
            ExprKind::Literal(Literal::Int(_)) => CalcType::Int,
            ExprKind::Literal(Literal::Float(_)) => CalcType::Float,
            ExprKind::Literal(Literal::Str(_)) => CalcType::Str,
            ExprKind::Literal(Literal::Bool(_)) => CalcType::Bool,
            ExprKind::Ident(name) => match self.scope.get(name.as_str()) {
                Some(ty) => ty.clone(),
                None => {
                    self.error("E100", format!("undeclared identifier `{name}`"), expr.span);
                    CalcType::Unknown
                }
            },
            ExprKind::Unary { op, operand } => self.unary(*op, operand, expr.span),
            ExprKind::Binary { op, left, right } => self.binary(*op, left, right, expr.span),
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.conditional(condition, then_branch, else_branch, expr.span),
            ExprKind::Call {
                callee,
                callee_span,
                args,
            } => self.call(callee, *callee_span, args, expr.span),
        }
    }

    fn unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> CalcType {
        let ty = self.expr(operand);
        match (op, &ty) {
            (_, CalcType::Unknown) => CalcType::Unknown,
            (UnaryOp::Neg, CalcType::Int | CalcType::Float) => ty.clone(),
            (UnaryOp::Not, CalcType::Bool) => CalcType::Bool,
            _ => {
                self.error("E200", format!("operator `{op}` cannot be applied to `{ty}`"), span);
                CalcType::Unknown
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, span: Span) -> CalcType {
        let l = self.expr(left);
        let r = self.expr(right);

        if matches!(op, BinaryOp::Div | BinaryOp::Rem) && right.is_zero_literal() {
            self.report(
                Diagnostic::warning("W300", "division by literal zero"),
                Some(right.span),
            );
        }

        let logical = matches!(
            op,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::LtEq
                | BinaryOp::GtEq
                | BinaryOp::And
                | BinaryOp::Or
        );
        if l == CalcType::Unknown || r == CalcType::Unknown {
            return if logical {
                CalcType::Bool
            } else {
                CalcType::Unknown
            };
        }

        let result = match op {
            BinaryOp::Add if l == CalcType::Str && r == CalcType::Str => Some(CalcType::Str),
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                arithmetic(&l, &r)
            }
            BinaryOp::Eq | BinaryOp::NotEq => {
                let comparable = l == r
                    || (l.is_numeric() && r.is_numeric())
                    || l == CalcType::Any
                    || r == CalcType::Any;
                comparable.then_some(CalcType::Bool)
            }
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => {
                let ordered = (l.is_numeric() && r.is_numeric())
                    || (l == CalcType::Str && r == CalcType::Str);
                ordered.then_some(CalcType::Bool)
            }
            BinaryOp::And | BinaryOp::Or => {
                (l == CalcType::Bool && r == CalcType::Bool).then_some(CalcType::Bool)
            }
        };

        result.unwrap_or_else(|| {
            self.error(
                "E200",
                format!("operator `{op}` cannot be applied to `{l}` and `{r}`"),
                span,
            );
            CalcType::Unknown
        })
    }

    fn conditional(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
        span: Span,
    ) -> CalcType {
        let cond = self.expr(condition);
        if !matches!(cond, CalcType::Bool | CalcType::Unknown) {
            self.error(
                "E201",
                format!("condition must be `Bool`, found `{cond}`"),
                condition.span,
            );
        }

        let a = self.expr(then_branch);
        let b = self.expr(else_branch);
        if a == CalcType::Unknown {
            return b;
        }
        if b == CalcType::Unknown || a == b {
            return a;
        }
        if a.is_numeric() && b.is_numeric() {
            return CalcType::Float;
        }
        if self.assignable(&a, &b) {
            return b;
        }
        if self.assignable(&b, &a) {
            return a;
        }
        self.error(
            "E202",
            format!("`if` branches have mismatched types `{a}` and `{b}`"),
            span,
        );
        CalcType::Unknown
    }

    fn call(&mut self, callee: &str, callee_span: Span, args: &[Expr], span: Span) -> CalcType {
        let typed: Vec<(CalcType, Span)> = args.iter().map(|a| (self.expr(a), a.span)).collect();

        let Some(arity) = builtin_arity(callee) else {
            self.error("E104", format!("unknown function `{callee}`"), callee_span);
            return CalcType::Unknown;
        };
        if typed.len() != arity {
            let plural = if arity == 1 { "" } else { "s" };
            self.error(
                "E105",
                format!(
                    "`{callee}` expects {arity} argument{plural}, found {}",
                    typed.len()
                ),
                span,
            );
            return CalcType::Unknown;
        }

        match (callee, typed.as_slice()) {
            ("len", [(ty, arg_span)]) => {
                self.expect_arg(callee, 1, ty, &CalcType::Str, *arg_span);
                CalcType::Int
            }
            ("upper" | "lower", [(ty, arg_span)]) => {
                self.expect_arg(callee, 1, ty, &CalcType::Str, *arg_span);
                CalcType::Str
            }
            ("str", [_]) => CalcType::Str,
            ("abs", [(ty, arg_span)]) => {
                if ty.is_numeric() || *ty == CalcType::Unknown {
                    ty.clone()
                } else {
                    self.numeric_arg(callee, 1, ty, *arg_span);
                    CalcType::Unknown
                }
            }
            ("min" | "max", [(a, a_span), (b, b_span)]) => {
                if *a == CalcType::Unknown || *b == CalcType::Unknown {
                    return CalcType::Unknown;
                }
                match arithmetic(a, b) {
                    Some(ty) => ty,
                    None => {
                        if !a.is_numeric() {
                            self.numeric_arg(callee, 1, a, *a_span);
                        }
                        if !b.is_numeric() {
                            self.numeric_arg(callee, 2, b, *b_span);
                        }
                        CalcType::Unknown
                    }
                }
            }
            _ => CalcType::Unknown,
        }
    }

    fn expect_arg(
        &mut self,
        callee: &str,
        position: usize,
        found: &CalcType,
        expected: &CalcType,
        span: Span,
    ) {
        if !self.assignable(found, expected) {
            self.error(
                "E200",
                format!("argument {position} of `{callee}` must be `{expected}`, found `{found}`"),
                span,
            );
        }
    }

    fn numeric_arg(&mut self, callee: &str, position: usize, found: &CalcType, span: Span) {
        self.error(
            "E200",
            format!("argument {position} of `{callee}` must be numeric, found `{found}`"),
            span,
        );
    }
}

/// Result of an arithmetic operator, if both operands are numeric.
fn arithmetic(l: &CalcType, r: &CalcType) -> Option<CalcType> {
    match (l, r) {
        (CalcType::Int, CalcType::Int) => Some(CalcType::Int),
        _ if l.is_numeric() && r.is_numeric() => Some(CalcType::Float),
        _ => None,
    }
}

fn builtin_arity(name: &str) -> Option<usize> {
    match name {
        "len" | "upper" | "lower" | "str" | "abs" => Some(1),
        "min" | "max" => Some(2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use snipcheck_types::{ModuleMetadata, TypeExport};

    fn geo() -> ReferenceHandle {
        ReferenceHandle::new(
            ModuleMetadata::new("geo")
                .with_namespace("geo")
                .with_type(TypeExport::new("geo.Shape"))
                .with_type(TypeExport::new("geo.Square").with_base("geo.Shape")),
        )
    }

    fn run(header: &str, snippet: &str, refs: &[ReferenceHandle]) -> Vec<Diagnostic> {
        let tree = CalcTree::wrapper(&format!("{header} {{{snippet}}}")).expect("well formed");
        check(&tree, refs, &[])
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.code.as_str()).collect()
    }

    #[rstest]
    #[case::arithmetic("x * 2 + 1", "Int")]
    #[case::widening("x + 0.5", "Float")]
    #[case::concat("s + upper(s)", "Str")]
    #[case::comparison("len(s) >= x && !b", "Bool")]
    #[case::conditional("if b then x else 2.5", "Float")]
    #[case::builtins("max(abs(x), min(1, 2))", "Int")]
    #[case::to_any("str(x)", "Any")]
    #[case::equality("s == \"a\" || x != 3", "Bool")]
    fn well_typed(#[case] snippet: &str, #[case] ret: &str) {
        let header = format!("|x: Int, s: Str, b: Bool| -> {ret}");
        let diagnostics = run(&header, snippet, &[]);
        assert!(
            diagnostics.iter().all(|d| d.severity < Severity::Warning),
            "{snippet}: {diagnostics:?}"
        );
    }

    #[rstest]
    #[case::syntax("x +", "E001")]
    #[case::undeclared("x + y", "E100")]
    #[case::unknown_function("sqrt(x)", "E104")]
    #[case::arity("len(s, s)", "E105")]
    #[case::operator("x + true", "E200")]
    #[case::argument("len(x)", "E200")]
    #[case::negate_string("-s", "E200")]
    #[case::condition("if x then 1 else 2", "E201")]
    #[case::branches("if b then 1 else s", "E202")]
    #[case::result("s", "E300")]
    fn single_error(#[case] snippet: &str, #[case] code: &str) {
        let diagnostics = run("|x: Int, s: Str, b: Bool| -> Int", snippet, &[]);
        let errors: Vec<&Diagnostic> = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1, "{snippet}: {diagnostics:?}");
        assert_eq!(errors[0].code, code);
    }

    #[test]
    fn undeclared_identifier_span_is_snippet_relative() {
        let diagnostics = run("|x: Int| -> Int", "x + y", &[]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].span, Some(Span::new(4, 5)));
        assert_eq!(
            diagnostics[0].rendered_message(),
            "E100: undeclared identifier `y`"
        );
    }

    #[test]
    fn division_by_zero_warns() {
        let diagnostics = run("|| -> Int", "1 / 0", &[]);
        assert_eq!(codes(&diagnostics), vec!["W300", "I001"]);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[0].span, Some(Span::new(4, 5)));
        assert_eq!(diagnostics[1].severity, Severity::Info);
    }

    #[test]
    fn named_types_need_a_reference() {
        let without = run("|s: geo.Square| -> geo.Shape", "s", &[]);
        assert_eq!(codes(&without), vec!["E002", "E002"]);
        // Header findings carry no snippet span.
        assert!(without.iter().all(|d| d.span.is_none()));

        let with = run("|s: geo.Square| -> geo.Shape", "s", &[geo()]);
        assert!(with.is_empty(), "{with:?}");
    }

    #[test]
    fn named_types_do_not_convert_downwards() {
        let diagnostics = run("|s: geo.Shape| -> geo.Square", "s", &[geo()]);
        assert_eq!(codes(&diagnostics), vec!["E300"]);
        assert_eq!(
            diagnostics[0].message,
            "expression of type `geo.Shape` cannot be converted to `geo.Square`"
        );
    }

    #[test]
    fn unresolved_imports_warn() {
        let tree = CalcTree::wrapper("|| -> Int {1}").expect("well formed");
        let imports = vec!["geo".to_string(), "text".to_string()];
        let diagnostics = check(&tree, &[geo()], &imports);
        assert_eq!(codes(&diagnostics), vec!["W400", "I001"]);
        assert!(diagnostics[0].message.contains("`text`"));
    }

    #[test]
    fn errors_suppress_constant_note() {
        let diagnostics = run("|| -> Int", "\"a\"", &[]);
        assert_eq!(codes(&diagnostics), vec!["E300"]);
    }

    #[test]
    fn one_mistake_one_error() {
        // `y` is unknown; nothing downstream of it is reported again.
        let diagnostics = run("|x: Int| -> Str", "upper(y + x) + \"!\"", &[]);
        assert_eq!(codes(&diagnostics), vec!["E100"]);
    }
}
