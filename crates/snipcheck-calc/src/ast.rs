//! Abstract syntax tree for calc.
//!
//! All spans are byte ranges into the source that was parsed, which for a
//! wrapper is the synthesized source, not the user's snippet.

use std::fmt;

use snipcheck_types::Span;

/// A synthesized wrapper: `|a: Int, b: Str| -> Bool {body}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<Param>,
    pub ret: TypeRef,
    pub body: Expr,
    /// Byte offset just past the opening `{`.
    pub body_offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    pub span: Span,
}

/// A type as written: a dotted path with optional generic arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub path: String,
    pub args: Vec<TypeRef>,
    pub span: Span,
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "<{first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Whether any variable is referenced anywhere in this expression.
    pub fn mentions_variable(&self) -> bool {
        match &self.kind {
            ExprKind::Ident(_) => true,
            ExprKind::Literal(_) => false,
            ExprKind::Unary { operand, .. } => operand.mentions_variable(),
            ExprKind::Binary { left, right, .. } => {
                left.mentions_variable() || right.mentions_variable()
            }
            ExprKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.mentions_variable()
                    || then_branch.mentions_variable()
                    || else_branch.mentions_variable()
            }
            ExprKind::Call { args, .. } => args.iter().any(Expr::mentions_variable),
        }
    }

    pub fn is_zero_literal(&self) -> bool {
        match &self.kind {
            ExprKind::Literal(Literal::Int(n)) => *n == 0,
            ExprKind::Literal(Literal::Float(x)) => *x == 0.0,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Ident(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Call {
        callee: String,
        callee_span: Span,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        })
    }
}
