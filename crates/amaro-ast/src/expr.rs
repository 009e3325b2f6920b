// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression AST nodes.

use std::fmt;

use crate::{NodeId, Span};

/// An expression in the AST.
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

/// The kind of expression.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Bool(bool),
    /// Identifier
    Ident(String),
    /// Binary operation
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Function or method call (`f(x)`, `v.push(x)`)
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    /// Lambda (`|x, y| -> body`)
    Lambda {
        params: Vec<LambdaParam>,
        body: Box<Expr>,
    },
    /// `let a = e1 in let b = e2 in body`, bindings in source order
    Let {
        bindings: Vec<LetBinding>,
        body: Box<Expr>,
    },
    /// `if c then a else b`
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// Field or property access (`State.map`)
    Field {
        object: Box<Expr>,
        field: String,
        field_span: Span,
    },
    /// Index access (`v[i]`)
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// Tuple element (`t.0`, `t.(0)`)
    TupleIndex {
        object: Box<Expr>,
        index: u32,
    },
    /// Dynamic projection (`x.(path())`)
    Projection {
        object: Box<Expr>,
        path: Box<Expr>,
    },
    /// Range (`a..b`)
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
    },
    /// Vector literal (`[a, b]`, or a bare `a, b` field value)
    Vec(Vec<Expr>),
    /// Tuple literal (`(a, b)`)
    Tuple(Vec<Expr>),
    /// `Some(e)`
    Some(Box<Expr>),
    /// `None`
    None,
    /// Struct literal (`Transition{edge = e}`)
    StructLit {
        name: String,
        name_span: Span,
        fields: Vec<FieldInit>,
    },
    /// Placeholder for a fragment that failed to parse.
    Error,
}

/// A single `name = value` binding of a `let` chain.
#[derive(Debug, Clone)]
pub struct LetBinding {
    pub id: NodeId,
    pub name: String,
    pub name_span: Span,
    pub value: Expr,
}

/// A lambda parameter. Parameters are untyped in source.
#[derive(Debug, Clone)]
pub struct LambdaParam {
    pub id: NodeId,
    pub name: String,
    pub span: Span,
}

/// A field initializer inside a struct literal.
#[derive(Debug, Clone)]
pub struct FieldInit {
    pub name: String,
    pub name_span: Span,
    pub value: Expr,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Logical not (!, not)
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => f.write_str("-"),
            UnaryOp::Not => f.write_str("!"),
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { id: NodeId::fresh(), kind, span }
    }

    pub fn error(span: Span) -> Self {
        Self::new(ExprKind::Error, span)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ExprKind::Error)
    }

    /// One-line rendering of the expression, cut to `limit` characters.
    pub fn summarize(&self, limit: usize) -> String {
        let full = self.to_string();
        if full.chars().count() <= limit {
            return full;
        }
        let mut cut: String = full.chars().take(limit.saturating_sub(3)).collect();
        cut.push_str("...");
        cut
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Int(n) => write!(f, "{}", n),
            ExprKind::Float(x) => write!(f, "{:?}", x),
            ExprKind::String(s) => write!(f, "'{}'", s),
            ExprKind::Bool(b) => write!(f, "{}", b),
            ExprKind::Ident(name) => f.write_str(name),
            ExprKind::Binary { op, left, right } => write!(f, "{} {} {}", left, op, right),
            ExprKind::Unary { op, operand } => write!(f, "{}{}", op, operand),
            ExprKind::Call { func, args } => {
                write!(f, "{}(", func)?;
                write_list(f, args)?;
                f.write_str(")")
            }
            ExprKind::Lambda { params, body } => {
                let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
                write!(f, "|{}| -> {}", names.join(", "), body)
            }
            ExprKind::Let { bindings, body } => {
                for b in bindings {
                    write!(f, "let {} = {} in ", b.name, b.value)?;
                }
                write!(f, "{}", body)
            }
            ExprKind::If { cond, then_branch, else_branch } => {
                write!(f, "if {} then {} else {}", cond, then_branch, else_branch)
            }
            ExprKind::Field { object, field, .. } => write!(f, "{}.{}", object, field),
            ExprKind::Index { object, index } => write!(f, "{}[{}]", object, index),
            ExprKind::TupleIndex { object, index } => write!(f, "{}.{}", object, index),
            ExprKind::Projection { object, path } => write!(f, "{}.({})", object, path),
            ExprKind::Range { start, end } => write!(f, "{}..{}", start, end),
            ExprKind::Vec(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            ExprKind::Tuple(items) => {
                f.write_str("(")?;
                write_list(f, items)?;
                f.write_str(")")
            }
            ExprKind::Some(inner) => write!(f, "Some({})", inner),
            ExprKind::None => f.write_str("None"),
            ExprKind::StructLit { name, fields, .. } => {
                write!(f, "{}{{", name)?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {}", field.name, field.value)?;
                }
                f.write_str("}")
            }
            ExprKind::Error => f.write_str("<error>"),
        }
    }
}
