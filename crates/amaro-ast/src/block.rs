// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Top-level file structure: blocks, fields, struct definitions.

use std::fmt;

use crate::expr::Expr;
use crate::{NodeId, Span};

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct File {
    pub id: NodeId,
    pub items: Vec<Item>,
    pub span: Span,
}

/// A top-level item.
#[derive(Debug, Clone)]
pub enum Item {
    Block(Block),
    Foreign(ForeignBlock),
}

/// How a block was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    /// `Name:` followed by fields up to the next block header
    Colon,
    /// `Name[ ... ]`
    Bracket,
}

/// A named top-level section (`RouteInfo:`, `TransitionInfo:`, ...).
#[derive(Debug, Clone)]
pub struct Block {
    pub id: NodeId,
    pub name: String,
    pub name_span: Span,
    pub style: BlockStyle,
    pub items: Vec<BlockItem>,
    /// Header through last item.
    pub span: Span,
}

/// An entry inside a block, in source order.
#[derive(Debug, Clone)]
pub enum BlockItem {
    Field(Field),
    Struct(StructDef),
    Foreign(ForeignBlock),
}

/// `name = value`
#[derive(Debug, Clone)]
pub struct Field {
    pub id: NodeId,
    pub name: String,
    pub name_span: Span,
    pub value: Expr,
    pub span: Span,
}

/// `Name{field : Type, ...}`
#[derive(Debug, Clone)]
pub struct StructDef {
    pub id: NodeId,
    pub name: String,
    pub name_span: Span,
    pub fields: Vec<StructField>,
    pub span: Span,
}

/// One `name : Type` member of a struct definition.
#[derive(Debug, Clone)]
pub struct StructField {
    pub id: NodeId,
    pub name: String,
    pub name_span: Span,
    pub ty: TypeExpr,
}

/// A type as written in source.
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub id: NodeId,
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    /// `Location`, `Vec<Location>`, `Vec()`
    Named { name: String, args: Vec<TypeExpr> },
    /// `(Location, Location)`
    Tuple(Vec<TypeExpr>),
    Error,
}

/// Opaque `{{ ... }}` foreign code. Only its extent is recorded.
#[derive(Debug, Clone)]
pub struct ForeignBlock {
    pub id: NodeId,
    pub span: Span,
}

impl File {
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.items.iter().filter_map(|item| match item {
            Item::Block(block) => Some(block),
            Item::Foreign(_) => None,
        })
    }
}

impl Block {
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.items.iter().filter_map(|item| match item {
            BlockItem::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDef> {
        self.items.iter().filter_map(|item| match item {
            BlockItem::Struct(def) => Some(def),
            _ => None,
        })
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields().find(|f| f.name == name)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeExprKind::Named { name, args } if args.is_empty() => f.write_str(name),
            TypeExprKind::Named { name, args } => {
                write!(f, "{}<", name)?;
                write_types(f, args)?;
                f.write_str(">")
            }
            TypeExprKind::Tuple(elems) => {
                f.write_str("(")?;
                write_types(f, elems)?;
                f.write_str(")")
            }
            TypeExprKind::Error => f.write_str("?"),
        }
    }
}

fn write_types(f: &mut fmt::Formatter<'_>, types: &[TypeExpr]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

impl ForeignBlock {
    /// The raw text of the span, delimiters included.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.span.start..self.span.end).unwrap_or("")
    }
}
