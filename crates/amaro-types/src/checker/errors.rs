// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Semantic error types.

use amaro_ast::Span;

use crate::types::Type;

/// A problem found by semantic analysis. Analysis never stops at the first
/// one; every variant carries the span it is anchored to.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SemanticError {
    #[error("missing mandatory block: '{name}'")]
    MissingBlock { name: String, span: Span },

    #[error("block '{block}' is missing required field '{field}'")]
    MissingField { block: String, field: String, span: Span },

    #[error("duplicate definition of '{name}' block")]
    DuplicateBlock { name: String, span: Span, first: Span },

    #[error("block '{name}' should be capitalized as '{suggestion}'")]
    StyleCapitalization { name: String, suggestion: String, span: Span },

    #[error("'{name}' is not a recognized standard gate")]
    UnrecognizedGate { name: String, span: Span },

    #[error("type mismatch: expected {expected}, found {found}")]
    Mismatch { expected: Type, found: Type, span: Span },

    #[error("if branches have incompatible types: then is {then_ty}, else is {else_ty}")]
    BranchMismatch { then_ty: Type, else_ty: Type, span: Span },

    #[error("operator '{op}' cannot be applied to {left} and {right}")]
    InvalidOperands { op: String, left: Type, right: Type, span: Span },

    #[error("operator '{op}' cannot be applied to {operand}")]
    InvalidOperand { op: String, operand: Type, span: Span },

    #[error("'{name}' expects {expected} argument(s), found {found}")]
    ArityMismatch { name: String, expected: usize, found: usize, span: Span },

    #[error("type {ty} is not callable")]
    NotCallable { ty: Type, span: Span },

    #[error("type {ty} cannot be indexed")]
    NotIndexable { ty: Type, span: Span },

    #[error("index type mismatch: expected {expected}, found {found}")]
    IndexTypeMismatch { expected: Type, found: Type, span: Span },

    #[error("tuple index {index} is out of range for {ty}")]
    TupleIndexOutOfRange { ty: Type, index: u32, span: Span },

    #[error("unknown identifier '{name}'")]
    UnknownIdentifier { name: String, span: Span },

    #[error("no member '{member}' on type {ty}")]
    UnknownMember { ty: Type, member: String, span: Span },

    #[error("projection path does not resolve against type {ty}")]
    UnresolvedProjection { ty: Type, span: Span },
}

/// The rule a [`SemanticError`] belongs to. Several variants share a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    MissingBlock,
    MissingField,
    DuplicateBlock,
    StyleCapitalization,
    UnrecognizedGate,
    TypeMismatch,
    IndexTypeMismatch,
    UnknownIdentifier,
}

impl SemanticError {
    /// Primary span.
    pub fn span(&self) -> Span {
        match self {
            SemanticError::MissingBlock { span, .. }
            | SemanticError::MissingField { span, .. }
            | SemanticError::DuplicateBlock { span, .. }
            | SemanticError::StyleCapitalization { span, .. }
            | SemanticError::UnrecognizedGate { span, .. }
            | SemanticError::Mismatch { span, .. }
            | SemanticError::BranchMismatch { span, .. }
            | SemanticError::InvalidOperands { span, .. }
            | SemanticError::InvalidOperand { span, .. }
            | SemanticError::ArityMismatch { span, .. }
            | SemanticError::NotCallable { span, .. }
            | SemanticError::NotIndexable { span, .. }
            | SemanticError::IndexTypeMismatch { span, .. }
            | SemanticError::TupleIndexOutOfRange { span, .. }
            | SemanticError::UnknownIdentifier { span, .. }
            | SemanticError::UnknownMember { span, .. }
            | SemanticError::UnresolvedProjection { span, .. } => *span,
        }
    }

    pub fn rule(&self) -> Rule {
        match self {
            SemanticError::MissingBlock { .. } => Rule::MissingBlock,
            SemanticError::MissingField { .. } => Rule::MissingField,
            SemanticError::DuplicateBlock { .. } => Rule::DuplicateBlock,
            SemanticError::StyleCapitalization { .. } => Rule::StyleCapitalization,
            SemanticError::UnrecognizedGate { .. } => Rule::UnrecognizedGate,
            SemanticError::Mismatch { .. }
            | SemanticError::BranchMismatch { .. }
            | SemanticError::InvalidOperands { .. }
            | SemanticError::InvalidOperand { .. }
            | SemanticError::ArityMismatch { .. }
            | SemanticError::NotCallable { .. }
            | SemanticError::NotIndexable { .. }
            | SemanticError::TupleIndexOutOfRange { .. } => Rule::TypeMismatch,
            SemanticError::IndexTypeMismatch { .. } => Rule::IndexTypeMismatch,
            SemanticError::UnknownIdentifier { .. }
            | SemanticError::UnknownMember { .. }
            | SemanticError::UnresolvedProjection { .. } => Rule::UnknownIdentifier,
        }
    }

    /// Warnings do not make a document invalid.
    pub fn is_warning(&self) -> bool {
        matches!(self.rule(), Rule::StyleCapitalization | Rule::UnrecognizedGate)
    }
}
