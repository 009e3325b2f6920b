// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conversions from front-end error types to `Diagnostic`.
//!
//! Both the `check` command and the language server use these conversions.

use amaro_parser::{ParseError, ParseErrorKind};
use amaro_types::{BuiltinRegistry, SemanticError};

use crate::codes::*;
use crate::suggestions::did_you_mean;
use crate::{Diagnostic, ToDiagnostic};

// ============================================================================
// Parse Errors
// ============================================================================

impl ToDiagnostic for ParseError {
    fn to_diagnostic(&self) -> Diagnostic {
        let (code, label) = match self.kind {
            ParseErrorKind::Syntax => (SYNTAX_ERROR, "here"),
            ParseErrorKind::InvalidToken => (INVALID_TOKEN, "not a valid token"),
            ParseErrorKind::NestingTooDeep => (NESTING_TOO_DEEP, "nesting limit reached here"),
        };

        let mut diag = Diagnostic::error(&self.message).with_code(code).with_primary(self.span, label);

        if let Some(ref hint) = self.hint {
            diag = diag.with_help(hint.as_str());
        }

        diag
    }
}

// ============================================================================
// Semantic Errors
// ============================================================================

impl ToDiagnostic for SemanticError {
    fn to_diagnostic(&self) -> Diagnostic {
        use SemanticError::*;

        let message = self.to_string();
        match self {
            MissingBlock { name, span } => Diagnostic::error(message)
                .with_code(MISSING_BLOCK)
                .with_primary(*span, "required block not found in this file")
                .with_help(format!("add a `{}:` block", name)),

            MissingField { field, span, .. } => Diagnostic::error(message)
                .with_code(MISSING_FIELD)
                .with_primary(*span, "block declared here")
                .with_help(format!("add `{} = ...` to this block", field)),

            DuplicateBlock { span, first, .. } => Diagnostic::error(message)
                .with_code(DUPLICATE_BLOCK)
                .with_primary(*span, "redefined here")
                .with_secondary(*first, "first defined here"),

            StyleCapitalization { suggestion, span, .. } => Diagnostic::warning(message)
                .with_code(STYLE_CAPITALIZATION)
                .with_primary(*span, "unconventional capitalization")
                .with_help(format!("rename to `{}`", suggestion))
                .with_suggestion(*span, suggestion.as_str()),

            UnrecognizedGate { span, .. } => Diagnostic::warning(message)
                .with_code(UNRECOGNIZED_GATE)
                .with_primary(*span, "not a standard gate")
                .with_note("standard gates are CX, T, Pauli, and PauliMeasurement"),

            Mismatch { expected, span, .. } => Diagnostic::error(message)
                .with_code(TYPE_MISMATCH)
                .with_primary(*span, format!("expected {}", expected)),

            BranchMismatch { span, .. } => Diagnostic::error(message)
                .with_code(TYPE_MISMATCH)
                .with_primary(*span, "branches disagree")
                .with_note("both branches of an `if` must have compatible types"),

            InvalidOperands { span, .. } | InvalidOperand { span, .. } => Diagnostic::error(message)
                .with_code(TYPE_MISMATCH)
                .with_primary(*span, "invalid operand types"),

            ArityMismatch { expected, span, .. } => Diagnostic::error(message)
                .with_code(TYPE_MISMATCH)
                .with_primary(*span, format!("expected {} argument(s)", expected)),

            NotCallable { span, .. } => Diagnostic::error(message)
                .with_code(TYPE_MISMATCH)
                .with_primary(*span, "called here"),

            NotIndexable { span, .. } | TupleIndexOutOfRange { span, .. } => Diagnostic::error(message)
                .with_code(TYPE_MISMATCH)
                .with_primary(*span, "indexed here"),

            IndexTypeMismatch { expected, span, .. } => Diagnostic::error(message)
                .with_code(INDEX_TYPE_MISMATCH)
                .with_primary(*span, format!("expected an index of type {}", expected))
                .with_note("Qubit and Int are interchangeable as index types"),

            UnknownIdentifier { name, span } => {
                let diag = Diagnostic::error(message)
                    .with_code(UNKNOWN_IDENTIFIER)
                    .with_primary(*span, "not found in this scope");
                match did_you_mean(name, BuiltinRegistry::load().names()) {
                    Some(help) => diag.with_help(help),
                    None => diag,
                }
            }

            UnknownMember { span, .. } => Diagnostic::error(message)
                .with_code(UNKNOWN_IDENTIFIER)
                .with_primary(*span, "unknown member"),

            UnresolvedProjection { span, .. } => Diagnostic::error(message)
                .with_code(UNKNOWN_IDENTIFIER)
                .with_primary(*span, "projection path")
                .with_help("project with a field or zero-argument method of the base type"),
        }
    }
}
