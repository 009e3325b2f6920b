// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Per-document analysis pipeline.
//!
//! [`analyze`] runs every pass over one text snapshot: lex, parse, check
//! structure and types, then converts all errors into one ordered list of
//! [`Diagnostic`]s. It never stops at the first problem. The result is
//! immutable and can be shared across threads; [`DocumentStore`] keeps the
//! freshest result for each open document.

mod outline;
mod store;

use std::collections::HashMap;

use amaro_ast::block::File;
use amaro_ast::NodeId;
use amaro_diagnostics::{Diagnostic, ToDiagnostic};
use amaro_types::Type;
use tracing::debug;

pub use outline::{outline, Symbol, SymbolKind};
pub use store::{Document, DocumentStore};

/// Everything known about one snapshot of a document.
#[derive(Debug)]
pub struct Analysis {
    pub file: File,
    /// Parse errors first, then structural checks, then type errors.
    pub diagnostics: Vec<Diagnostic>,
    /// Inferred type of each expression and binding.
    pub node_types: HashMap<NodeId, Type>,
}

impl Analysis {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Block/struct/field tree for editor outlines.
    pub fn outline(&self) -> Vec<Symbol> {
        outline(&self.file)
    }
}

/// Parse and check `source`.
pub fn analyze(source: &str) -> Analysis {
    let _span = tracing::debug_span!("analyze", bytes = source.len()).entered();

    let parsed = amaro_parser::parse(source);
    debug!(items = parsed.file.items.len(), errors = parsed.errors.len(), "parsed");

    let checked = amaro_types::check(&parsed.file);
    debug!(
        errors = checked.errors.len(),
        typed_nodes = checked.node_types.len(),
        "checked"
    );

    let mut diagnostics: Vec<Diagnostic> = parsed.errors.iter().map(ToDiagnostic::to_diagnostic).collect();
    diagnostics.extend(checked.errors.iter().map(ToDiagnostic::to_diagnostic));

    Analysis { file: parsed.file, diagnostics, node_types: checked.node_types }
}
