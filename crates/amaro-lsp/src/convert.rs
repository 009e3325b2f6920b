// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! LSP protocol conversion utilities.
//!
//! Positions are UTF-16 based on the wire; everything inside the front end
//! works in byte offsets.

use amaro_analysis::{Symbol, SymbolKind as OutlineKind};
use amaro_ast::{LineMap, Span};
use amaro_diagnostics::LabelStyle;
use tower_lsp::lsp_types::*;

pub fn span_to_range(source: &str, lines: &LineMap, span: Span) -> Range {
    let (start_line, start_char) = lines.offset_to_utf16(source, span.start);
    let (end_line, end_char) = lines.offset_to_utf16(source, span.end);
    Range::new(Position::new(start_line, start_char), Position::new(end_line, end_char))
}

/// Convert a front-end diagnostic to an LSP diagnostic.
pub fn to_lsp_diagnostic(
    source: &str,
    lines: &LineMap,
    uri: &Url,
    diag: &amaro_diagnostics::Diagnostic,
) -> Diagnostic {
    let primary = diag
        .labels
        .iter()
        .find(|l| l.style == LabelStyle::Primary)
        .or(diag.labels.first());

    let range = match primary {
        Some(label) => span_to_range(source, lines, label.span),
        None => Range::default(),
    };

    let severity = Some(match diag.severity {
        amaro_diagnostics::Severity::Error => DiagnosticSeverity::ERROR,
        amaro_diagnostics::Severity::Warning => DiagnosticSeverity::WARNING,
    });

    let code = diag.code_str().map(|c| NumberOrString::String(c.to_string()));

    // Editors show one string: message, then notes, then help.
    let mut message = diag.message.clone();
    for note in &diag.notes {
        message = format!("{}\n\nnote: {}", message, note);
    }
    if let Some(ref help) = diag.help {
        message = format!("{}\n\nhelp: {}", message, help.message);
    }

    let related_information: Vec<DiagnosticRelatedInformation> = diag
        .labels
        .iter()
        .filter(|l| l.style == LabelStyle::Secondary)
        .map(|l| DiagnosticRelatedInformation {
            location: Location { uri: uri.clone(), range: span_to_range(source, lines, l.span) },
            message: l.message.clone().unwrap_or_default(),
        })
        .collect();

    Diagnostic {
        range,
        severity,
        code,
        code_description: None,
        source: Some("amaro".to_string()),
        message,
        related_information: if related_information.is_empty() { None } else { Some(related_information) },
        tags: None,
        data: None,
    }
}

fn symbol_kind(kind: OutlineKind) -> SymbolKind {
    match kind {
        OutlineKind::Block => SymbolKind::MODULE,
        OutlineKind::Struct => SymbolKind::STRUCT,
        OutlineKind::Field => SymbolKind::FIELD,
    }
}

/// Convert an outline into nested document symbols.
pub fn to_document_symbols(source: &str, lines: &LineMap, symbols: &[Symbol]) -> Vec<DocumentSymbol> {
    symbols
        .iter()
        .map(|symbol| {
            let children = to_document_symbols(source, lines, &symbol.children);
            #[allow(deprecated)] // `deprecated` is required by the struct
            DocumentSymbol {
                name: symbol.name.clone(),
                detail: symbol.detail.clone(),
                kind: symbol_kind(symbol.kind),
                tags: None,
                deprecated: None,
                range: span_to_range(source, lines, symbol.span),
                selection_range: span_to_range(source, lines, symbol.selection_span),
                children: if children.is_empty() { None } else { Some(children) },
            }
        })
        .collect()
}
