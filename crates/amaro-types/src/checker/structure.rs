// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Block-level policy: which blocks must exist, which fields they need,
//! naming style, duplicates, and recognized gates.

use std::collections::HashMap;

use amaro_ast::expr::{Expr, ExprKind};
use amaro_ast::Span;

use super::{Checker, SemanticError};

/// Block kinds, in canonical spelling. The last five are legacy names.
const KNOWN_BLOCKS: &[&str] = &[
    "RouteInfo",
    "TransitionInfo",
    "ArchInfo",
    "StateInfo",
    "GateRealization",
    "Transition",
    "Architecture",
    "Arch",
    "Step",
];

const REQUIRED_BLOCKS: &[&str] = &["RouteInfo", "TransitionInfo"];

/// Gates accepted in `routed_gates`.
const STANDARD_GATES: &[&str] = &["CX", "T", "Pauli", "PauliMeasurement"];

fn required_fields(block: &str) -> &'static [&'static str] {
    match block {
        "RouteInfo" => &["routed_gates", "realize_gate"],
        "TransitionInfo" => &["get_transitions", "apply", "cost"],
        _ => &[],
    }
}

/// Canonical spelling of a known block name, matched case-insensitively.
pub fn canonical_block_name(name: &str) -> Option<&'static str> {
    KNOWN_BLOCKS.iter().find(|known| known.eq_ignore_ascii_case(name)).copied()
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl<'a> Checker<'a> {
    pub(crate) fn check_structure(&mut self) {
        let file = self.file;
        let mut seen: HashMap<String, Span> = HashMap::new();

        for block in file.blocks() {
            let canonical = canonical_block_name(&block.name);

            match canonical {
                Some(expected) if expected != block.name => {
                    self.report(SemanticError::StyleCapitalization {
                        name: block.name.clone(),
                        suggestion: expected.to_string(),
                        span: block.name_span,
                    });
                }
                None if block.name.starts_with(|c: char| c.is_lowercase()) => {
                    self.report(SemanticError::StyleCapitalization {
                        name: block.name.clone(),
                        suggestion: capitalize(&block.name),
                        span: block.name_span,
                    });
                }
                _ => {}
            }

            let key = block.name.to_lowercase();
            match seen.get(&key) {
                Some(first) => {
                    let first = *first;
                    self.report(SemanticError::DuplicateBlock {
                        name: block.name.clone(),
                        span: block.name_span,
                        first,
                    });
                }
                None => {
                    seen.insert(key, block.name_span);
                }
            }

            let Some(kind) = canonical else { continue };

            for field in required_fields(kind) {
                if block.field(field).is_none() {
                    self.report(SemanticError::MissingField {
                        block: block.name.clone(),
                        field: field.to_string(),
                        span: block.name_span,
                    });
                }
            }

            if kind == "RouteInfo" {
                if let Some(gates) = block.field("routed_gates") {
                    self.validate_gates(&gates.value);
                }
            }
        }

        for required in REQUIRED_BLOCKS {
            if !seen.contains_key(&required.to_lowercase()) {
                self.report(SemanticError::MissingBlock {
                    name: required.to_string(),
                    span: Span::new(0, 0),
                });
            }
        }
    }

    fn validate_gates(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Ident(name) if !STANDARD_GATES.contains(&name.as_str()) => {
                self.report(SemanticError::UnrecognizedGate { name: name.clone(), span: expr.span });
            }
            ExprKind::Vec(items) | ExprKind::Tuple(items) => {
                for item in items {
                    self.validate_gates(item);
                }
            }
            _ => {}
        }
    }
}
