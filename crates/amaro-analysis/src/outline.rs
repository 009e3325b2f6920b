// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Document outline: one symbol per block, with its structs and fields as
//! children.

use amaro_ast::block::{Block, BlockItem, Field, File, StructDef, StructField};
use amaro_ast::Span;
use serde::Serialize;

/// Longest field-value preview shown next to a field symbol.
const DETAIL_LIMIT: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SymbolKind {
    Block,
    Struct,
    Field,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Whole extent of the node.
    pub span: Span,
    /// Just the name.
    pub selection_span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Symbol>,
}

/// Extract the outline of `file`. Foreign spans are skipped.
pub fn outline(file: &File) -> Vec<Symbol> {
    file.blocks().map(block_symbol).collect()
}

fn block_symbol(block: &Block) -> Symbol {
    let children = block
        .items
        .iter()
        .filter_map(|item| match item {
            BlockItem::Field(field) => Some(field_symbol(field)),
            BlockItem::Struct(def) => Some(struct_symbol(def)),
            BlockItem::Foreign(_) => None,
        })
        .collect();

    Symbol {
        name: block.name.clone(),
        kind: SymbolKind::Block,
        span: block.span,
        selection_span: block.name_span,
        detail: None,
        children,
    }
}

fn field_symbol(field: &Field) -> Symbol {
    Symbol {
        name: field.name.clone(),
        kind: SymbolKind::Field,
        span: field.span,
        selection_span: field.name_span,
        detail: Some(field.value.summarize(DETAIL_LIMIT)),
        children: Vec::new(),
    }
}

fn struct_symbol(def: &StructDef) -> Symbol {
    Symbol {
        name: def.name.clone(),
        kind: SymbolKind::Struct,
        span: def.span,
        selection_span: def.name_span,
        detail: None,
        children: def.fields.iter().map(struct_field_symbol).collect(),
    }
}

fn struct_field_symbol(field: &StructField) -> Symbol {
    Symbol {
        name: field.name.clone(),
        kind: SymbolKind::Field,
        span: Span::new(field.name_span.start, field.ty.span.end.max(field.name_span.end)),
        selection_span: field.name_span,
        detail: Some(field.ty.to_string()),
        children: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(symbols: &[Symbol]) -> Vec<(&str, SymbolKind)> {
        symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect()
    }

    #[test]
    fn blocks_with_structs_and_fields() {
        let src = "\
TransitionInfo:
    Transition{na : Location, path : Vec<(Location, Location)>}
    cost = 1.0
{{ foreign }}
RouteInfo:
    routed_gates = CX, T
";
        let parsed = amaro_parser::parse(src);
        let symbols = outline(&parsed.file);

        assert_eq!(names(&symbols), vec![("TransitionInfo", SymbolKind::Block), ("RouteInfo", SymbolKind::Block)]);
        assert_eq!(
            names(&symbols[0].children),
            vec![("Transition", SymbolKind::Struct), ("cost", SymbolKind::Field)]
        );

        let transition = &symbols[0].children[0];
        assert_eq!(names(&transition.children), vec![("na", SymbolKind::Field), ("path", SymbolKind::Field)]);
        assert_eq!(transition.children[1].detail.as_deref(), Some("Vec<(Location, Location)>"));

        let gates = &symbols[1].children[0];
        assert_eq!(gates.detail.as_deref(), Some("[CX, T]"));
        assert_eq!(&src[gates.selection_span.start..gates.selection_span.end], "routed_gates");
    }

    #[test]
    fn long_values_are_cut() {
        let value = (0..40).map(|i| i.to_string()).collect::<Vec<_>>().join(" + ");
        let src = format!("StateInfo:\n    cost = {}\n", value);
        let parsed = amaro_parser::parse(&src);
        let symbols = outline(&parsed.file);
        let detail = symbols[0].children[0].detail.clone().unwrap();
        assert_eq!(detail.chars().count(), DETAIL_LIMIT);
        assert!(detail.ends_with("..."));
    }

    #[test]
    fn outline_of_broken_source_is_partial() {
        let parsed = amaro_parser::parse("RouteInfo:\n    routed_gates = $\nStateInfo:\n    cost = 2\n");
        assert!(!parsed.is_ok());
        let symbols = outline(&parsed.file);
        assert!(symbols.iter().any(|s| s.name == "StateInfo"), "{:?}", symbols);
    }
}
