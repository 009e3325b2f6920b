// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Semantic checker: structure validation, then bottom-up type inference
//! over every field value.

mod check_expr;
mod errors;
mod structure;

pub use errors::{Rule, SemanticError};

use std::collections::{HashMap, HashSet};

use amaro_ast::block::{BlockItem, File, StructDef, TypeExpr, TypeExprKind};
use amaro_ast::NodeId;

use crate::scope::{ScopeKind, SymbolTable};
use crate::types::Type;

/// Result of checking one file.
#[derive(Debug, Default)]
pub struct CheckResult {
    /// Every problem found, structure first, then types in source order.
    pub errors: Vec<SemanticError>,
    /// Inferred type of each expression, field, and binding.
    pub node_types: HashMap<NodeId, Type>,
}

impl CheckResult {
    pub fn type_of(&self, id: NodeId) -> Option<&Type> {
        self.node_types.get(&id)
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| !e.is_warning())
    }
}

/// Check a parsed file. Never fails; problems are returned as data.
pub fn check(file: &File) -> CheckResult {
    let mut checker = Checker::new(file);
    checker.check_structure();
    checker.check_fields();
    checker.finish()
}

pub struct Checker<'a> {
    file: &'a File,
    symbols: SymbolTable,
    /// Fields of user-declared structs, by struct name.
    structs: HashMap<String, Vec<(String, Type)>>,
    /// Extra members declared for builtin domain types (`Arch{width : Int}`).
    domain_fields: HashMap<String, Vec<(String, Type)>>,
    errors: Vec<SemanticError>,
    node_types: HashMap<NodeId, Type>,
}

impl<'a> Checker<'a> {
    pub fn new(file: &'a File) -> Self {
        let mut checker = Self {
            file,
            symbols: SymbolTable::new(),
            structs: HashMap::new(),
            domain_fields: HashMap::new(),
            errors: Vec::new(),
            node_types: HashMap::new(),
        };
        checker.collect_structs();
        checker
    }

    pub fn finish(self) -> CheckResult {
        CheckResult { errors: self.errors, node_types: self.node_types }
    }

    fn report(&mut self, error: SemanticError) {
        self.errors.push(error);
    }

    /// Gather struct definitions from every block before any inference, so a
    /// field may use a struct declared in a later block.
    fn collect_structs(&mut self) {
        let file = self.file;
        let defs: Vec<&'a StructDef> = file
            .blocks()
            .flat_map(|block| block.items.iter())
            .filter_map(|item| match item {
                BlockItem::Struct(def) => Some(def),
                _ => None,
            })
            .collect();

        let declared: HashSet<&str> = defs.iter().map(|d| d.name.as_str()).collect();

        for def in defs {
            let fields: Vec<(String, Type)> = def
                .fields
                .iter()
                .map(|f| {
                    let ty = resolve_type_expr(&f.ty, &declared);
                    self.node_types.insert(f.id, ty.clone());
                    (f.name.clone(), ty)
                })
                .collect();

            let is_domain = Type::from_name(&def.name).and_then(|t| t.domain_name()).is_some();
            let table = if is_domain { &mut self.domain_fields } else { &mut self.structs };
            table.entry(def.name.clone()).or_default().extend(fields);
        }
    }

    /// Infer every field of every block. Each block gets its own scope in
    /// which earlier fields are visible to later ones.
    fn check_fields(&mut self) {
        let file = self.file;
        for block in file.blocks() {
            self.symbols.push(ScopeKind::Block);
            for field in block.fields() {
                let ty = self.infer(&field.value);
                self.node_types.insert(field.id, ty.clone());
                self.symbols.bind(field.name.as_str(), ty);
            }
            self.symbols.pop();
        }
    }
}

/// Turn a written type into a [`Type`]. Unknown names resolve to `Unknown`
/// rather than failing.
fn resolve_type_expr(ty: &TypeExpr, declared: &HashSet<&str>) -> Type {
    match &ty.kind {
        TypeExprKind::Named { name, args } => {
            let arg = |i: usize| {
                args.get(i).map(|a| resolve_type_expr(a, declared)).unwrap_or(Type::Unknown)
            };
            match name.as_str() {
                "Vec" => Type::vec(arg(0)),
                "Option" => Type::option(arg(0)),
                _ => match Type::from_name(name) {
                    Some(builtin) => builtin,
                    None if declared.contains(name.as_str()) => {
                        Type::Struct { name: name.clone(), fields: Vec::new() }
                    }
                    None => Type::Unknown,
                },
            }
        }
        TypeExprKind::Tuple(elems) => {
            Type::Tuple(elems.iter().map(|e| resolve_type_expr(e, declared)).collect())
        }
        TypeExprKind::Error => Type::Unknown,
    }
}
