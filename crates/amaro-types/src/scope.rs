// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scope stack for name resolution during checking.

use crate::builtins::BuiltinRegistry;
use crate::types::Type;

/// The kind of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Fields of one block, bound in source order
    Block,
    /// One `let` binding
    Let,
    /// Lambda parameters
    Lambda,
}

/// A local scope. Bindings keep insertion order; a later binding of the
/// same name shadows an earlier one.
#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    bindings: Vec<(String, Type)>,
}

/// Local scopes stacked over the immutable builtin registry.
pub struct SymbolTable {
    globals: &'static BuiltinRegistry,
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { globals: BuiltinRegistry::load(), scopes: Vec::new() }
    }

    pub fn globals(&self) -> &'static BuiltinRegistry {
        self.globals
    }

    pub fn push(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope { kind, bindings: Vec::new() });
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current_kind(&self) -> Option<ScopeKind> {
        self.scopes.last().map(|s| s.kind)
    }

    /// Bind `name` in the innermost scope. Outside any local scope this is a
    /// no-op: the global scope is read-only.
    pub fn bind(&mut self, name: impl Into<String>, ty: Type) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.push((name.into(), ty));
        }
    }

    /// Innermost local binding of `name`.
    pub fn lookup_local(&self, name: &str) -> Option<&Type> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.bindings.iter().rev())
            .find(|(bound, _)| bound == name)
            .map(|(_, ty)| ty)
    }

    /// Local bindings first, then builtin context values.
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.lookup_local(name).or_else(|| self.globals.value(name))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_shadows_outer_without_mutating_it() {
        let mut table = SymbolTable::new();
        table.push(ScopeKind::Block);
        table.bind("x", Type::Int);
        table.push(ScopeKind::Let);
        table.bind("x", Type::Location);
        assert_eq!(table.lookup("x"), Some(&Type::Location));
        table.pop();
        assert_eq!(table.lookup("x"), Some(&Type::Int));
    }

    #[test]
    fn falls_back_to_builtins() {
        let mut table = SymbolTable::new();
        assert_eq!(table.lookup("Gate"), Some(&Type::Gate));
        table.push(ScopeKind::Lambda);
        table.bind("Gate", Type::Int);
        assert_eq!(table.lookup("Gate"), Some(&Type::Int));
        table.pop();
        assert_eq!(table.lookup("Gate"), Some(&Type::Gate));
    }

    #[test]
    fn global_scope_is_read_only() {
        let mut table = SymbolTable::new();
        table.bind("x", Type::Int);
        assert!(table.lookup("x").is_none());
        assert_eq!(table.depth(), 0);
        assert_eq!(table.current_kind(), None);
    }
}
