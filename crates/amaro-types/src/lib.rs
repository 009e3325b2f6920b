// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type system and semantic checker for routing descriptions.
//!
//! Validates block structure and infers a type for every expression.

mod builtins;
mod checker;
mod scope;
mod types;

pub use builtins::{Bindings, BuiltinRegistry, Scheme, Signature, GATE_NAMES};
pub use checker::{check, CheckResult, Checker, Rule, SemanticError};
pub use scope::{ScopeKind, SymbolTable};
pub use types::{compatible, index_compatible, join, Type};
