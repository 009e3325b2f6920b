// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error hints - suggestions for fixing common mistakes.
//!
//! Kept separate from the main parser to avoid clutter.

use amaro_ast::token::TokenKind;

/// Get a hint for an "expected X" error based on context.
pub fn for_expected(expected: &str, found: &TokenKind) -> Option<&'static str> {
    match (expected, found) {
        // Struct member hints
        ("':'", TokenKind::Eq) => Some("struct definitions use ':' for types, struct literals use '='"),
        ("':'", _) => Some("syntax: Name{field : Type}"),

        // Field hints
        ("'='", TokenKind::Colon) => Some("fields are written 'name = value'"),
        ("'='", _) => Some("fields are written 'name = value'"),

        // Closing delimiters
        ("'}'", _) => Some("every '{' needs a matching '}'"),
        ("')'", TokenKind::Eof) => Some("add ')' to close the parenthesis"),
        ("']'", TokenKind::Eof) => Some("add ']' to close the bracket"),
        ("')'", _) | ("']'", _) => None,

        // Generic angle bracket
        ("'>'", _) => Some("close the type argument list with '>'"),

        // Conditional and let hints
        ("'then'", _) => Some("syntax: if <condition> then <value> else <value>"),
        ("'else'", _) => Some("every 'if' needs an 'else' branch"),
        ("'in'", _) => Some("syntax: let <name> = <value> in <body>"),
        ("'->'", _) => Some("lambdas are written |x| -> body"),

        // Expression hints
        ("expression", TokenKind::Newline) => Some("the value is incomplete"),
        ("expression", TokenKind::Eof) => Some("the value is incomplete"),
        ("expression", TokenKind::Foreign) => Some("embedded '{{ }}' code cannot be used as a value"),
        ("expression", _) => Some("try a value, a name, or a function call"),

        // Name/identifier hints
        ("a name", TokenKind::Int(_)) => Some("names can't start with a number"),
        ("a name", _) => Some("names start with a letter or '_'"),

        // Type hints
        ("type", _) => Some("try a type like 'Location', 'Vec<Qubit>' or '(Location, Location)'"),

        // Item hints
        ("field or struct definition", _) => {
            Some("block entries look like 'name = value' or 'Name{field : Type}'")
        }
        ("block", _) => Some("blocks start with 'Name:' or 'Name['"),
        ("end of field", _) => Some("put each field on its own line, or separate them with ','"),

        _ => None,
    }
}
