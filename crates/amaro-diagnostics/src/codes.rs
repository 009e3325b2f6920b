// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Diagnostic code registry.
//!
//! Maps the stable code names to titles and categories. Codes are plain
//! words rather than numbers so editors can show them as-is.

use std::collections::HashMap;

/// Registry of all known diagnostic codes.
pub struct ErrorCodeRegistry {
    codes: HashMap<&'static str, ErrorCodeInfo>,
}

/// Information about a single code.
pub struct ErrorCodeInfo {
    pub code: &'static str,
    pub title: &'static str,
    pub category: ErrorCategory,
}

/// Code category for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Structure,
    Type,
    Resolution,
    Style,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Syntax => write!(f, "Syntax"),
            ErrorCategory::Structure => write!(f, "Structure"),
            ErrorCategory::Type => write!(f, "Type"),
            ErrorCategory::Resolution => write!(f, "Resolution"),
            ErrorCategory::Style => write!(f, "Style"),
        }
    }
}

pub const SYNTAX_ERROR: &str = "SyntaxError";
pub const INVALID_TOKEN: &str = "InvalidToken";
pub const NESTING_TOO_DEEP: &str = "NestingTooDeep";
pub const MISSING_BLOCK: &str = "MissingBlock";
pub const MISSING_FIELD: &str = "MissingField";
pub const DUPLICATE_BLOCK: &str = "DuplicateBlock";
pub const TYPE_MISMATCH: &str = "TypeMismatch";
pub const INDEX_TYPE_MISMATCH: &str = "IndexTypeMismatch";
pub const UNKNOWN_IDENTIFIER: &str = "UnknownIdentifier";
pub const STYLE_CAPITALIZATION: &str = "StyleCapitalization";
pub const UNRECOGNIZED_GATE: &str = "UnrecognizedGate";

macro_rules! register_codes {
    ($($code:expr => ($title:literal, $cat:expr)),* $(,)?) => {{
        let mut map = HashMap::new();
        $(
            map.insert($code, ErrorCodeInfo {
                code: $code,
                title: $title,
                category: $cat,
            });
        )*
        map
    }};
}

impl Default for ErrorCodeRegistry {
    fn default() -> Self {
        use ErrorCategory::*;

        Self {
            codes: register_codes! {
                SYNTAX_ERROR => ("syntax error", Syntax),
                INVALID_TOKEN => ("invalid token", Syntax),
                NESTING_TOO_DEEP => ("nesting too deep", Syntax),

                MISSING_BLOCK => ("missing mandatory block", Structure),
                MISSING_FIELD => ("missing required field", Structure),
                DUPLICATE_BLOCK => ("duplicate block", Structure),

                TYPE_MISMATCH => ("mismatched types", Type),
                INDEX_TYPE_MISMATCH => ("mismatched index type", Type),

                UNKNOWN_IDENTIFIER => ("unknown identifier", Resolution),

                STYLE_CAPITALIZATION => ("block name capitalization", Style),
                UNRECOGNIZED_GATE => ("unrecognized gate", Style),
            },
        }
    }
}

impl ErrorCodeRegistry {
    pub fn get(&self, code: &str) -> Option<&ErrorCodeInfo> {
        self.codes.get(code)
    }

    pub fn all(&self) -> impl Iterator<Item = &ErrorCodeInfo> {
        self.codes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_is_registered_once() {
        let registry = ErrorCodeRegistry::default();
        assert_eq!(registry.all().count(), 11);
        let info = registry.get(INDEX_TYPE_MISMATCH).unwrap();
        assert_eq!(info.code, "IndexTypeMismatch");
        assert_eq!(info.category, ErrorCategory::Type);
        assert!(registry.get("E0308").is_none());
    }
}
