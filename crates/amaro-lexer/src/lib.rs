// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexer for the Amaro routing language.
//!
//! Tokenizes source code into a stream of tokens for the parser. Lexing
//! never fails: bad input becomes `TokenKind::Error` tokens.

mod lexer;

pub use lexer::{LexResult, Lexer};
