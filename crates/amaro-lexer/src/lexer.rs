// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The lexer implementation using logos.

use logos::Logos;
use amaro_ast::token::{Token, TokenKind};
use amaro_ast::Span;

/// Raw token type for logos - we parse values in a second pass.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\f]+")]  // Skip horizontal whitespace (not newlines)
enum RawToken {
    // === Keywords ===
    #[token("let")]
    Let,
    #[token("in")]
    In,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("None")]
    None,
    #[token("not")]
    Not,

    // === Operators (order matters - longer first) ===
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("..")]
    DotDot,
    #[token("->")]
    Arrow,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("!")]
    Bang,
    #[token(".")]
    Dot,
    #[token("|")]
    Pipe,

    // === Delimiters ===
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,

    // Embedded foreign code; the payload says whether it was closed.
    #[token("{{", foreign_block)]
    Foreign(bool),

    #[token("\n")]
    Newline,

    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    // === Literals ===
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    Float,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    String,

    // Longest-match loses to `String` whenever the closing quote exists.
    #[regex(r#""([^"\\\n]|\\.)*"#)]
    #[regex(r"'([^'\\\n]|\\.)*")]
    UnterminatedString,

    // === Identifier (must come after keywords) ===
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

/// Scan `{{ ... }}` with brace counting. The opening `{{` already counts
/// two; the span ends once every brace is closed again. Always `Some`: the
/// flag records whether the block was closed before end of input.
fn foreign_block(lexer: &mut logos::Lexer<RawToken>) -> Option<bool> {
    let mut depth = 2usize;
    let mut consumed = 0;

    for ch in lexer.remainder().chars() {
        consumed += ch.len_utf8();
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    lexer.bump(consumed);
                    return Some(true);
                }
            }
            _ => {}
        }
    }

    lexer.bump(consumed);
    Some(false)
}

/// The lexer for Amaro source code.
pub struct Lexer<'a> {
    source: &'a str,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// Tokenize the entire source. Always ends with an `Eof` token.
    pub fn tokenize(&mut self) -> LexResult {
        let mut tokens: Vec<Token> = Vec::new();
        let mut logos_lexer = RawToken::lexer(self.source);

        while let Some(result) = logos_lexer.next() {
            let span = logos_lexer.span();
            let slice = logos_lexer.slice();

            let kind = match result {
                Ok(RawToken::Float) if matches!(tokens.last(), Some(t) if t.kind == TokenKind::Dot) => {
                    // `t.0.1` lexes `0.1` as a float; split it back into indices.
                    if let Some(parts) = split_tuple_indices(slice, span.start) {
                        tokens.extend(parts);
                        continue;
                    }
                    convert_float(slice)
                }
                Ok(raw) => convert_token(raw, slice),
                Err(()) => {
                    let ch = self.source[span.start..].chars().next().unwrap_or('?');
                    // Fold runs of garbage into one token.
                    if let Some(last) = tokens.last_mut() {
                        if matches!(last.kind, TokenKind::Error(_)) && last.span.end == span.start {
                            last.span.end = span.end;
                            last.kind = TokenKind::Error(format!(
                                "Unexpected characters '{}'",
                                &self.source[last.span.start..last.span.end]
                            ));
                            continue;
                        }
                    }
                    TokenKind::Error(format!("Unexpected character '{}'", ch))
                }
            };

            tokens.push(Token {
                kind,
                span: Span::new(span.start, span.end),
            });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            span: Span::new(self.source.len(), self.source.len()),
        });

        LexResult { tokens }
    }
}

/// Convert a raw logos token to our TokenKind, parsing literals.
fn convert_token(raw: RawToken, slice: &str) -> TokenKind {
    match raw {
        RawToken::Let => TokenKind::Let,
        RawToken::In => TokenKind::In,
        RawToken::If => TokenKind::If,
        RawToken::Then => TokenKind::Then,
        RawToken::Else => TokenKind::Else,
        RawToken::True => TokenKind::Bool(true),
        RawToken::False => TokenKind::Bool(false),
        RawToken::None => TokenKind::None,
        RawToken::Not => TokenKind::Not,

        RawToken::EqEq => TokenKind::EqEq,
        RawToken::BangEq => TokenKind::BangEq,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::AmpAmp => TokenKind::AmpAmp,
        RawToken::PipePipe => TokenKind::PipePipe,
        RawToken::DotDot => TokenKind::DotDot,
        RawToken::Arrow => TokenKind::Arrow,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Percent => TokenKind::Percent,
        RawToken::Eq => TokenKind::Eq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::Gt => TokenKind::Gt,
        RawToken::Bang => TokenKind::Bang,
        RawToken::Dot => TokenKind::Dot,
        RawToken::Pipe => TokenKind::Pipe,

        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Semi => TokenKind::Semi,
        RawToken::Comma => TokenKind::Comma,

        RawToken::Foreign(true) => TokenKind::Foreign,
        RawToken::Foreign(false) => {
            TokenKind::Error("Unterminated embedded block - missing '}}'".to_string())
        }
        RawToken::Newline => TokenKind::Newline,

        RawToken::Int => match slice.parse::<i64>() {
            Ok(value) => TokenKind::Int(value),
            Err(_) => TokenKind::Error(format!("Integer literal '{}' is too large", slice)),
        },
        RawToken::Float => convert_float(slice),
        RawToken::String => TokenKind::String(unescape(&slice[1..slice.len() - 1])),
        RawToken::UnterminatedString => TokenKind::Error("Unterminated string".to_string()),
        RawToken::Ident => TokenKind::Ident(slice.to_string()),

        // Skipped by logos, listed for exhaustiveness
        RawToken::LineComment => unreachable!("comments are skipped"),
    }
}

fn convert_float(slice: &str) -> TokenKind {
    match slice.parse::<f64>() {
        Ok(value) => TokenKind::Float(value),
        Err(_) => TokenKind::Error(format!("Invalid number '{}'", slice)),
    }
}

/// `0.1` directly after a `.` becomes `0`, `.`, `1`.
fn split_tuple_indices(slice: &str, start: usize) -> Option<[Token; 3]> {
    let (whole, frac) = slice.split_once('.')?;
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let first = whole.parse::<i64>().ok()?;
    let second = frac.parse::<i64>().ok()?;
    let dot = start + whole.len();
    Some([
        Token { kind: TokenKind::Int(first), span: Span::new(start, dot) },
        Token { kind: TokenKind::Dot, span: Span::new(dot, dot + 1) },
        Token { kind: TokenKind::Int(second), span: Span::new(dot + 1, start + slice.len()) },
    ])
}

/// Resolve backslash escapes. Unknown escapes keep the escaped character.
fn unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

/// Result of lexing.
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<Token>,
}

impl LexResult {
    /// Error tokens, in source order.
    pub fn errors(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| matches!(t.kind, TokenKind::Error(_)))
    }

    /// Returns true if lexing produced no error tokens.
    pub fn is_ok(&self) -> bool {
        self.errors().next().is_none()
    }
}
