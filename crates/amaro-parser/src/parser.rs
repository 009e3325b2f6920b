// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The parser implementation: block structure by recursive descent, Pratt
//! parsing for expressions.

use amaro_ast::block::{
    Block, BlockItem, BlockStyle, Field, File, ForeignBlock, Item, StructDef, StructField,
    TypeExpr, TypeExprKind,
};
use amaro_ast::expr::{BinOp, Expr, ExprKind, FieldInit, LambdaParam, LetBinding, UnaryOp};
use amaro_ast::token::{Token, TokenKind};
use amaro_ast::{NodeId, Span};

/// Maximum nesting of expressions and types before a fragment is rejected.
pub const MAX_DEPTH: usize = 100;

/// The parser for routing-description source.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Collected errors during parsing
    errors: Vec<ParseError>,
    /// Current expression/type nesting
    depth: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(Token { kind: TokenKind::Eof, span: Span::new(end, end) });
        }
        Self { tokens, pos: 0, errors: Vec::new(), depth: 0 }
    }

    fn record_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Skip to the next block header or top-level embedded block.
    fn synchronize(&mut self) {
        while !self.at_end() {
            if self.at_block_header() || self.check(&TokenKind::Foreign) {
                return;
            }
            self.advance();
        }
    }

    /// Skip to the next field boundary inside a block.
    ///
    /// Stops on a separator at nesting depth zero that is followed by the start
    /// of another item, on a newline followed by a block header (at any depth),
    /// or on the closing `]` of a bracket block.
    fn synchronize_item(&mut self, in_brackets: bool) {
        let mut depth = 0usize;

        while !self.at_end() {
            match self.current_kind() {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBrace => depth = depth.saturating_sub(1),
                TokenKind::RBracket => {
                    if depth == 0 && in_brackets {
                        return;
                    }
                    depth = depth.saturating_sub(1);
                }
                TokenKind::Newline if self.newline_precedes_header() => return,
                TokenKind::Newline | TokenKind::Comma | TokenKind::Semi if depth == 0 => {
                    if self.separator_ends_item(in_brackets) {
                        return;
                    }
                }
                TokenKind::Foreign if depth == 0 => return,
                _ => {}
            }
            self.advance();
        }
    }

    fn separator_ends_item(&self, in_brackets: bool) -> bool {
        let mut offset = 1;
        while Self::is_separator(self.peek(offset)) {
            offset += 1;
        }
        self.is_item_start_at(offset)
            || matches!(self.peek(offset), TokenKind::Eof)
            || (in_brackets && matches!(self.peek(offset), TokenKind::RBracket))
    }

    fn newline_precedes_header(&self) -> bool {
        let mut offset = 1;
        while matches!(self.peek(offset), TokenKind::Newline) {
            offset += 1;
        }
        matches!(self.peek(offset), TokenKind::Ident(_))
            && matches!(self.peek(offset + 1), TokenKind::Colon | TokenKind::LBracket)
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    fn current(&self) -> &Token {
        // `new` guarantees a trailing Eof, so the stream is never empty.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek(&self, n: usize) -> &TokenKind {
        self.tokens.get(self.pos + n).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Consume the current token and return its span.
    fn advance(&mut self) -> Span {
        let span = self.current().span;
        if !self.at_end() {
            self.pos += 1;
        }
        span
    }

    /// End offset of the last consumed token.
    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Span, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.display_name()))
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match self.current_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let span = self.advance();
                Ok((name, span))
            }
            _ => Err(self.unexpected("a name")),
        }
    }

    /// Build an error for the current token. Lexer error tokens keep their
    /// own message.
    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        match &token.kind {
            TokenKind::Error(message) => ParseError::invalid_token(message, token.span),
            found => ParseError::expected(expected, found, token.span),
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn skip_separators(&mut self) {
        while Self::is_separator(self.current_kind()) {
            self.advance();
        }
    }

    fn is_separator(kind: &TokenKind) -> bool {
        matches!(kind, TokenKind::Newline | TokenKind::Comma | TokenKind::Semi)
    }

    fn peek_past_newlines(&self) -> &TokenKind {
        self.peek(self.newlines_ahead())
    }

    /// Skip newlines only when the next real token is `kind`.
    fn skip_newlines_before(&mut self, kind: &TokenKind) {
        if std::mem::discriminant(self.peek_past_newlines()) == std::mem::discriminant(kind) {
            self.skip_newlines();
        }
    }

    /// Skip newlines after a field's `=`, unless the next line starts a new
    /// item. That keeps `x =` followed by `y = 1` from swallowing `y`.
    fn skip_newlines_into_value(&mut self) {
        let offset = self.newlines_ahead();
        if offset > 0
            && !self.is_item_start_at(offset)
            && !matches!(self.peek(offset), TokenKind::Eof | TokenKind::RBracket)
        {
            self.pos += offset;
        }
    }

    /// Skip newlines after a keyword or operator that needs an operand.
    /// Only a line that cannot begin an expression (`name =`, `Name:`, an
    /// embedded block) stops the skip.
    fn skip_newlines_into_operand(&mut self) {
        let offset = self.newlines_ahead();
        let blocked = match self.peek(offset) {
            TokenKind::Ident(_) => matches!(self.peek(offset + 1), TokenKind::Eq | TokenKind::Colon),
            TokenKind::Foreign | TokenKind::Eof | TokenKind::RBracket => true,
            _ => false,
        };
        if offset > 0 && !blocked {
            self.pos += offset;
        }
    }

    fn newlines_ahead(&self) -> usize {
        let mut offset = 0;
        while matches!(self.peek(offset), TokenKind::Newline) {
            offset += 1;
        }
        offset
    }

    fn at_block_header(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Ident(_))
            && matches!(self.peek(1), TokenKind::Colon | TokenKind::LBracket)
    }

    /// True if the token at `offset` begins a field, struct definition, block
    /// header, or embedded block.
    ///
    /// `Name{` and `name[` are ambiguous: `Name{a = 1}` is a struct literal and
    /// `v[0]` an index, while `Name{a : T}` and `Name[a = 1]` are items.
    fn is_item_start_at(&self, offset: usize) -> bool {
        match self.peek(offset) {
            TokenKind::Ident(_) => match self.peek(offset + 1) {
                TokenKind::Eq | TokenKind::Colon => true,
                TokenKind::LBrace => !self.assigns_at(offset + 2),
                TokenKind::LBracket => {
                    self.assigns_at(offset + 2)
                        || matches!(self.peek(offset + 2), TokenKind::RBracket | TokenKind::Foreign)
                }
                _ => false,
            },
            TokenKind::Foreign => true,
            _ => false,
        }
    }

    /// `name =` at `offset`, skipping newlines before the name.
    fn assigns_at(&self, mut offset: usize) -> bool {
        while matches!(self.peek(offset), TokenKind::Newline) {
            offset += 1;
        }
        matches!(self.peek(offset), TokenKind::Ident(_)) && matches!(self.peek(offset + 1), TokenKind::Eq)
    }

    fn starts_expr(kind: &TokenKind) -> bool {
        matches!(
            kind,
            TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::String(_)
                | TokenKind::Bool(_)
                | TokenKind::Ident(_)
                | TokenKind::None
                | TokenKind::Not
                | TokenKind::Minus
                | TokenKind::Bang
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Pipe
                | TokenKind::PipePipe
                | TokenKind::Let
                | TokenKind::If
        )
    }

    fn enter_nesting(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::nesting_too_deep(self.current().span));
        }
        self.depth += 1;
        Ok(())
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// Parse the whole token stream. Never fails: errors are collected and
    /// parsing resumes at the next field or block.
    pub fn parse(&mut self) -> ParseResult {
        let mut items = Vec::new();

        loop {
            self.skip_separators();
            if self.at_end() {
                break;
            }

            if self.check(&TokenKind::Foreign) {
                items.push(Item::Foreign(self.parse_foreign()));
            } else if self.at_block_header() {
                match self.parse_block() {
                    Ok(block) => items.push(Item::Block(block)),
                    Err(e) => {
                        self.record_error(e);
                        self.synchronize();
                    }
                }
            } else {
                let error = self.unexpected("block");
                self.record_error(error);
                self.advance();
                self.synchronize();
            }
        }

        let end = self.current().span.end;
        ParseResult {
            file: File { id: NodeId::fresh(), items, span: Span::new(0, end) },
            errors: std::mem::take(&mut self.errors),
        }
    }

    fn parse_foreign(&mut self) -> ForeignBlock {
        let span = self.advance();
        ForeignBlock { id: NodeId::fresh(), span }
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let (name, name_span) = self.expect_ident()?;

        let (style, open_span) = if self.check(&TokenKind::Colon) {
            (BlockStyle::Colon, self.advance())
        } else {
            (BlockStyle::Bracket, self.expect(&TokenKind::LBracket)?)
        };

        let items = self.parse_block_items(style == BlockStyle::Bracket);

        if style == BlockStyle::Bracket && !self.match_token(&TokenKind::RBracket) {
            let mut error = ParseError::expected("']'", self.current_kind(), open_span);
            error.message = format!("Unclosed '[' for block '{}' - missing ']'", name);
            self.record_error(error);
        }

        let end = self.prev_end().max(open_span.end);
        Ok(Block {
            id: NodeId::fresh(),
            name,
            name_span,
            style,
            items,
            span: Span::new(name_span.start, end),
        })
    }

    fn parse_block_items(&mut self, in_brackets: bool) -> Vec<BlockItem> {
        let mut items = Vec::new();

        loop {
            self.skip_separators();
            if self.at_end() || self.at_block_header() {
                break;
            }
            if in_brackets && self.check(&TokenKind::RBracket) {
                break;
            }

            let is_ident = matches!(self.current_kind(), TokenKind::Ident(_));
            if self.check(&TokenKind::Foreign) {
                items.push(BlockItem::Foreign(self.parse_foreign()));
            } else if is_ident && matches!(self.peek(1), TokenKind::LBrace) {
                match self.parse_struct_def() {
                    Ok(def) => items.push(BlockItem::Struct(def)),
                    Err(e) => {
                        self.record_error(e);
                        self.synchronize_item(in_brackets);
                    }
                }
            } else if is_ident && matches!(self.peek(1), TokenKind::Eq) {
                match self.parse_field(in_brackets) {
                    Ok(field) => items.push(BlockItem::Field(field)),
                    Err(e) => {
                        self.record_error(e);
                        self.synchronize_item(in_brackets);
                    }
                }
            } else {
                let error = self.unexpected("field or struct definition");
                self.record_error(error);
                self.advance();
                self.synchronize_item(in_brackets);
            }
        }

        items
    }

    /// `name = value`. A broken value is replaced by an error placeholder so
    /// the field itself survives.
    fn parse_field(&mut self, in_brackets: bool) -> Result<Field, ParseError> {
        let (name, name_span) = self.expect_ident()?;
        self.expect(&TokenKind::Eq)?;
        self.skip_newlines_into_value();

        let value_start = self.current().span.start;
        let value = match self.parse_field_value() {
            Ok(value) => {
                if !self.at_field_end(in_brackets) {
                    let error = self.unexpected("end of field");
                    self.record_error(error);
                    self.synchronize_item(in_brackets);
                }
                value
            }
            Err(e) => {
                self.record_error(e);
                self.synchronize_item(in_brackets);
                Expr::error(Span::new(value_start, self.prev_end().max(value_start)))
            }
        };

        let end = value.span.end.max(name_span.end);
        Ok(Field { id: NodeId::fresh(), name, name_span, value, span: Span::new(name_span.start, end) })
    }

    /// A field value, where a bare comma list (`CX, T`) means a vector.
    fn parse_field_value(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_expr()?;
        if !self.bare_list_continues() {
            return Ok(first);
        }

        let start = first.span.start;
        let mut elements = vec![first];
        while self.bare_list_continues() {
            self.advance();
            elements.push(self.parse_expr()?);
        }
        let end = elements.last().map(|e| e.span.end).unwrap_or(start);
        Ok(Expr::new(ExprKind::Vec(elements), Span::new(start, end)))
    }

    fn bare_list_continues(&self) -> bool {
        self.check(&TokenKind::Comma) && Self::starts_expr(self.peek(1)) && !self.is_item_start_at(1)
    }

    fn at_field_end(&self, in_brackets: bool) -> bool {
        match self.current_kind() {
            TokenKind::Newline
            | TokenKind::Comma
            | TokenKind::Semi
            | TokenKind::Eof
            | TokenKind::Foreign => true,
            TokenKind::RBracket => in_brackets,
            _ => false,
        }
    }

    /// `Name{field : Type, ...}`
    fn parse_struct_def(&mut self) -> Result<StructDef, ParseError> {
        let (name, name_span) = self.expect_ident()?;
        self.expect(&TokenKind::LBrace)?;
        self.skip_newlines();

        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let (field_name, field_span) = self.expect_ident()?;
            self.skip_newlines();
            self.expect(&TokenKind::Colon)?;
            self.skip_newlines();
            let ty = self.parse_type()?;
            fields.push(StructField { id: NodeId::fresh(), name: field_name, name_span: field_span, ty });

            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(StructDef {
            id: NodeId::fresh(),
            name,
            name_span,
            fields,
            span: Span::new(name_span.start, self.prev_end()),
        })
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        self.enter_nesting()?;
        let result = self.parse_type_inner();
        self.depth -= 1;
        result
    }

    fn parse_type_inner(&mut self) -> Result<TypeExpr, ParseError> {
        let start = self.current().span.start;

        let kind = match self.current_kind().clone() {
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines();
                let mut elements = Vec::new();
                let mut trailing_comma = false;
                while !self.check(&TokenKind::RParen) && !self.at_end() {
                    elements.push(self.parse_type()?);
                    self.skip_newlines();
                    trailing_comma = self.match_token(&TokenKind::Comma);
                    if !trailing_comma {
                        break;
                    }
                    self.skip_newlines();
                }
                self.expect(&TokenKind::RParen)?;

                // `(T)` is just `T`
                if elements.len() == 1 && !trailing_comma {
                    if let Some(only) = elements.pop() {
                        return Ok(only);
                    }
                }
                TypeExprKind::Tuple(elements)
            }
            TokenKind::Ident(name) => {
                self.advance();
                let mut args = Vec::new();
                if self.match_token(&TokenKind::Lt) {
                    loop {
                        args.push(self.parse_type()?);
                        if !self.match_token(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::Gt)?;
                } else if self.check(&TokenKind::LParen) && matches!(self.peek(1), TokenKind::RParen) {
                    // `Vec()`: element type left open
                    self.advance();
                    self.advance();
                }
                TypeExprKind::Named { name, args }
            }
            _ => return Err(self.unexpected("type")),
        };

        Ok(TypeExpr { id: NodeId::fresh(), kind, span: Span::new(start, self.prev_end()) })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let saved = self.depth;
        self.enter_nesting()?;
        let result = self.parse_expr_bp_inner(min_bp);
        // Also releases the levels taken by chained operators.
        self.depth = saved;
        result
    }

    fn parse_expr_bp_inner(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        let mut lhs = self.parse_prefix()?;

        loop {
            if self.check(&TokenKind::Newline) && self.peek_past_newlines().continues_expr() {
                self.skip_newlines();
            }

            if let Some(bp) = self.postfix_bp() {
                if bp < min_bp {
                    break;
                }
                // Each chained operator nests `lhs` one level deeper.
                self.enter_nesting()?;
                lhs = self.parse_postfix(lhs)?;
                continue;
            }

            if let Some((l_bp, r_bp)) = self.infix_bp() {
                if l_bp < min_bp {
                    break;
                }
                self.enter_nesting()?;

                if self.match_token(&TokenKind::DotDot) {
                    self.skip_newlines_into_operand();
                    let end_expr = self.parse_expr_bp(r_bp)?;
                    let end = end_expr.span.end;
                    lhs = Expr::new(
                        ExprKind::Range { start: Box::new(lhs), end: Box::new(end_expr) },
                        Span::new(start, end),
                    );
                    continue;
                }

                let op = self.parse_binop()?;
                self.skip_newlines_into_operand();
                let rhs = self.parse_expr_bp(r_bp)?;
                let end = rhs.span.end;
                lhs = Expr::new(
                    ExprKind::Binary { op, left: Box::new(lhs), right: Box::new(rhs) },
                    Span::new(start, end),
                );
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;

        match self.current_kind().clone() {
            TokenKind::Int(n) => {
                let span = self.advance();
                Ok(Expr::new(ExprKind::Int(n), span))
            }
            TokenKind::Float(n) => {
                let span = self.advance();
                Ok(Expr::new(ExprKind::Float(n), span))
            }
            TokenKind::String(s) => {
                let span = self.advance();
                Ok(Expr::new(ExprKind::String(s), span))
            }
            TokenKind::Bool(b) => {
                let span = self.advance();
                Ok(Expr::new(ExprKind::Bool(b), span))
            }
            TokenKind::None => {
                let span = self.advance();
                Ok(Expr::new(ExprKind::None, span))
            }
            TokenKind::Ident(name) => {
                let name_span = self.advance();

                if name == "Some" && self.match_token(&TokenKind::LParen) {
                    self.skip_newlines();
                    let inner = self.parse_expr()?;
                    self.skip_newlines();
                    self.expect(&TokenKind::RParen)?;
                    return Ok(Expr::new(
                        ExprKind::Some(Box::new(inner)),
                        Span::new(start, self.prev_end()),
                    ));
                }

                if self.check(&TokenKind::LBrace) {
                    return self.parse_struct_literal(name, name_span);
                }

                Ok(Expr::new(ExprKind::Ident(name), name_span))
            }
            TokenKind::LParen => self.parse_paren_or_tuple(),
            TokenKind::LBracket => {
                self.advance();
                let elements = self.parse_delimited(&TokenKind::RBracket)?;
                Ok(Expr::new(ExprKind::Vec(elements), Span::new(start, self.prev_end())))
            }
            TokenKind::Pipe | TokenKind::PipePipe => self.parse_lambda(),
            TokenKind::Let => self.parse_let(),
            TokenKind::If => self.parse_if(),
            TokenKind::Minus | TokenKind::Bang | TokenKind::Not => {
                let op = if self.check(&TokenKind::Minus) { UnaryOp::Neg } else { UnaryOp::Not };
                self.advance();
                let operand = self.parse_expr_bp(Self::PREFIX_BP)?;
                let end = operand.span.end;
                Ok(Expr::new(
                    ExprKind::Unary { op, operand: Box::new(operand) },
                    Span::new(start, end),
                ))
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `Name{field = value, ...}`. Either `=` or `:` separates name and value.
    fn parse_struct_literal(&mut self, name: String, name_span: Span) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LBrace)?;
        self.skip_newlines();

        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_end() {
            let (field_name, field_span) = self.expect_ident()?;
            self.skip_newlines();
            if !self.match_token(&TokenKind::Eq) && !self.match_token(&TokenKind::Colon) {
                return Err(self.unexpected("'='"));
            }
            self.skip_newlines();
            let value = self.parse_expr()?;
            fields.push(FieldInit { name: field_name, name_span: field_span, value });

            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(Expr::new(
            ExprKind::StructLit { name, name_span, fields },
            Span::new(name_span.start, self.prev_end()),
        ))
    }

    fn parse_paren_or_tuple(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::LParen)?;
        self.skip_newlines();

        if self.match_token(&TokenKind::RParen) {
            return Ok(Expr::new(ExprKind::Tuple(Vec::new()), Span::new(start, self.prev_end())));
        }

        let first = self.parse_expr()?;
        self.skip_newlines();

        if self.match_token(&TokenKind::Comma) {
            let mut elements = vec![first];
            elements.extend(self.parse_delimited(&TokenKind::RParen)?);
            Ok(Expr::new(ExprKind::Tuple(elements), Span::new(start, self.prev_end())))
        } else {
            self.expect(&TokenKind::RParen)?;
            Ok(first)
        }
    }

    /// Comma-separated expressions up to and including `close`. Newlines are
    /// insignificant inside delimiters.
    fn parse_delimited(&mut self, close: &TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut elements = Vec::new();
        self.skip_newlines();
        while !self.check(close) && !self.at_end() {
            elements.push(self.parse_expr()?);
            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            self.skip_newlines();
        }
        self.expect(close)?;
        Ok(elements)
    }

    /// `|x, y| -> body` or `|| -> body`
    fn parse_lambda(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        let mut params = Vec::new();

        if !self.match_token(&TokenKind::PipePipe) {
            self.expect(&TokenKind::Pipe)?;
            while !self.check(&TokenKind::Pipe) && !self.at_end() {
                let (name, span) = self.expect_ident()?;
                params.push(LambdaParam { id: NodeId::fresh(), name, span });
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::Pipe)?;
        }

        self.skip_newlines_before(&TokenKind::Arrow);
        self.expect(&TokenKind::Arrow)?;
        self.skip_newlines_into_operand();
        let body = self.parse_expr()?;
        let end = body.span.end;

        Ok(Expr::new(ExprKind::Lambda { params, body: Box::new(body) }, Span::new(start, end)))
    }

    /// `let a = e1 in let b = e2 in body`. Consecutive bindings are
    /// flattened into one node.
    fn parse_let(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        let mut bindings = Vec::new();

        while self.match_token(&TokenKind::Let) {
            self.skip_newlines();
            let (name, name_span) = self.expect_ident()?;
            self.skip_newlines_before(&TokenKind::Eq);
            self.expect(&TokenKind::Eq)?;
            self.skip_newlines_into_operand();
            let value = self.parse_expr()?;
            self.skip_newlines_before(&TokenKind::In);
            self.expect(&TokenKind::In)?;
            self.skip_newlines_into_operand();
            bindings.push(LetBinding { id: NodeId::fresh(), name, name_span, value });
        }

        let body = self.parse_expr()?;
        let end = body.span.end;
        Ok(Expr::new(ExprKind::Let { bindings, body: Box::new(body) }, Span::new(start, end)))
    }

    /// `if c then a else b`. Branches may start on the following line.
    fn parse_if(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().span.start;
        self.expect(&TokenKind::If)?;
        self.skip_newlines_into_operand();
        let cond = self.parse_expr()?;

        self.skip_newlines_before(&TokenKind::Then);
        self.expect(&TokenKind::Then)?;
        self.skip_newlines_into_operand();
        let then_branch = self.parse_expr()?;

        self.skip_newlines_before(&TokenKind::Else);
        self.expect(&TokenKind::Else)?;
        self.skip_newlines_into_operand();
        let else_branch = self.parse_expr()?;
        let end = else_branch.span.end;

        Ok(Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            Span::new(start, end),
        ))
    }

    fn parse_postfix(&mut self, lhs: Expr) -> Result<Expr, ParseError> {
        let start = lhs.span.start;

        match self.current_kind() {
            TokenKind::LParen => {
                self.advance();
                let args = self.parse_delimited(&TokenKind::RParen)?;
                Ok(Expr::new(
                    ExprKind::Call { func: Box::new(lhs), args },
                    Span::new(start, self.prev_end()),
                ))
            }
            TokenKind::LBracket => {
                self.advance();
                self.skip_newlines();
                let index = self.parse_expr()?;
                self.skip_newlines();
                self.expect(&TokenKind::RBracket)?;
                Ok(Expr::new(
                    ExprKind::Index { object: Box::new(lhs), index: Box::new(index) },
                    Span::new(start, self.prev_end()),
                ))
            }
            TokenKind::Dot => {
                self.advance();
                self.parse_member(lhs)
            }
            _ => Err(self.unexpected("'(', '[' or '.'")),
        }
    }

    /// What follows a `.`: a field name, a tuple index (`.0` or `.(0)`), or a
    /// parenthesized projection path.
    fn parse_member(&mut self, object: Expr) -> Result<Expr, ParseError> {
        let start = object.span.start;

        match self.current_kind().clone() {
            TokenKind::Ident(field) => {
                let field_span = self.advance();
                Ok(Expr::new(
                    ExprKind::Field { object: Box::new(object), field, field_span },
                    Span::new(start, field_span.end),
                ))
            }
            TokenKind::Int(n) => {
                let span = self.advance();
                let index = tuple_index(n, span)?;
                Ok(Expr::new(
                    ExprKind::TupleIndex { object: Box::new(object), index },
                    Span::new(start, span.end),
                ))
            }
            TokenKind::LParen => {
                let literal_index = match (self.peek(1), self.peek(2)) {
                    (TokenKind::Int(n), TokenKind::RParen) => Some(*n),
                    _ => None,
                };

                self.advance();
                if let Some(n) = literal_index {
                    let span = self.advance();
                    self.advance();
                    let index = tuple_index(n, span)?;
                    return Ok(Expr::new(
                        ExprKind::TupleIndex { object: Box::new(object), index },
                        Span::new(start, self.prev_end()),
                    ));
                }

                self.skip_newlines();
                let path = self.parse_expr()?;
                self.skip_newlines();
                self.expect(&TokenKind::RParen)?;
                Ok(Expr::new(
                    ExprKind::Projection { object: Box::new(object), path: Box::new(path) },
                    Span::new(start, self.prev_end()),
                ))
            }
            _ => Err(self.unexpected("field name after '.'")),
        }
    }

    // =========================================================================
    // Operator Precedence
    // =========================================================================

    const PREFIX_BP: u8 = 15;

    fn postfix_bp(&self) -> Option<u8> {
        match self.current_kind() {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot => Some(17),
            _ => None,
        }
    }

    fn infix_bp(&self) -> Option<(u8, u8)> {
        match self.current_kind() {
            TokenKind::PipePipe => Some((1, 2)),
            TokenKind::AmpAmp => Some((3, 4)),
            TokenKind::EqEq | TokenKind::BangEq => Some((5, 6)),
            TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => Some((7, 8)),
            TokenKind::DotDot => Some((9, 10)),
            TokenKind::Plus | TokenKind::Minus => Some((11, 12)),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some((13, 14)),
            _ => None,
        }
    }

    fn parse_binop(&mut self) -> Result<BinOp, ParseError> {
        let op = match self.current_kind() {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::BangEq => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::LtEq => BinOp::Le,
            TokenKind::GtEq => BinOp::Ge,
            TokenKind::AmpAmp => BinOp::And,
            TokenKind::PipePipe => BinOp::Or,
            _ => return Err(self.unexpected("operator like '+' or '=='")),
        };
        self.advance();
        Ok(op)
    }
}

fn tuple_index(n: i64, span: Span) -> Result<u32, ParseError> {
    u32::try_from(n).map_err(|_| ParseError::syntax(format!("Tuple index {} is out of range", n), span))
}

/// Result of parsing: the file tree plus any errors found.
#[derive(Debug)]
pub struct ParseResult {
    pub file: File,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Returns true if parsing completed without errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// What went wrong, for mapping onto diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Unexpected or missing token
    Syntax,
    /// Text the lexer could not turn into a token
    InvalidToken,
    /// Expression or type nested past [`MAX_DEPTH`]
    NestingTooDeep,
}

/// A parser error with location and friendly message.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
    pub kind: ParseErrorKind,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    fn expected(expected: &str, found: &TokenKind, span: Span) -> Self {
        let message = format_expected_message(expected, found);
        let hint = crate::hints::for_expected(expected, found).map(String::from);
        Self { span, message, hint, kind: ParseErrorKind::Syntax }
    }

    fn syntax(message: String, span: Span) -> Self {
        Self { span, message, hint: None, kind: ParseErrorKind::Syntax }
    }

    fn invalid_token(message: &str, span: Span) -> Self {
        Self { span, message: message.to_string(), hint: None, kind: ParseErrorKind::InvalidToken }
    }

    fn nesting_too_deep(span: Span) -> Self {
        Self {
            span,
            message: format!("Value is nested too deeply (more than {} levels)", MAX_DEPTH),
            hint: Some("split the value into smaller 'let' bindings".to_string()),
            kind: ParseErrorKind::NestingTooDeep,
        }
    }
}

/// Format a user-friendly "expected X, found Y" message.
fn format_expected_message(expected: &str, found: &TokenKind) -> String {
    match expected {
        "'{'" => format!("Expected '{{', found {}", found.display_name()),
        "'}'" => {
            if matches!(found, TokenKind::Eof) {
                "Unclosed '{' - missing '}'".to_string()
            } else {
                format!("Expected '}}', found {}", found.display_name())
            }
        }
        "')'" => {
            if matches!(found, TokenKind::Eof) {
                "Unclosed '(' - missing ')'".to_string()
            } else {
                format!("Expected ')', found {}", found.display_name())
            }
        }
        "']'" => {
            if matches!(found, TokenKind::Eof) {
                "Unclosed '[' - missing ']'".to_string()
            } else {
                format!("Expected ']', found {}", found.display_name())
            }
        }
        "a name" => format!("Expected name, found {}", found.display_name()),
        "block" => format!("Expected block header, found {}", found.display_name()),
        "end of field" => format!("Unexpected {} after field value", found.display_name()),
        _ => format!("Expected {}, found {}", expected, found.display_name()),
    }
}
