// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Token cursor, expression parser and line splitter.
//!
//! Expressions are parsed by precedence climbing straight into
//! [`Expr`] trees. Leaves that are already known (numbers, symbols defined
//! with a constant value, the PC of a placed section) fold while the tree is
//! built, so most operands come out as a single constant.
//!
//! # Precedence (lowest first)
//!
//! | Operators | |
//! |-----------|---|
//! | `\|\|` | logical or |
//! | `&&` | logical and |
//! | `\|` `^` `&` | bitwise |
//! | `== != < <= > >=` | comparison |
//! | `<< >>` | shifts |
//! | `+ -` | additive |
//! | `* / %` | multiplicative |
//! | `- ~ ! + < >` | unary (`<`/`>` select low/high byte) |

use thiserror::Error;

use crate::core::expr::{BinaryOp, EvalError, Expr, SymbolLookup, UnaryOp};
use crate::core::tokenizer::{OperatorKind, Span, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    fn from_eval(err: EvalError, span: Span) -> Self {
        Self::new(err.to_string(), span)
    }
}

/// Cursor over a token slice with bounded backtracking.
///
/// Reading past the slice yields a synthetic [`TokenKind::End`].
pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    end: Token,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let end_span = tokens
            .last()
            .map(|t| Span {
                line: t.span.line,
                col_start: t.span.col_end,
                col_end: t.span.col_end,
            })
            .unwrap_or_default();
        Self {
            tokens,
            pos: 0,
            end: Token {
                kind: TokenKind::End,
                span: end_span,
            },
        }
    }

    pub fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    pub fn peek_at(&self, n: usize) -> &Token {
        self.tokens.get(self.pos + n).unwrap_or(&self.end)
    }

    pub fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub fn advance(&mut self) -> &Token {
        let idx = self.pos;
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        self.tokens.get(idx).unwrap_or(&self.end)
    }

    pub fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::End)
    }

    pub fn mark(&self) -> usize {
        self.pos
    }

    pub fn reset(&mut self, mark: usize) {
        self.pos = mark.min(self.tokens.len());
    }

    pub fn span(&self) -> Span {
        self.peek().span
    }

    pub fn prev_span(&self) -> Span {
        match self.pos {
            0 => self.span(),
            n => self.tokens[n - 1].span,
        }
    }

    /// Consume the next token if it has the given kind.
    pub fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn consume_operator(&mut self, op: OperatorKind) -> bool {
        self.consume(&TokenKind::Operator(op))
    }

    pub fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Span, ParseError> {
        if self.peek_kind() == kind {
            Ok(self.advance().span)
        } else {
            Err(ParseError::new(format!("Expected {what}"), self.span()))
        }
    }

    pub fn expect_end(&self) -> Result<(), ParseError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(ParseError::new(
                format!("Unexpected '{}'", self.peek()),
                self.span(),
            ))
        }
    }

    /// Identifier or register text at the cursor, uppercased.
    pub fn peek_word(&self) -> Option<String> {
        match self.peek_kind() {
            TokenKind::Identifier(name) | TokenKind::Register(name) => {
                Some(name.to_ascii_uppercase())
            }
            _ => None,
        }
    }

    pub fn remaining(&self) -> &'a [Token] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }
}

/// What the expression parser needs from the assembler.
pub struct ExprEnv<'a> {
    pub lookup: &'a dyn SymbolLookup,
    /// Value of `*` / `$`.
    pub pc: Expr,
}

/// Parse a full expression.
pub fn parse_expr(cursor: &mut TokenCursor<'_>, env: &ExprEnv<'_>) -> Result<Expr, ParseError> {
    parse_binary(cursor, env, 0)
}

/// Parse a token slice that must contain exactly one expression.
pub fn parse_expr_tokens(tokens: &[Token], env: &ExprEnv<'_>) -> Result<Expr, ParseError> {
    let mut cursor = TokenCursor::new(tokens);
    if cursor.at_end() {
        return Err(ParseError::new("Missing expression", cursor.span()));
    }
    let expr = parse_expr(&mut cursor, env)?;
    cursor.expect_end()?;
    Ok(expr)
}

const LEVELS: usize = 9;

fn binary_op_at(level: usize, kind: &TokenKind) -> Option<BinaryOp> {
    let TokenKind::Operator(op) = kind else {
        return None;
    };
    let op = match (level, op) {
        (0, OperatorKind::LogicOr) => BinaryOp::LogicOr,
        (1, OperatorKind::LogicAnd) => BinaryOp::LogicAnd,
        (2, OperatorKind::BitOr) => BinaryOp::Or,
        (3, OperatorKind::BitXor) => BinaryOp::Xor,
        (4, OperatorKind::BitAnd) => BinaryOp::And,
        (5, OperatorKind::Eq) => BinaryOp::Eq,
        (5, OperatorKind::Ne) => BinaryOp::Ne,
        (5, OperatorKind::Lt) => BinaryOp::Lt,
        (5, OperatorKind::Le) => BinaryOp::Le,
        (5, OperatorKind::Gt) => BinaryOp::Gt,
        (5, OperatorKind::Ge) => BinaryOp::Ge,
        (6, OperatorKind::Shl) => BinaryOp::Shl,
        (6, OperatorKind::Shr) => BinaryOp::Shr,
        (7, OperatorKind::Plus) => BinaryOp::Add,
        (7, OperatorKind::Minus) => BinaryOp::Sub,
        (8, OperatorKind::Multiply) => BinaryOp::Mul,
        (8, OperatorKind::Divide) => BinaryOp::Div,
        (8, OperatorKind::Mod) => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

fn parse_binary(
    cursor: &mut TokenCursor<'_>,
    env: &ExprEnv<'_>,
    level: usize,
) -> Result<Expr, ParseError> {
    if level == LEVELS {
        return parse_unary(cursor, env);
    }
    let mut left = parse_binary(cursor, env, level + 1)?;
    while let Some(op) = binary_op_at(level, cursor.peek_kind()) {
        let op_span = cursor.advance().span;
        let right = parse_binary(cursor, env, level + 1)?;
        let span = join(left.span, right.span);
        left = Expr::binary(op, left, right, span).map_err(|e| ParseError::from_eval(e, op_span))?;
    }
    Ok(left)
}

fn parse_unary(cursor: &mut TokenCursor<'_>, env: &ExprEnv<'_>) -> Result<Expr, ParseError> {
    let op = match cursor.peek_kind() {
        TokenKind::Operator(OperatorKind::Minus) => Some(UnaryOp::Negate),
        TokenKind::Operator(OperatorKind::BitNot) => Some(UnaryOp::BitNot),
        TokenKind::Operator(OperatorKind::LogicNot) => Some(UnaryOp::LogicNot),
        TokenKind::Operator(OperatorKind::Lt) => Some(UnaryOp::Low),
        TokenKind::Operator(OperatorKind::Gt) => Some(UnaryOp::High),
        TokenKind::Operator(OperatorKind::Plus) => {
            cursor.advance();
            return parse_unary(cursor, env);
        }
        _ => None,
    };
    match op {
        Some(op) => {
            let op_span = cursor.advance().span;
            let inner = parse_unary(cursor, env)?;
            let span = join(op_span, inner.span);
            Expr::unary(op, inner, span).map_err(|e| ParseError::from_eval(e, op_span))
        }
        None => parse_primary(cursor, env),
    }
}

fn parse_primary(cursor: &mut TokenCursor<'_>, env: &ExprEnv<'_>) -> Result<Expr, ParseError> {
    let token = cursor.advance().clone();
    let span = token.span;
    match token.kind {
        TokenKind::Number(num) => Ok(Expr::constant(num.value as i32, span)),
        TokenKind::String(lit) => {
            if lit.bytes.is_empty() || lit.bytes.len() > 4 {
                return Err(ParseError::new(
                    "Character constant must be 1 to 4 characters",
                    span,
                ));
            }
            let value = lit
                .bytes
                .iter()
                .fold(0u32, |acc, b| (acc << 8) | *b as u32);
            Ok(Expr::constant(value as i32, span))
        }
        TokenKind::Operator(OperatorKind::Multiply) | TokenKind::Dollar => {
            let mut pc = env.pc.clone();
            pc.span = span;
            Ok(pc)
        }
        TokenKind::Operator(OperatorKind::Mod) => {
            // RISC-V style %hi(x) / %lo(x)
            let name = cursor.peek_word();
            match name.as_deref() {
                Some("HI") | Some("LO") => {
                    cursor.advance();
                    let arg = parse_call_argument(cursor, env)?;
                    if name.as_deref() == Some("HI") {
                        riscv_hi(arg, span)
                    } else {
                        riscv_lo(arg, span)
                    }
                }
                _ => Err(ParseError::new("Expected expression", span)),
            }
        }
        TokenKind::OpenParen => {
            let inner = parse_expr(cursor, env)?;
            cursor.expect(&TokenKind::CloseParen, "')'")?;
            Ok(inner)
        }
        TokenKind::Identifier(name) => {
            if matches!(cursor.peek_kind(), TokenKind::OpenParen) {
                let func = match name.to_ascii_uppercase().as_str() {
                    "LO" | "LOW" => Some(UnaryOp::Low),
                    "HI" | "HIGH" => Some(UnaryOp::High),
                    "BITNUM" => Some(UnaryOp::BitIndex),
                    _ => None,
                };
                if let Some(op) = func {
                    let arg = parse_call_argument(cursor, env)?;
                    return Expr::unary(op, arg, span).map_err(|e| ParseError::from_eval(e, span));
                }
            }
            match env.lookup.symbol_value(&name) {
                Some(value) => Ok(Expr::constant(value, span)),
                None => Ok(Expr::symbol(name, span)),
            }
        }
        TokenKind::Register(name) => Err(ParseError::new(
            format!("Register {name} cannot be used as a value"),
            span,
        )),
        TokenKind::End => Err(ParseError::new("Missing expression", span)),
        _ => Err(ParseError::new(
            format!("Unexpected '{}' in expression", token),
            span,
        )),
    }
}

fn parse_call_argument(
    cursor: &mut TokenCursor<'_>,
    env: &ExprEnv<'_>,
) -> Result<Expr, ParseError> {
    cursor.expect(&TokenKind::OpenParen, "'('")?;
    let arg = parse_expr(cursor, env)?;
    cursor.expect(&TokenKind::CloseParen, "')'")?;
    Ok(arg)
}

/// `(x + 0x800) >> 12`: upper 20 bits, rounded for a sign-extended low part.
fn riscv_hi(arg: Expr, span: Span) -> Result<Expr, ParseError> {
    let eval = |e| ParseError::from_eval(e, span);
    let rounded =
        Expr::binary(BinaryOp::Add, arg, Expr::constant(0x800, span), span).map_err(eval)?;
    let shifted =
        Expr::binary(BinaryOp::Shr, rounded, Expr::constant(12, span), span).map_err(eval)?;
    Expr::binary(BinaryOp::And, shifted, Expr::constant(0xfffff, span), span).map_err(eval)
}

/// `((x & 0xfff) ^ 0x800) - 0x800`: sign-extended low 12 bits.
fn riscv_lo(arg: Expr, span: Span) -> Result<Expr, ParseError> {
    let eval = |e| ParseError::from_eval(e, span);
    let low = Expr::binary(BinaryOp::And, arg, Expr::constant(0xfff, span), span).map_err(eval)?;
    let flipped =
        Expr::binary(BinaryOp::Xor, low, Expr::constant(0x800, span), span).map_err(eval)?;
    Expr::binary(BinaryOp::Sub, flipped, Expr::constant(0x800, span), span).map_err(eval)
}

fn join(a: Span, b: Span) -> Span {
    Span {
        line: a.line,
        col_start: a.col_start.min(b.col_start),
        col_end: a.col_end.max(b.col_end),
    }
}

/// Label, mnemonic and operand tokens of one source line.
#[derive(Debug, Clone)]
pub struct LineParts<'a> {
    pub label: Option<(String, Span)>,
    /// Uppercased mnemonic or directive name.
    pub mnemonic: Option<(String, Span)>,
    /// Uppercased size suffix after a `.`.
    pub size: Option<(String, Span)>,
    /// Operand tokens, without the trailing end marker.
    pub operands: &'a [Token],
}

/// Split a tokenized line into its parts.
///
/// A label is an identifier in column one (optional `:`), any identifier
/// directly followed by `:`, or the first identifier of a line whose next
/// word is `EQU`, `SET` or `=`.
pub fn split_line(tokens: &[Token]) -> Result<LineParts<'_>, ParseError> {
    let body = match tokens.last() {
        Some(t) if t.kind == TokenKind::End => &tokens[..tokens.len() - 1],
        _ => tokens,
    };
    let mut cursor = TokenCursor::new(body);
    let mut label = None;

    if let TokenKind::Identifier(name) = cursor.peek_kind().clone() {
        let span = cursor.span();
        let next = cursor.peek_at(1).kind.clone();
        let assignment = matches!(&next, TokenKind::Operator(OperatorKind::Eq))
            || matches!(&next, TokenKind::Identifier(word)
                if word.eq_ignore_ascii_case("EQU") || word.eq_ignore_ascii_case("SET"));
        if span.col_start == 1 || next == TokenKind::Colon || assignment {
            cursor.advance();
            cursor.consume(&TokenKind::Colon);
            label = Some((name, span));
        }
    }

    let mut mnemonic = None;
    let mut size = None;
    match cursor.peek_kind().clone() {
        TokenKind::Identifier(name) => {
            let span = cursor.advance().span;
            mnemonic = Some((name.to_ascii_uppercase(), span));
        }
        TokenKind::Operator(OperatorKind::Eq) => {
            let span = cursor.advance().span;
            mnemonic = Some(("=".to_string(), span));
        }
        TokenKind::Dot => {
            let dot = cursor.advance().span;
            match cursor.peek_kind().clone() {
                TokenKind::Identifier(name) => {
                    cursor.advance();
                    mnemonic = Some((format!(".{}", name.to_ascii_uppercase()), dot));
                }
                _ => return Err(ParseError::new("Expected directive after '.'", dot)),
            }
        }
        TokenKind::End => {}
        _ => {
            return Err(ParseError::new(
                format!("Unexpected '{}'", cursor.peek()),
                cursor.span(),
            ))
        }
    }

    if mnemonic.is_some() && *cursor.peek_kind() == TokenKind::Dot {
        let dot = cursor.span();
        if let TokenKind::Identifier(suffix) | TokenKind::Register(suffix) =
            cursor.peek_at(1).kind.clone()
        {
            if dot.col_start == cursor.prev_span().col_end {
                cursor.advance();
                let span = cursor.advance().span;
                size = Some((suffix.to_ascii_uppercase(), span));
            }
        }
    }

    Ok(LineParts {
        label,
        mnemonic,
        size,
        operands: cursor.remaining(),
    })
}

/// Split operand tokens on commas outside brackets.
pub fn split_operands(tokens: &[Token]) -> Vec<&[Token]> {
    let mut out = Vec::new();
    if tokens.is_empty() {
        return out;
    }
    let mut depth = 0i32;
    let mut start = 0usize;
    for (idx, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => depth -= 1,
            TokenKind::Comma if depth == 0 => {
                out.push(&tokens[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    out.push(&tokens[start..]);
    out
}

/// Span covering a whole token slice.
pub fn tokens_span(tokens: &[Token]) -> Span {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => join(first.span, last.span),
        _ => Span::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expr::{ExprKind, NoSymbols};
    use crate::core::tokenizer::{register_checker_from_fn, register_checker_none, tokenize_line};

    struct OneSymbol;

    impl SymbolLookup for OneSymbol {
        fn symbol_value(&self, name: &str) -> Option<i32> {
            (name == "known").then_some(0x40)
        }

        fn section_base(&self, _section: usize) -> Option<u32> {
            None
        }
    }

    fn eval(text: &str) -> Result<Expr, ParseError> {
        let tokens = tokenize_line(text, 1, register_checker_none()).unwrap();
        let env = ExprEnv {
            lookup: &OneSymbol,
            pc: Expr::constant(0x1000, Span::default()),
        };
        parse_expr_tokens(&tokens[..tokens.len() - 1], &env)
    }

    fn value(text: &str) -> i32 {
        eval(text).unwrap().value().expect("constant")
    }

    #[test]
    fn precedence_and_folding() {
        assert_eq!(value("1+2*3"), 7);
        assert_eq!(value("(1+2)*3"), 9);
        assert_eq!(value("1<<4|1"), 17);
        assert_eq!(value("10-4-3"), 3);
        assert_eq!(value("-1>>28"), 15);
        assert_eq!(value("7%4==3"), 1);
    }

    #[test]
    fn unary_and_functions() {
        assert_eq!(value("<$1234"), 0x34);
        assert_eq!(value(">$1234"), 0x12);
        assert_eq!(value("~0"), -1);
        assert_eq!(value("!5"), 0);
        assert_eq!(value("BITNUM(256)"), 8);
        assert_eq!(value("hi($ABCD)"), 0xab);
    }

    #[test]
    fn riscv_relocation_functions() {
        assert_eq!(value("%hi($12345FFF)"), 0x12346);
        assert_eq!(value("%lo($12345FFF)"), -1);
    }

    #[test]
    fn known_symbols_fold_and_unknown_stay_symbolic() {
        assert_eq!(value("known+1"), 0x41);
        let e = eval("later+1").unwrap();
        assert!(!e.constant);
        assert!(matches!(e.kind, ExprKind::Binary { .. }));
    }

    #[test]
    fn star_and_dollar_are_the_pc() {
        assert_eq!(value("*+2"), 0x1002);
        assert_eq!(value("$"), 0x1000);
        assert_eq!(value("2*3"), 6);
    }

    #[test]
    fn character_constants_pack_big_endian() {
        assert_eq!(value("'A'"), 0x41);
        assert_eq!(value("'AB'"), 0x4142);
    }

    #[test]
    fn reports_constant_division_by_zero() {
        let err = eval("later/0").unwrap_err();
        assert_eq!(err.message, "Division by zero");
    }

    #[test]
    fn rejects_trailing_tokens() {
        assert!(eval("1 2").is_err());
        assert!(eval("").is_err());
    }

    #[test]
    fn splits_labels_mnemonics_and_sizes() {
        let regs = register_checker_from_fn(|n| n == "D0");
        let tokens = tokenize_line("start: move.l #1,D0", 1, regs.clone()).unwrap();
        let parts = split_line(&tokens).unwrap();
        assert_eq!(parts.label.as_ref().map(|l| l.0.as_str()), Some("start"));
        assert_eq!(parts.mnemonic.as_ref().map(|m| m.0.as_str()), Some("MOVE"));
        assert_eq!(parts.size.as_ref().map(|s| s.0.as_str()), Some("L"));
        assert_eq!(split_operands(parts.operands).len(), 2);

        let tokens = tokenize_line("loop", 1, regs.clone()).unwrap();
        let parts = split_line(&tokens).unwrap();
        assert!(parts.label.is_some() && parts.mnemonic.is_none());

        let tokens = tokenize_line("  COUNT EQU 5", 1, regs.clone()).unwrap();
        let parts = split_line(&tokens).unwrap();
        assert_eq!(parts.label.as_ref().map(|l| l.0.as_str()), Some("COUNT"));
        assert_eq!(parts.mnemonic.as_ref().map(|m| m.0.as_str()), Some("EQU"));

        let tokens = tokenize_line("  rts", 1, regs).unwrap();
        let parts = split_line(&tokens).unwrap();
        assert!(parts.label.is_none());
        assert_eq!(parts.mnemonic.as_ref().map(|m| m.0.as_str()), Some("RTS"));
    }

    #[test]
    fn operand_split_ignores_nested_commas() {
        let tokens = tokenize_line("(4,A0,D1.W),D2{1:3}", 1, register_checker_none()).unwrap();
        let ops = split_operands(&tokens[..tokens.len() - 1]);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].len(), 9);
    }

    #[test]
    fn cursor_backtracks_to_mark() {
        let tokens = tokenize_line("1 + 2", 1, register_checker_none()).unwrap();
        let mut cursor = TokenCursor::new(&tokens);
        let mark = cursor.mark();
        let env = ExprEnv {
            lookup: &NoSymbols,
            pc: Expr::constant(0, Span::default()),
        };
        assert_eq!(parse_expr(&mut cursor, &env).unwrap().value(), Some(3));
        cursor.reset(mark);
        assert!(matches!(cursor.peek_kind(), TokenKind::Number(_)));
    }
}
