// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand values of the DCPU-16 family and their 6-bit codes.

use crate::core::cpu::EncodeError;
use crate::core::expr::Expr;
use crate::core::parser::{parse_expr_tokens, tokens_span, ExprEnv};
use crate::core::tokenizer::{OperatorKind, Span, Token, TokenKind};

const GENERAL: [&str; 8] = ["A", "B", "C", "X", "Y", "Z", "I", "J"];

pub fn register_index(name: &str) -> Option<u8> {
    GENERAL
        .iter()
        .position(|reg| reg.eq_ignore_ascii_case(name))
        .map(|idx| idx as u8)
}

/// Check if an identifier is a register for the DCPU-16 family.
pub fn is_register(name: &str) -> bool {
    register_index(name).is_some()
        || matches!(name, "SP" | "PC" | "O" | "POP" | "PEEK" | "PUSH")
}

#[derive(Debug, Clone)]
pub enum Value {
    Register(u8),
    /// `[reg]`
    Indirect(u8),
    /// `[next+reg]`
    IndirectOffset(u8, Expr),
    Pop,
    Peek,
    Push,
    Sp,
    Pc,
    Overflow,
    /// `[next]`
    IndirectNext(Expr),
    Literal(Expr),
}

/// Bit set of value kinds, used by the legality table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueSet(u8);

impl ValueSet {
    pub const REGISTER: ValueSet = ValueSet(0x01);
    pub const INDIRECT: ValueSet = ValueSet(0x02);
    pub const STACK: ValueSet = ValueSet(0x04);
    pub const SPECIAL: ValueSet = ValueSet(0x08);
    pub const MEMORY: ValueSet = ValueSet(0x10);
    pub const LITERAL: ValueSet = ValueSet(0x20);
    pub const ALL: ValueSet = ValueSet(0x3f);
    /// Everything that can be written.
    pub const WRITABLE: ValueSet = ValueSet(0x1f);

    pub fn contains(self, other: ValueSet) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Value {
    pub fn kind(&self) -> ValueSet {
        match self {
            Value::Register(_) => ValueSet::REGISTER,
            Value::Indirect(_) | Value::IndirectOffset(..) => ValueSet::INDIRECT,
            Value::Pop | Value::Peek | Value::Push => ValueSet::STACK,
            Value::Sp | Value::Pc | Value::Overflow => ValueSet::SPECIAL,
            Value::IndirectNext(_) => ValueSet::MEMORY,
            Value::Literal(_) => ValueSet::LITERAL,
        }
    }

    /// Literal value, when known now.
    pub fn literal(&self) -> Option<i32> {
        match self {
            Value::Literal(expr) => expr.value(),
            _ => None,
        }
    }

    /// 6-bit operand code and the expression of its next word, if any.
    /// Known literals up to 0x1f are inlined when `inline` is set.
    pub fn code(self, inline: bool) -> (u16, Option<Expr>) {
        match self {
            Value::Register(n) => (n as u16, None),
            Value::Indirect(n) => (0x08 + n as u16, None),
            Value::IndirectOffset(n, expr) => (0x10 + n as u16, Some(expr)),
            Value::Pop => (0x18, None),
            Value::Peek => (0x19, None),
            Value::Push => (0x1a, None),
            Value::Sp => (0x1b, None),
            Value::Pc => (0x1c, None),
            Value::Overflow => (0x1d, None),
            Value::IndirectNext(expr) => (0x1e, Some(expr)),
            Value::Literal(expr) => match expr.value() {
                Some(v @ 0..=0x1f) if inline => (0x20 + v as u16, None),
                _ => (0x1f, Some(expr)),
            },
        }
    }
}

fn special(name: &str) -> Option<Value> {
    let value = match name.to_ascii_uppercase().as_str() {
        "POP" => Value::Pop,
        "PEEK" => Value::Peek,
        "PUSH" => Value::Push,
        "SP" => Value::Sp,
        "PC" => Value::Pc,
        "O" => Value::Overflow,
        other => Value::Register(register_index(other)?),
    };
    Some(value)
}

fn is_plus(token: &Token) -> bool {
    token.kind == TokenKind::Operator(OperatorKind::Plus)
}

/// Classify one operand. With `optimize`, `[reg+0]` becomes `[reg]`.
pub fn classify(tokens: &[Token], env: &ExprEnv<'_>, optimize: bool) -> Result<Value, EncodeError> {
    let span = tokens_span(tokens);
    let expr = |tokens: &[Token]| {
        parse_expr_tokens(tokens, env).map_err(|err| EncodeError::syntax(err.message, err.span))
    };
    if let [Token {
        kind: TokenKind::Register(name),
        ..
    }] = tokens
    {
        return special(name).ok_or_else(|| EncodeError::syntax("Unknown register", span));
    }
    let bracketed = matches!(tokens.first(), Some(t) if t.kind == TokenKind::OpenBracket)
        && matches!(tokens.last(), Some(t) if t.kind == TokenKind::CloseBracket);
    if !bracketed {
        return Ok(Value::Literal(expr(tokens)?));
    }

    let inner = &tokens[1..tokens.len() - 1];
    let reg_at = inner
        .iter()
        .position(|t| matches!(t.kind, TokenKind::Register(_)));
    let Some(pos) = reg_at else {
        return Ok(Value::IndirectNext(expr(inner)?));
    };
    let reg = match &inner[pos].kind {
        TokenKind::Register(name) => register_index(name),
        _ => None,
    };
    let Some(reg) = reg else {
        return Err(bad_indirect(span));
    };
    let offset = match (pos, inner.len()) {
        (0, 1) => return Ok(Value::Indirect(reg)),
        (0, len) if len > 2 && is_plus(&inner[1]) => expr(&inner[2..])?,
        (p, len) if p == len - 1 && p >= 2 && is_plus(&inner[p - 1]) => expr(&inner[..p - 1])?,
        _ => return Err(bad_indirect(span)),
    };
    if optimize && offset.value() == Some(0) {
        return Ok(Value::Indirect(reg));
    }
    Ok(Value::IndirectOffset(reg, offset))
}

fn bad_indirect(span: Span) -> EncodeError {
    EncodeError::syntax("Expected [reg], [next], [next+reg] or [reg+next]", span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expr::NoSymbols;
    use crate::core::tokenizer::{register_checker_from_fn, tokenize_line};

    fn classify_text(text: &str, optimize: bool) -> Value {
        let tokens = tokenize_line(text, 1, register_checker_from_fn(is_register)).unwrap();
        let env = ExprEnv {
            lookup: &NoSymbols,
            pc: Expr::constant(0, Span::default()),
        };
        classify(&tokens[..tokens.len() - 1], &env, optimize).unwrap()
    }

    #[test]
    fn classifies_value_forms() {
        assert!(matches!(classify_text("I", true), Value::Register(6)));
        assert!(matches!(classify_text("[B]", true), Value::Indirect(1)));
        assert!(matches!(classify_text("[$2000+I]", true), Value::IndirectOffset(6, _)));
        assert!(matches!(classify_text("[I+$2000]", true), Value::IndirectOffset(6, _)));
        assert!(matches!(classify_text("[$1000]", true), Value::IndirectNext(_)));
        assert!(matches!(classify_text("PEEK", true), Value::Peek));
        assert!(matches!(classify_text("$30", true), Value::Literal(_)));
    }

    #[test]
    fn zero_offset_folds_only_when_optimizing() {
        assert!(matches!(classify_text("[B+0]", true), Value::Indirect(1)));
        assert!(matches!(classify_text("[B+0]", false), Value::IndirectOffset(1, _)));
    }

    #[test]
    fn inline_literals() {
        let small = Value::Literal(Expr::constant(0x10, Span::default()));
        assert_eq!(small.clone().code(true).0, 0x30);
        assert_eq!(small.code(false).0, 0x1f);
        let large = Value::Literal(Expr::constant(0x30, Span::default()));
        assert_eq!(large.code(true).0, 0x1f);
    }
}
