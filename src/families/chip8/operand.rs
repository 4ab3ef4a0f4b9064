// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CHIP-8 operands.

use crate::core::cpu::EncodeError;
use crate::core::expr::Expr;
use crate::core::parser::{parse_expr_tokens, tokens_span, ExprEnv};
use crate::core::tokenizer::{Span, Token, TokenKind};

/// Registers other than V0-VF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
    I,
    Dt,
    St,
    K,
    F,
    Hf,
    B,
    R,
}

fn special(name: &str) -> Option<Special> {
    let reg = match name.to_ascii_uppercase().as_str() {
        "I" => Special::I,
        "DT" => Special::Dt,
        "ST" => Special::St,
        "K" => Special::K,
        "F" => Special::F,
        "HF" => Special::Hf,
        "B" => Special::B,
        "R" => Special::R,
        _ => return None,
    };
    Some(reg)
}

fn v_register(name: &str) -> Option<u8> {
    match name.as_bytes() {
        [b'V' | b'v', digit] => (*digit as char).to_digit(16).map(|n| n as u8),
        _ => None,
    }
}

/// Check if an identifier is a register for the CHIP-8 family.
pub fn is_register(name: &str) -> bool {
    v_register(name).is_some() || special(name).is_some()
}

#[derive(Debug, Clone)]
pub enum Operand {
    V(u8, Span),
    Special(Special, Span),
    /// `[I]`
    IndirectI(Span),
    Imm(Expr),
}

impl Operand {
    pub fn span(&self) -> Span {
        match self {
            Operand::V(_, span) | Operand::Special(_, span) | Operand::IndirectI(span) => *span,
            Operand::Imm(expr) => expr.span,
        }
    }
}

pub fn classify(tokens: &[Token], env: &ExprEnv<'_>) -> Result<Operand, EncodeError> {
    let span = tokens_span(tokens);
    match tokens {
        [Token {
            kind: TokenKind::Register(name),
            ..
        }] => {
            if let Some(n) = v_register(name) {
                return Ok(Operand::V(n, span));
            }
            special(name)
                .map(|reg| Operand::Special(reg, span))
                .ok_or_else(|| EncodeError::syntax("Unknown register", span))
        }
        [open, Token {
            kind: TokenKind::Register(name),
            ..
        }, close]
            if open.kind == TokenKind::OpenBracket && close.kind == TokenKind::CloseBracket =>
        {
            match special(name) {
                Some(Special::I) => Ok(Operand::IndirectI(span)),
                _ => Err(EncodeError::syntax("Only [I] may be used indirectly", span)),
            }
        }
        _ => parse_expr_tokens(tokens, env)
            .map(Operand::Imm)
            .map_err(|err| EncodeError::syntax(err.message, err.span)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_names() {
        assert_eq!(v_register("V0"), Some(0));
        assert_eq!(v_register("VF"), Some(15));
        assert_eq!(v_register("VG"), None);
        assert!(is_register("DT"));
        assert!(is_register("HF"));
        assert!(!is_register("X"));
    }
}
