// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! RISC-V registers and operand classification.

use crate::core::cpu::EncodeError;
use crate::core::expr::Expr;
use crate::core::parser::{parse_expr_tokens, tokens_span, ExprEnv};
use crate::core::tokenizer::{Span, Token, TokenKind};

const ABI_NAMES: [&str; 32] = [
    "ZERO", "RA", "SP", "GP", "TP", "T0", "T1", "T2", "S0", "S1", "A0", "A1", "A2", "A3", "A4",
    "A5", "A6", "A7", "S2", "S3", "S4", "S5", "S6", "S7", "S8", "S9", "S10", "S11", "T3", "T4",
    "T5", "T6",
];

/// Number of an integer register, by `xN` or ABI name.
pub fn register_number(name: &str) -> Option<u8> {
    let upper = name.to_ascii_uppercase();
    if upper == "FP" {
        return Some(8);
    }
    if let Some(num) = upper.strip_prefix('X') {
        if !num.starts_with('0') || num == "0" {
            if let Ok(n @ 0..=31) = num.parse::<u8>() {
                return Some(n);
            }
        }
    }
    ABI_NAMES
        .iter()
        .position(|abi| *abi == upper)
        .map(|idx| idx as u8)
}

/// Check if an identifier is a register for the RISC-V family.
pub fn is_register(name: &str) -> bool {
    register_number(name).is_some()
}

#[derive(Debug, Clone)]
pub enum Operand {
    Reg(u8, Span),
    /// `offset(reg)`; a missing offset is zero.
    Mem(Expr, u8, Span),
    Imm(Expr),
}

impl Operand {
    pub fn span(&self) -> Span {
        match self {
            Operand::Reg(_, span) | Operand::Mem(_, _, span) => *span,
            Operand::Imm(expr) => expr.span,
        }
    }
}

fn register_token(token: &Token) -> Option<u8> {
    match &token.kind {
        TokenKind::Register(name) => register_number(name),
        _ => None,
    }
}

/// Classify one comma-separated operand.
pub fn classify(tokens: &[Token], env: &ExprEnv<'_>) -> Result<Operand, EncodeError> {
    let span = tokens_span(tokens);
    let expr = |tokens: &[Token]| {
        parse_expr_tokens(tokens, env).map_err(|err| EncodeError::syntax(err.message, err.span))
    };
    if let [token] = tokens {
        if let Some(reg) = register_token(token) {
            return Ok(Operand::Reg(reg, span));
        }
    }
    if let [prefix @ .., open, reg, close] = tokens {
        if open.kind == TokenKind::OpenParen && close.kind == TokenKind::CloseParen {
            if let Some(reg) = register_token(reg) {
                let offset = if prefix.is_empty() {
                    Expr::constant(0, span)
                } else {
                    expr(prefix)?
                };
                return Ok(Operand::Mem(offset, reg, span));
            }
        }
    }
    if tokens.iter().any(|t| matches!(t.kind, TokenKind::Register(_))) {
        return Err(EncodeError::syntax("Register not allowed in expression", span));
    }
    Ok(Operand::Imm(expr(tokens)?))
}
