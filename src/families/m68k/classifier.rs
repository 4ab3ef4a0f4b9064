// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! 680x0 addressing-mode classifier.
//!
//! Turns the tokens of one operand into an [`AddressingMode`]. Bracketed
//! forms collect their parts (base register, index register, displacement)
//! first and then choose the mode from the combination of parts present;
//! a combination without a 680x0 shape is a syntax error.

use crate::core::cpu::EncodeError;
use crate::core::expr::{fits_signed, Expr};
use crate::core::parser::{parse_expr, tokens_span, ExprEnv, ParseError, TokenCursor};
use crate::core::tokenizer::{OperatorKind, Span, Token, TokenKind};

use super::operand::{
    control_register, AddressingMode, Base, BitfieldPart, IndexReg, Operand,
};

/// Register token meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reg {
    Data(u8),
    Addr(u8),
    Pc,
    Zpc,
    Sr,
    Ccr,
    Usp,
    Ctrl(u16),
    Fp(u8),
    FpCtrl(u8),
}

fn parse_reg(name: &str) -> Option<Reg> {
    let upper = name.to_ascii_uppercase();
    let reg = match upper.as_str() {
        "SP" => Reg::Addr(7),
        "PC" => Reg::Pc,
        "ZPC" => Reg::Zpc,
        "SR" => Reg::Sr,
        "CCR" => Reg::Ccr,
        "USP" => Reg::Usp,
        "FPCR" => Reg::FpCtrl(4),
        "FPSR" => Reg::FpCtrl(2),
        "FPIAR" => Reg::FpCtrl(1),
        other => {
            if let Some(code) = control_register(other) {
                return Some(Reg::Ctrl(code));
            }
            let bytes = other.as_bytes();
            match bytes {
                [b'D', n @ b'0'..=b'7'] => Reg::Data(n - b'0'),
                [b'A', n @ b'0'..=b'7'] => Reg::Addr(n - b'0'),
                [b'F', b'P', n @ b'0'..=b'7'] => Reg::Fp(n - b'0'),
                _ => return None,
            }
        }
    };
    Some(reg)
}

fn syntax(err: ParseError) -> EncodeError {
    EncodeError::syntax(err.message, err.span)
}

/// Parts found inside one pair of parentheses or brackets.
#[derive(Debug, Default)]
struct Parts {
    base: Option<Base>,
    index: Option<IndexReg>,
    disp: Option<Expr>,
}

pub struct Classifier<'a> {
    env: &'a ExprEnv<'a>,
    /// CPU supports full-format extension words.
    full_ext: bool,
    optimize: bool,
}

impl<'a> Classifier<'a> {
    pub fn new(env: &'a ExprEnv<'a>, full_ext: bool, optimize: bool) -> Self {
        Self {
            env,
            full_ext,
            optimize,
        }
    }

    /// Classify one comma-separated operand. A trailing bitfield specifier
    /// becomes a second operand.
    pub fn classify(&self, tokens: &[Token]) -> Result<Vec<Operand>, EncodeError> {
        let mut cur = TokenCursor::new(tokens);
        if cur.at_end() {
            return Err(EncodeError::syntax("Missing operand", cur.span()));
        }
        let mode = self.parse_ea(&mut cur)?;
        let mut out = vec![Operand::new(mode, tokens_span(&tokens[..cur.mark()]))];
        if matches!(cur.peek_kind(), TokenKind::OpenBrace) {
            let start = cur.mark();
            let bitfield = self.parse_bitfield(&mut cur)?;
            out.push(Operand::new(
                bitfield,
                tokens_span(&tokens[start..cur.mark()]),
            ));
        }
        cur.expect_end().map_err(syntax)?;
        Ok(out)
    }

    fn expr(&self, cur: &mut TokenCursor<'_>) -> Result<Expr, EncodeError> {
        parse_expr(cur, self.env).map_err(syntax)
    }

    fn parse_ea(&self, cur: &mut TokenCursor<'_>) -> Result<AddressingMode, EncodeError> {
        let span = cur.span();
        match cur.peek_kind().clone() {
            TokenKind::Hash => {
                cur.advance();
                Ok(AddressingMode::Immediate(self.expr(cur)?))
            }
            TokenKind::Register(name) => {
                let Some(reg) = parse_reg(&name) else {
                    return Err(EncodeError::syntax(format!("Unknown register {name}"), span));
                };
                self.parse_register_operand(cur, reg)
            }
            TokenKind::Operator(OperatorKind::Minus) if self.is_predecrement(cur) => {
                cur.advance();
                cur.advance();
                let reg = self.address_register_at(cur).unwrap_or(0);
                cur.advance();
                cur.advance();
                Ok(AddressingMode::PreDecrement(reg))
            }
            TokenKind::OpenParen => {
                if matches!(cur.peek_at(1).kind, TokenKind::OpenBracket) {
                    cur.advance();
                    return self.parse_memory_indirect(cur);
                }
                if let (TokenKind::Register(name), TokenKind::CloseParen) =
                    (&cur.peek_at(1).kind, &cur.peek_at(2).kind)
                {
                    if let Some(Reg::Addr(n)) = parse_reg(name) {
                        cur.advance();
                        cur.advance();
                        cur.advance();
                        if cur.consume_operator(OperatorKind::Plus) {
                            return Ok(AddressingMode::PostIncrement(n));
                        }
                        return Ok(AddressingMode::Indirect(n));
                    }
                }
                let mark = cur.mark();
                cur.advance();
                let mut parts = Parts::default();
                self.parse_parts(cur, &mut parts, &TokenKind::CloseParen, false)?;
                if parts.base.is_none() && parts.index.is_none() {
                    // parenthesized expression
                    cur.reset(mark);
                    return self.parse_absolute(cur);
                }
                self.classify_parts(parts, span)
            }
            _ => self.parse_absolute(cur),
        }
    }

    fn is_predecrement(&self, cur: &TokenCursor<'_>) -> bool {
        matches!(cur.peek_at(1).kind, TokenKind::OpenParen)
            && matches!(cur.peek_at(3).kind, TokenKind::CloseParen)
            && self.address_register_at_offset(cur, 2).is_some()
    }

    fn address_register_at(&self, cur: &TokenCursor<'_>) -> Option<u8> {
        self.address_register_at_offset(cur, 0)
    }

    fn address_register_at_offset(&self, cur: &TokenCursor<'_>, n: usize) -> Option<u8> {
        match &cur.peek_at(n).kind {
            TokenKind::Register(name) => match parse_reg(name) {
                Some(Reg::Addr(r)) => Some(r),
                _ => None,
            },
            _ => None,
        }
    }

    /// Expression operand: absolute address, `d(An..)` or `d(PC..)`.
    fn parse_absolute(&self, cur: &mut TokenCursor<'_>) -> Result<AddressingMode, EncodeError> {
        let span = cur.span();
        let expr = self.expr(cur)?;
        if matches!(cur.peek_kind(), TokenKind::OpenParen) {
            cur.advance();
            let mut parts = Parts {
                disp: Some(expr),
                ..Parts::default()
            };
            self.parse_parts(cur, &mut parts, &TokenKind::CloseParen, false)?;
            if parts.base.is_none() && parts.index.is_none() {
                return Err(EncodeError::syntax("Expected register after displacement", span));
            }
            return self.classify_parts(parts, span);
        }
        if matches!(cur.peek_kind(), TokenKind::Dot) {
            let size_span = cur.peek_at(1).span;
            let suffix = match &cur.peek_at(1).kind {
                TokenKind::Identifier(s) => s.to_ascii_uppercase(),
                _ => String::new(),
            };
            cur.advance();
            cur.advance();
            return match suffix.as_str() {
                "W" => Ok(AddressingMode::AbsoluteWord(expr)),
                "L" => Ok(AddressingMode::AbsoluteLong(expr)),
                _ => Err(EncodeError::syntax(
                    "Absolute address size must be .W or .L",
                    size_span,
                )),
            };
        }
        match expr.value() {
            Some(value) if fits_signed(value as i64, 16) => Ok(AddressingMode::AbsoluteWord(expr)),
            _ => Ok(AddressingMode::AbsoluteLong(expr)),
        }
    }

    fn parse_register_operand(
        &self,
        cur: &mut TokenCursor<'_>,
        reg: Reg,
    ) -> Result<AddressingMode, EncodeError> {
        let span = cur.span();
        let is_list = matches!(
            cur.peek_at(1).kind,
            TokenKind::Operator(OperatorKind::Minus) | TokenKind::Operator(OperatorKind::Divide)
        );
        match reg {
            Reg::Data(_) | Reg::Addr(_) if is_list => self.parse_register_list(cur),
            Reg::Fp(_) if is_list => self.parse_fp_list(cur),
            Reg::FpCtrl(_) if is_list => self.parse_fp_control_list(cur),
            Reg::Data(h) if matches!(cur.peek_at(1).kind, TokenKind::Colon) => {
                cur.advance();
                cur.advance();
                match cur.peek_kind().clone() {
                    TokenKind::Register(name) => match parse_reg(&name) {
                        Some(Reg::Data(l)) => {
                            cur.advance();
                            Ok(AddressingMode::RegisterPair(h, l))
                        }
                        _ => Err(EncodeError::syntax("Expected data register", cur.span())),
                    },
                    _ => Err(EncodeError::syntax("Expected data register", cur.span())),
                }
            }
            _ => {
                cur.advance();
                match reg {
                    Reg::Data(n) => Ok(AddressingMode::DataRegister(n)),
                    Reg::Addr(n) => Ok(AddressingMode::AddressRegister(n)),
                    Reg::Sr => Ok(AddressingMode::Sr),
                    Reg::Ccr => Ok(AddressingMode::Ccr),
                    Reg::Usp => Ok(AddressingMode::Usp),
                    Reg::Ctrl(code) => Ok(AddressingMode::ControlRegister(code)),
                    Reg::Fp(n) => Ok(AddressingMode::FpRegister(n)),
                    Reg::FpCtrl(bit) => Ok(AddressingMode::FpControl(bit)),
                    Reg::Pc | Reg::Zpc => Err(EncodeError::syntax(
                        "PC can only be used inside parentheses",
                        span,
                    )),
                }
            }
        }
    }

    /// `D0-D3/A0/A6`.
    fn parse_register_list(&self, cur: &mut TokenCursor<'_>) -> Result<AddressingMode, EncodeError> {
        let mut mask = 0u16;
        loop {
            let first = self.list_register(cur)?;
            let mut last = first;
            if cur.consume_operator(OperatorKind::Minus) {
                let span = cur.span();
                last = self.list_register(cur)?;
                if (first < 8) != (last < 8) || last < first {
                    return Err(EncodeError::syntax("Invalid register range", span));
                }
            }
            for r in first..=last {
                mask |= 1 << r;
            }
            if !cur.consume_operator(OperatorKind::Divide) {
                break;
            }
        }
        Ok(AddressingMode::RegisterList(mask))
    }

    fn list_register(&self, cur: &mut TokenCursor<'_>) -> Result<u8, EncodeError> {
        let span = cur.span();
        let reg = match &cur.peek().kind {
            TokenKind::Register(name) => parse_reg(name),
            _ => None,
        };
        match reg {
            Some(Reg::Data(n)) => {
                cur.advance();
                Ok(n)
            }
            Some(Reg::Addr(n)) => {
                cur.advance();
                Ok(n + 8)
            }
            _ => Err(EncodeError::syntax("Expected data or address register", span)),
        }
    }

    fn parse_fp_list(&self, cur: &mut TokenCursor<'_>) -> Result<AddressingMode, EncodeError> {
        let mut mask = 0u8;
        loop {
            let first = self.fp_list_register(cur)?;
            let mut last = first;
            if cur.consume_operator(OperatorKind::Minus) {
                let span = cur.span();
                last = self.fp_list_register(cur)?;
                if last < first {
                    return Err(EncodeError::syntax("Invalid register range", span));
                }
            }
            for r in first..=last {
                mask |= 1 << r;
            }
            if !cur.consume_operator(OperatorKind::Divide) {
                break;
            }
        }
        Ok(AddressingMode::FpRegisterList(mask))
    }

    fn fp_list_register(&self, cur: &mut TokenCursor<'_>) -> Result<u8, EncodeError> {
        let span = cur.span();
        match &cur.peek().kind {
            TokenKind::Register(name) => match parse_reg(name) {
                Some(Reg::Fp(n)) => {
                    cur.advance();
                    Ok(n)
                }
                _ => Err(EncodeError::syntax("Expected FP register", span)),
            },
            _ => Err(EncodeError::syntax("Expected FP register", span)),
        }
    }

    fn parse_fp_control_list(
        &self,
        cur: &mut TokenCursor<'_>,
    ) -> Result<AddressingMode, EncodeError> {
        let mut mask = 0u8;
        loop {
            let span = cur.span();
            match &cur.peek().kind {
                TokenKind::Register(name) => match parse_reg(name) {
                    Some(Reg::FpCtrl(bit)) => {
                        cur.advance();
                        mask |= bit;
                    }
                    _ => return Err(EncodeError::syntax("Expected FP control register", span)),
                },
                _ => return Err(EncodeError::syntax("Expected FP control register", span)),
            }
            if !cur.consume_operator(OperatorKind::Divide) {
                break;
            }
        }
        Ok(AddressingMode::FpControl(mask))
    }

    /// Parse comma-separated parts up to and including `close`.
    fn parse_parts(
        &self,
        cur: &mut TokenCursor<'_>,
        parts: &mut Parts,
        close: &TokenKind,
        index_only: bool,
    ) -> Result<(), EncodeError> {
        loop {
            self.parse_part(cur, parts, index_only)?;
            if cur.consume(&TokenKind::Comma) {
                continue;
            }
            if cur.consume(close) {
                return Ok(());
            }
            if matches!(cur.peek_kind(), TokenKind::Operator(OperatorKind::Minus))
                && matches!(cur.peek_at(1).kind, TokenKind::Register(_))
            {
                return Err(EncodeError::syntax("Cannot subtract registers", cur.span()));
            }
            let expected = if *close == TokenKind::CloseBracket {
                "Expected ',' or ']'"
            } else {
                "Expected ',' or ')'"
            };
            return Err(EncodeError::syntax(expected, cur.span()));
        }
    }

    fn parse_part(
        &self,
        cur: &mut TokenCursor<'_>,
        parts: &mut Parts,
        index_only: bool,
    ) -> Result<(), EncodeError> {
        let span = cur.span();
        let TokenKind::Register(name) = cur.peek_kind().clone() else {
            if parts.disp.is_some() {
                return Err(EncodeError::syntax("Duplicate displacement", span));
            }
            parts.disp = Some(self.expr(cur)?);
            return Ok(());
        };
        let Some(reg) = parse_reg(&name) else {
            return Err(EncodeError::syntax(format!("Unknown register {name}"), span));
        };
        cur.advance();
        let has_suffix = matches!(
            cur.peek_kind(),
            TokenKind::Dot | TokenKind::Operator(OperatorKind::Multiply)
        );
        let one_register = || EncodeError::syntax("One register only", span);
        match reg {
            Reg::Addr(n) if !has_suffix && !index_only && parts.base.is_none() => {
                parts.base = Some(Base::Address(n));
            }
            Reg::Pc | Reg::Zpc if !index_only => {
                if parts.base.is_some() {
                    return Err(one_register());
                }
                parts.base = Some(if reg == Reg::Pc {
                    Base::Pc
                } else {
                    Base::ZeroPc
                });
            }
            Reg::Addr(n) | Reg::Data(n) => {
                if parts.index.is_some() {
                    return Err(one_register());
                }
                let reg = if matches!(reg, Reg::Addr(_)) { n + 8 } else { n };
                parts.index = Some(self.parse_index_suffix(cur, reg)?);
            }
            _ => {
                return Err(EncodeError::syntax(
                    format!("{name} cannot be used in an address"),
                    span,
                ))
            }
        }
        Ok(())
    }

    /// `.W`/`.L` size and `*scale` after an index register.
    fn parse_index_suffix(
        &self,
        cur: &mut TokenCursor<'_>,
        reg: u8,
    ) -> Result<IndexReg, EncodeError> {
        let mut index = IndexReg {
            reg,
            long: false,
            scale: 1,
        };
        if cur.consume(&TokenKind::Dot) {
            let span = cur.span();
            let size = match &cur.peek().kind {
                TokenKind::Identifier(s) => s.to_ascii_uppercase(),
                _ => String::new(),
            };
            match size.as_str() {
                "W" => {}
                "L" => index.long = true,
                _ => return Err(EncodeError::syntax("Index size must be .W or .L", span)),
            }
            cur.advance();
        }
        if cur.consume_operator(OperatorKind::Multiply) {
            let span = cur.span();
            let scale = self.expr(cur)?;
            match scale.value() {
                Some(s @ (1 | 2 | 4 | 8)) => index.scale = s as u8,
                _ => return Err(EncodeError::syntax("Scale must be 1, 2, 4 or 8", span)),
            }
        }
        Ok(index)
    }

    /// Choose the mode for a parenthesized group from the parts present.
    fn classify_parts(&self, parts: Parts, span: Span) -> Result<AddressingMode, EncodeError> {
        let Parts { base, index, disp } = parts;
        let mode = match (base, index, disp) {
            (Some(Base::Address(reg)), None, None) => AddressingMode::Indirect(reg),
            (Some(Base::Address(reg)), None, Some(disp)) => self.displacement(reg, disp),
            (Some(base @ Base::Address(_)), Some(index), disp) => {
                AddressingMode::IndexedDisplacement {
                    base,
                    index: Some(index),
                    disp: self.drop_zero(disp),
                }
            }
            (Some(Base::Pc), None, target) => AddressingMode::PcDisplacement { target },
            (Some(Base::Pc), Some(index), disp) => AddressingMode::IndexedDisplacement {
                base: Base::Pc,
                index: Some(index),
                disp,
            },
            (Some(Base::ZeroPc), index, disp) => AddressingMode::IndexedDisplacement {
                base: Base::ZeroPc,
                index,
                disp,
            },
            (None, Some(index), disp) => AddressingMode::IndexedDisplacement {
                base: Base::Suppressed,
                index: Some(index),
                disp,
            },
            (Some(Base::Suppressed), _, _) | (None, None, _) => {
                return Err(EncodeError::syntax("Invalid addressing mode", span))
            }
        };
        Ok(mode)
    }

    /// `(d,An)`: folds a zero displacement when optimizing and switches to
    /// the full format for displacements beyond 16 bits.
    fn displacement(&self, reg: u8, disp: Expr) -> AddressingMode {
        match disp.value() {
            Some(0) if self.optimize => AddressingMode::Indirect(reg),
            Some(value) if !fits_signed(value as i64, 16) && self.full_ext => {
                AddressingMode::IndexedDisplacement {
                    base: Base::Address(reg),
                    index: None,
                    disp: Some(disp),
                }
            }
            _ => AddressingMode::Displacement { reg, disp },
        }
    }

    fn drop_zero(&self, disp: Option<Expr>) -> Option<Expr> {
        match disp {
            Some(d) if self.optimize && d.value() == Some(0) => None,
            other => other,
        }
    }

    /// `([bd,An,Xn],od)` and `([bd,An],Xn,od)`; the `(` is consumed.
    fn parse_memory_indirect(
        &self,
        cur: &mut TokenCursor<'_>,
    ) -> Result<AddressingMode, EncodeError> {
        let span = cur.span();
        cur.advance();
        let mut inner = Parts::default();
        if matches!(cur.peek_kind(), TokenKind::CloseBracket) {
            return Err(EncodeError::syntax("Empty brackets", cur.span()));
        }
        self.parse_parts(cur, &mut inner, &TokenKind::CloseBracket, false)?;
        let mut outer = Parts::default();
        if cur.consume(&TokenKind::Comma) {
            self.parse_parts(cur, &mut outer, &TokenKind::CloseParen, true)?;
        } else {
            cur.expect(&TokenKind::CloseParen, "')'").map_err(syntax)?;
        }
        let base = inner.base.unwrap_or(Base::Suppressed);
        match (inner.index, outer.index) {
            (Some(_), Some(_)) => Err(EncodeError::syntax("One register only", span)),
            (None, Some(index)) => Ok(AddressingMode::MemoryIndirectPost {
                base,
                index,
                bd: inner.disp,
                od: outer.disp,
            }),
            (index, None) => Ok(AddressingMode::MemoryIndirectPre {
                base,
                index,
                bd: inner.disp,
                od: outer.disp,
            }),
        }
    }

    /// `{offset:width}`, each part a data register or an expression.
    fn parse_bitfield(&self, cur: &mut TokenCursor<'_>) -> Result<AddressingMode, EncodeError> {
        cur.advance();
        let offset = self.bitfield_part(cur)?;
        cur.expect(&TokenKind::Colon, "':'").map_err(syntax)?;
        let width = self.bitfield_part(cur)?;
        cur.expect(&TokenKind::CloseBrace, "'}'").map_err(syntax)?;
        Ok(AddressingMode::Bitfield { offset, width })
    }

    fn bitfield_part(&self, cur: &mut TokenCursor<'_>) -> Result<BitfieldPart, EncodeError> {
        if let TokenKind::Register(name) = cur.peek_kind().clone() {
            if let Some(Reg::Data(n)) = parse_reg(&name) {
                cur.advance();
                return Ok(BitfieldPart::Register(n));
            }
            return Err(EncodeError::syntax("Expected data register", cur.span()));
        }
        Ok(BitfieldPart::Value(self.expr(cur)?))
    }
}
