// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! MOS 6502 family handler implementation.

use tracing::debug;

use crate::core::context::{AsmContext, Emission, PcAnchor};
use crate::core::cpu::{CpuFamily, EncodeError};
use crate::core::family::{EncodeResult, FamilyHandler, Instruction};
use crate::core::parser::{parse_expr_tokens, tokens_span, ExprEnv, ParseError};
use crate::core::patch::{Endian, Field};
use crate::core::tokenizer::{Span, Token, TokenKind};

use super::module::{cpu_set, FAMILY_ID};
use super::operand::{is_register, AddressMode, FamilyOperand};
use super::table::{has_mnemonic, rows_for, CpuSet, Opcode};

const LE: Endian = Endian::Little;
const BYTE: Field = Field::new(1, LE, 0, 0xff);
const IMMEDIATE: Field = Field::new(1, LE, -128, 0xff);
const WORD: Field = Field::new(2, LE, 0, 0xffff);
const OFFSET: Field = Field::signed(1, LE);

/// Family handler for MOS 6502 family.
#[derive(Debug, Default)]
pub struct MOS6502FamilyHandler;

impl MOS6502FamilyHandler {
    pub fn new() -> Self {
        Self
    }
}

const BIT_MNEMONICS: [&str; 4] = ["RMB", "SMB", "BBR", "BBS"];

/// Map `RMB3`, `BBS7` and friends to their table row and bit number.
fn resolve_mnemonic(mnemonic: &str) -> Option<(&str, u8)> {
    for base in BIT_MNEMONICS {
        if let Some(rest) = mnemonic.strip_prefix(base) {
            return match rest.as_bytes() {
                [digit @ b'0'..=b'7'] => Some((base, digit - b'0')),
                _ => None,
            };
        }
    }
    has_mnemonic(mnemonic).then_some((mnemonic, 0))
}

fn syntax(err: ParseError) -> EncodeError {
    EncodeError::syntax(err.message, err.span)
}

fn index_register(tokens: &[Token]) -> Option<&str> {
    match tokens {
        [Token {
            kind: TokenKind::Register(name),
            ..
        }] => Some(name.as_str()),
        _ => None,
    }
}

/// Inner tokens if the whole operand is one parenthesized group.
fn parenthesized(tokens: &[Token]) -> Option<&[Token]> {
    if tokens.first()?.kind != TokenKind::OpenParen {
        return None;
    }
    let mut depth = 0i32;
    for (idx, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::OpenParen => depth += 1,
            TokenKind::CloseParen => {
                depth -= 1;
                if depth == 0 {
                    return (idx == tokens.len() - 1).then(|| &tokens[1..idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Classify the comma-separated operand groups of one instruction.
fn classify(
    mnemonic: &str,
    operands: &[&[Token]],
    env: &ExprEnv<'_>,
) -> Result<FamilyOperand, EncodeError> {
    let expr = |tokens: &[Token]| parse_expr_tokens(tokens, env).map_err(syntax);
    match operands {
        [] => Ok(FamilyOperand::None),
        [single] => {
            if index_register(single).is_some_and(|name| name.eq_ignore_ascii_case("A")) {
                return Ok(FamilyOperand::Accumulator(tokens_span(single)));
            }
            if let Some((first, rest)) = single.split_first() {
                if first.kind == TokenKind::Hash {
                    return Ok(FamilyOperand::Immediate(expr(rest)?));
                }
            }
            if let Some(inner) = parenthesized(single) {
                if let Some(comma) = inner.iter().rposition(|t| t.kind == TokenKind::Comma) {
                    return match index_register(&inner[comma + 1..]) {
                        Some(name) if name.eq_ignore_ascii_case("X") => {
                            Ok(FamilyOperand::IndexedIndirectX(expr(&inner[..comma])?))
                        }
                        _ => Err(EncodeError::syntax(
                            "Indexed indirect must use ,X: (zp,X)",
                            tokens_span(single),
                        )),
                    };
                }
                return Ok(FamilyOperand::Indirect(expr(inner)?));
            }
            Ok(FamilyOperand::Direct(expr(single)?))
        }
        [first, second] => {
            let index = index_register(second).map(str::to_ascii_uppercase);
            match index.as_deref() {
                Some("X") => Ok(FamilyOperand::DirectX(expr(first)?)),
                Some("Y") => match parenthesized(first) {
                    Some(inner) => Ok(FamilyOperand::IndirectIndexedY(expr(inner)?)),
                    None => Ok(FamilyOperand::DirectY(expr(first)?)),
                },
                _ if mnemonic == "BBR" || mnemonic == "BBS" => {
                    Ok(FamilyOperand::BitBranch(expr(first)?, expr(second)?))
                }
                _ => Err(EncodeError::syntax(
                    "Expected ,X or ,Y index",
                    tokens_span(second),
                )),
            }
        }
        _ => Err(EncodeError::syntax(
            "Too many operands",
            tokens_span(operands[2]),
        )),
    }
}

/// Pick the first candidate mode the active CPU has a row for.
fn select(
    mnemonic: &str,
    operand: &FamilyOperand,
    cpu: CpuSet,
    span: Span,
) -> Result<&'static Opcode, EncodeError> {
    let mut other_cpu = false;
    for mode in operand.candidates() {
        for row in rows_for(mnemonic).filter(|row| row.mode == mode) {
            if row.cpus & cpu != 0 {
                return Ok(row);
            }
            other_cpu = true;
        }
    }
    let span = operand.span().unwrap_or(span);
    if other_cpu {
        Err(EncodeError::cpu(
            format!("{mnemonic} addressing mode not available on this CPU"),
            span,
        ))
    } else {
        Err(EncodeError::legality(
            format!("Illegal addressing mode for {mnemonic}"),
            span,
        ))
    }
}

fn encode(row: &Opcode, bit: u8, operand: FamilyOperand) -> Emission {
    let mut em = Emission::new();
    em.bytes(&[row.opcode | (bit << 4)]);
    match (row.mode, operand) {
        (AddressMode::Relative, FamilyOperand::Direct(target)) => {
            em.relative(OFFSET, target, PcAnchor::InstructionEnd, 0);
        }
        (AddressMode::ZeroPageRelative, FamilyOperand::BitBranch(zp, target)) => {
            em.field(BYTE, zp);
            em.relative(OFFSET, target, PcAnchor::InstructionEnd, 0);
        }
        (_, FamilyOperand::Immediate(value)) => {
            em.field(IMMEDIATE, value);
        }
        (
            mode,
            FamilyOperand::Direct(addr)
            | FamilyOperand::DirectX(addr)
            | FamilyOperand::DirectY(addr)
            | FamilyOperand::IndexedIndirectX(addr)
            | FamilyOperand::IndirectIndexedY(addr)
            | FamilyOperand::Indirect(addr),
        ) => {
            let field = if mode.operand_size() == 1 { BYTE } else { WORD };
            em.field(field, addr);
        }
        _ => {}
    }
    em
}

impl FamilyHandler for MOS6502FamilyHandler {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn is_register(&self, name: &str) -> bool {
        is_register(&name.to_ascii_uppercase())
    }

    fn encode_instruction(&self, instr: &Instruction<'_>, ctx: &mut AsmContext) -> EncodeResult<()> {
        let Some((mnemonic, bit)) = resolve_mnemonic(&instr.mnemonic) else {
            return EncodeResult::NotFound;
        };
        if let (Some(size), Some(span)) = (&instr.size, instr.size_span) {
            ctx.report_error(EncodeError::size(
                format!("6502 instructions take no size suffix (.{size})"),
                span,
            ));
        }
        let operand = {
            let resolver = ctx.resolver();
            let env = ExprEnv {
                lookup: &resolver,
                pc: ctx.pc_expr(instr.mnemonic_span),
            };
            match classify(mnemonic, &instr.operands, &env) {
                Ok(operand) => operand,
                Err(err) => return EncodeResult::Error(err),
            }
        };
        let row = match select(mnemonic, &operand, cpu_set(ctx.cpu()), instr.mnemonic_span) {
            Ok(row) => row,
            Err(err) => return EncodeResult::Error(err),
        };
        debug!(mnemonic, mode = ?row.mode, opcode = row.opcode, "encoding");
        ctx.emit(encode(row, bit, operand));
        EncodeResult::Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_mnemonics_resolve_to_base_rows() {
        assert_eq!(resolve_mnemonic("LDA"), Some(("LDA", 0)));
        assert_eq!(resolve_mnemonic("RMB3"), Some(("RMB", 3)));
        assert_eq!(resolve_mnemonic("BBS7"), Some(("BBS", 7)));
        assert_eq!(resolve_mnemonic("BBS8"), None);
        assert_eq!(resolve_mnemonic("RMB"), None);
        assert_eq!(resolve_mnemonic("MOVE"), None);
    }
}
