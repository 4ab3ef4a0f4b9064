// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! RISC-V family handler: base formats and the common pseudo-instructions.

use tracing::debug;

use crate::core::context::{AsmContext, Emission, PcAnchor};
use crate::core::cpu::{CpuFamily, EncodeError};
use crate::core::expr::{fits_signed, Expr};
use crate::core::family::{EncodeResult, FamilyHandler, Instruction};
use crate::core::parser::ExprEnv;
use crate::core::patch::{Endian, Field};
use crate::core::tokenizer::Span;

use super::module::{cpu_extensions, FAMILY_ID};
use super::operand::{classify, is_register, Operand};
use super::table::{lookup, Format, Opcode};

const LE: Endian = Endian::Little;
const WIDE_LOW: i64 = i32::MIN as i64;
const WIDE_HIGH: i64 = u32::MAX as i64;

const RA: u8 = 1;

fn merge_i(existing: u32, value: i32) -> u32 {
    existing | (value as u32 & 0xfff) << 20
}

fn merge_s(existing: u32, value: i32) -> u32 {
    let v = value as u32;
    existing | (v >> 5 & 0x7f) << 25 | (v & 0x1f) << 7
}

fn merge_b(existing: u32, value: i32) -> u32 {
    let v = value as u32;
    existing | (v >> 12 & 1) << 31 | (v >> 5 & 0x3f) << 25 | (v >> 1 & 0xf) << 8 | (v >> 11 & 1) << 7
}

fn merge_u(existing: u32, value: i32) -> u32 {
    existing | (value as u32 & 0xfffff) << 12
}

fn merge_j(existing: u32, value: i32) -> u32 {
    let v = value as u32;
    existing
        | (v >> 20 & 1) << 31
        | (v >> 1 & 0x3ff) << 21
        | (v >> 11 & 1) << 20
        | (v >> 12 & 0xff) << 12
}

fn merge_shamt(existing: u32, value: i32) -> u32 {
    existing | (value as u32 & 0x1f) << 20
}

/// Upper 20 bits, rounded so the sign-extended low 12 bits add back up.
fn merge_hi(existing: u32, value: i32) -> u32 {
    existing | (value as u32).wrapping_add(0x800) & 0xffff_f000
}

fn imm_i(base: u32) -> Field {
    Field::merged(4, LE, base, -2048, 2047, merge_i)
}

fn imm_s(base: u32) -> Field {
    Field::merged(4, LE, base, -2048, 2047, merge_s)
}

fn imm_b(base: u32) -> Field {
    Field::merged(4, LE, base, -4096, 4095, merge_b)
}

fn imm_j(base: u32) -> Field {
    Field::merged(4, LE, base, -(1 << 20), (1 << 20) - 1, merge_j)
}

fn imm_u(base: u32) -> Field {
    Field::merged(4, LE, base, -(1 << 19), 0xfffff, merge_u)
}

fn hi(base: u32) -> Field {
    Field::merged(4, LE, base, WIDE_LOW, WIDE_HIGH, merge_hi)
}

fn lo(base: u32) -> Field {
    Field::merged(4, LE, base, WIDE_LOW, WIDE_HIGH, merge_i)
}

fn rd(n: u8) -> u32 {
    (n as u32) << 7
}

fn rs1(n: u8) -> u32 {
    (n as u32) << 15
}

fn rs2(n: u8) -> u32 {
    (n as u32) << 20
}

fn x(n: u8) -> Operand {
    Operand::Reg(n, Span::default())
}

fn imm(value: i32, span: Span) -> Operand {
    Operand::Imm(Expr::constant(value, span))
}

/// Encoding state of one source instruction.
struct Enc {
    span: Span,
    /// Address of the instruction, if its section is placed.
    pc: Option<u32>,
}

impl Enc {
    /// Branch and jump offsets must be even.
    fn check_aligned(&self, target: &Expr) -> Result<(), EncodeError> {
        if let (Some(t), Some(pc)) = (target.value(), self.pc) {
            if (t as u32).wrapping_sub(pc) & 1 != 0 {
                return Err(EncodeError::range(
                    "Branch target must be 2-byte aligned",
                    target.span,
                ));
            }
        }
        Ok(())
    }

    fn relative(&self, field: Field, target: &Expr) -> Result<Emission, EncodeError> {
        self.check_aligned(target)?;
        let mut em = Emission::new();
        em.relative(field, target.clone(), PcAnchor::InstructionStart, 0);
        Ok(em)
    }

    fn encode(&self, op: &Opcode, ops: &[Operand]) -> Result<Emission, EncodeError> {
        let word = op.word;
        let mut em = Emission::new();
        match (op.format, ops) {
            (Format::R, [Operand::Reg(d, _), Operand::Reg(s1, _), Operand::Reg(s2, _)]) => {
                em.value(word | rd(*d) | rs1(*s1) | rs2(*s2), 4, LE);
            }
            (Format::I, [Operand::Reg(d, _), Operand::Reg(s1, _), Operand::Imm(value)]) => {
                em.field(imm_i(word | rd(*d) | rs1(*s1)), value.clone());
            }
            (Format::Shift, [Operand::Reg(d, _), Operand::Reg(s1, _), Operand::Imm(shamt)]) => {
                let field = Field::merged(4, LE, word | rd(*d) | rs1(*s1), 0, 31, merge_shamt);
                em.field(field, shamt.clone());
            }
            (Format::Load, [Operand::Reg(d, _), Operand::Mem(offset, s1, _)]) => {
                em.field(imm_i(word | rd(*d) | rs1(*s1)), offset.clone());
            }
            (Format::Store, [Operand::Reg(s2, _), Operand::Mem(offset, s1, _)]) => {
                em.field(imm_s(word | rs1(*s1) | rs2(*s2)), offset.clone());
            }
            (Format::Branch, [Operand::Reg(s1, _), Operand::Reg(s2, _), Operand::Imm(target)]) => {
                return self.relative(imm_b(word | rs1(*s1) | rs2(*s2)), target);
            }
            (Format::Upper, [Operand::Reg(d, _), Operand::Imm(value)]) => {
                em.field(imm_u(word | rd(*d)), value.clone());
            }
            (Format::Jump, [Operand::Reg(d, _), Operand::Imm(target)]) => {
                return self.relative(imm_j(word | rd(*d)), target);
            }
            (Format::Jump, [Operand::Imm(target)]) => {
                return self.relative(imm_j(word | rd(RA)), target);
            }
            (Format::JumpReg, [Operand::Reg(d, _), Operand::Mem(offset, s1, _)])
            | (Format::JumpReg, [Operand::Reg(d, _), Operand::Reg(s1, _), Operand::Imm(offset)]) => {
                em.field(imm_i(word | rd(*d) | rs1(*s1)), offset.clone());
            }
            (Format::JumpReg, [Operand::Reg(s1, _)]) => {
                em.value(word | rd(RA) | rs1(*s1), 4, LE);
            }
            (Format::Fixed, []) => {
                em.value(word, 4, LE);
            }
            _ => {
                let span = ops.first().map_or(self.span, Operand::span);
                return Err(EncodeError::legality(
                    format!("Illegal operands for {}", op.mnemonic),
                    span,
                ));
            }
        }
        Ok(em)
    }

    fn base(&self, mnemonic: &str, ops: &[Operand]) -> Result<Emission, EncodeError> {
        match lookup(mnemonic) {
            Some(op) => self.encode(op, ops),
            None => Err(EncodeError::syntax(
                format!("Unknown instruction {mnemonic}"),
                self.span,
            )),
        }
    }

    /// `rd = value` as LUI+ADDI.
    fn load_wide(&self, d: u8, value: &Expr) -> Emission {
        let mut em = Emission::new();
        em.field(hi(0x37 | rd(d)), value.clone());
        em.field(lo(0x13 | rd(d) | rs1(d)), value.clone());
        em
    }

    /// Expand a pseudo-instruction; `None` if `mnemonic` is not one.
    fn pseudo(&self, mnemonic: &str, ops: &[Operand]) -> Option<Result<Emission, EncodeError>> {
        let span = self.span;
        let result = match (mnemonic, ops) {
            ("NOP", []) => self.base("ADDI", &[x(0), x(0), imm(0, span)]),
            ("MV", [d, s]) => self.base("ADDI", &[d.clone(), s.clone(), imm(0, span)]),
            ("NOT", [d, s]) => self.base("XORI", &[d.clone(), s.clone(), imm(-1, span)]),
            ("NEG", [d, s]) => self.base("SUB", &[d.clone(), x(0), s.clone()]),
            ("SEQZ", [d, s]) => self.base("SLTIU", &[d.clone(), s.clone(), imm(1, span)]),
            ("SNEZ", [d, s]) => self.base("SLTU", &[d.clone(), x(0), s.clone()]),
            ("BEQZ", [s, t]) => self.base("BEQ", &[s.clone(), x(0), t.clone()]),
            ("BNEZ", [s, t]) => self.base("BNE", &[s.clone(), x(0), t.clone()]),
            ("J", [t]) => self.base("JAL", &[x(0), t.clone()]),
            ("JR", [s]) => self.base("JALR", &[x(0), s.clone(), imm(0, span)]),
            ("RET", []) => self.base("JALR", &[x(0), x(RA), imm(0, span)]),
            ("LI", [Operand::Reg(d, _), Operand::Imm(value)]) => match value.value() {
                Some(v) if fits_signed(v as i64, 12) => {
                    self.base("ADDI", &[x(*d), x(0), Operand::Imm(value.clone())])
                }
                _ => Ok(self.load_wide(*d, value)),
            },
            ("LA", [Operand::Reg(d, _), Operand::Imm(value)]) => Ok(self.load_wide(*d, value)),
            ("CALL", [Operand::Imm(target)]) => {
                let mut em = Emission::new();
                em.relative(hi(0x17 | rd(RA)), target.clone(), PcAnchor::InstructionStart, 0);
                em.relative(
                    lo(0x67 | rd(RA) | rs1(RA)),
                    target.clone(),
                    PcAnchor::InstructionStart,
                    0,
                );
                Ok(em)
            }
            ("NOP" | "MV" | "NOT" | "NEG" | "SEQZ" | "SNEZ" | "BEQZ" | "BNEZ" | "J" | "JR"
            | "RET" | "LI" | "LA" | "CALL", _) => Err(EncodeError::legality(
                format!("Illegal operands for {mnemonic}"),
                ops.first().map_or(span, Operand::span),
            )),
            _ => return None,
        };
        Some(result)
    }
}

pub fn is_pseudo(mnemonic: &str) -> bool {
    matches!(
        mnemonic,
        "NOP" | "MV" | "NOT" | "NEG" | "SEQZ" | "SNEZ" | "BEQZ" | "BNEZ" | "J" | "JR" | "RET"
            | "LI" | "LA" | "CALL"
    )
}

#[derive(Debug, Default)]
pub struct RiscvFamilyHandler;

impl FamilyHandler for RiscvFamilyHandler {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn is_register(&self, name: &str) -> bool {
        is_register(name)
    }

    fn encode_instruction(&self, instr: &Instruction<'_>, ctx: &mut AsmContext) -> EncodeResult<()> {
        let mnemonic = instr.mnemonic.as_str();
        let row = lookup(mnemonic);
        if row.is_none() && !is_pseudo(mnemonic) {
            return EncodeResult::NotFound;
        }
        if let Some(row) = row {
            if row.ext & cpu_extensions(ctx.cpu()) == 0 {
                return EncodeResult::Error(EncodeError::cpu(
                    format!("{mnemonic} needs the M extension"),
                    instr.mnemonic_span,
                ));
            }
        }
        if let Some(span) = instr.size_span {
            ctx.report_error(EncodeError::size("RISC-V instructions take no size suffix", span));
        }

        let mut ops = Vec::with_capacity(instr.operands.len());
        {
            let resolver = ctx.resolver();
            let env = ExprEnv {
                lookup: &resolver,
                pc: ctx.pc_expr(instr.mnemonic_span),
            };
            for tokens in &instr.operands {
                match classify(tokens, &env) {
                    Ok(op) => ops.push(op),
                    Err(err) => return EncodeResult::Error(err),
                }
            }
        }

        let enc = Enc {
            span: instr.mnemonic_span,
            pc: ctx.current_pc(),
        };
        let result = match row {
            Some(row) => enc.encode(row, &ops),
            None => match enc.pseudo(mnemonic, &ops) {
                Some(result) => result,
                None => return EncodeResult::NotFound,
            },
        };
        debug!(mnemonic, operands = ops.len(), "encoding");
        match result {
            Ok(em) => {
                ctx.emit(em);
                EncodeResult::Ok(())
            }
            Err(err) => EncodeResult::Error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scattered_immediates() {
        // beq x0,x0,-4
        assert_eq!(merge_b(0x0000_0063, -4), 0xfe00_0ee3);
        // jal x0,8
        assert_eq!(merge_j(0x0000_006f, 8), 0x0080_006f);
        // sw with offset 12
        assert_eq!(merge_s(0x0000_2023, 12), 0x0000_2623);
    }

    #[test]
    fn hi_lo_split_rounds() {
        let value = 0x1234_5fff_u32 as i32;
        let upper = merge_hi(0, value);
        let lower = ((value as u32 & 0xfff) ^ 0x800) as i32 - 0x800;
        assert_eq!(upper.wrapping_add(lower as u32), value as u32);
        assert_eq!(upper, 0x1234_6000);
    }
}
