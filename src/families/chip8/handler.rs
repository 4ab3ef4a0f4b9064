// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CHIP-8 family handler.

use tracing::debug;

use crate::core::context::{AsmContext, Emission};
use crate::core::cpu::{CpuFamily, EncodeError};
use crate::core::family::{EncodeResult, FamilyHandler, Instruction};
use crate::core::parser::ExprEnv;
use crate::core::patch::{Endian, Field};

use super::module::{cpu_set, FAMILY_ID};
use super::operand::{classify, is_register, Operand};
use super::table::{has_mnemonic, rows_for, Opcode, Slot};

fn merge_byte(existing: u32, value: i32) -> u32 {
    existing | (value as u32 & 0xff)
}

fn merge_addr(existing: u32, value: i32) -> u32 {
    existing | (value as u32 & 0xfff)
}

fn merge_nibble(existing: u32, value: i32) -> u32 {
    existing | (value as u32 & 0xf)
}

fn slot_accepts(slot: Slot, op: &Operand) -> bool {
    match (slot, op) {
        (Slot::Vx | Slot::Vy, Operand::V(..)) => true,
        (Slot::V0, Operand::V(0, _)) => true,
        (Slot::Reg(want), Operand::Special(have, _)) => want == *have,
        (Slot::IndirectI, Operand::IndirectI(_)) => true,
        (Slot::Byte | Slot::Addr | Slot::Nibble, Operand::Imm(_)) => true,
        _ => false,
    }
}

fn row_matches(row: &Opcode, ops: &[Operand]) -> bool {
    row.slots.len() == ops.len() && row.slots.iter().zip(ops).all(|(s, o)| slot_accepts(*s, o))
}

fn encode(row: &Opcode, ops: Vec<Operand>) -> Emission {
    let mut word = u32::from(row.opcode);
    let mut immediate = None;
    for (slot, op) in row.slots.iter().zip(ops) {
        match (slot, op) {
            (Slot::Vx, Operand::V(n, _)) => word |= (n as u32) << 8,
            (Slot::Vy, Operand::V(n, _)) => word |= (n as u32) << 4,
            (Slot::Byte, Operand::Imm(expr)) => {
                immediate = Some((Field::merged(2, Endian::Big, word, -128, 0xff, merge_byte), expr))
            }
            (Slot::Addr, Operand::Imm(expr)) => {
                immediate = Some((Field::merged(2, Endian::Big, word, 0, 0xfff, merge_addr), expr))
            }
            (Slot::Nibble, Operand::Imm(expr)) => {
                immediate = Some((Field::merged(2, Endian::Big, word, 0, 0xf, merge_nibble), expr))
            }
            _ => {}
        }
    }
    let mut em = Emission::new();
    match immediate {
        // Register slots precede the immediate, so `word` is complete here.
        Some((field, expr)) => {
            em.field(field, expr);
        }
        None => {
            em.value(word, 2, Endian::Big);
        }
    }
    em
}

#[derive(Debug, Default)]
pub struct Chip8FamilyHandler;

impl FamilyHandler for Chip8FamilyHandler {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn is_register(&self, name: &str) -> bool {
        is_register(&name.to_ascii_uppercase())
    }

    fn encode_instruction(&self, instr: &Instruction<'_>, ctx: &mut AsmContext) -> EncodeResult<()> {
        let mnemonic = instr.mnemonic.as_str();
        if !has_mnemonic(mnemonic) {
            return EncodeResult::NotFound;
        }
        if let Some(span) = instr.size_span {
            ctx.report_error(EncodeError::size("CHIP-8 instructions take no size suffix", span));
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

        let cpu = cpu_set(ctx.cpu());
        let mut candidates = rows_for(mnemonic).filter(|row| row_matches(row, &ops)).peekable();
        let Some(&first) = candidates.peek() else {
            let span = ops.first().map_or(instr.mnemonic_span, Operand::span);
            return EncodeResult::Error(EncodeError::legality(
                format!("Illegal operands for {mnemonic}"),
                span,
            ));
        };
        let Some(row) = candidates.find(|row| row.cpus & cpu != 0) else {
            return EncodeResult::Error(EncodeError::cpu(
                format!("{} form needs SUPER-CHIP", first.mnemonic),
                instr.mnemonic_span,
            ));
        };
        debug!(mnemonic, opcode = row.opcode, "encoding");
        ctx.emit(encode(row, ops));
        EncodeResult::Ok(())
    }
}
