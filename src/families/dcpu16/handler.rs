// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! DCPU-16 family handler.

use tracing::debug;

use crate::core::context::{AsmContext, Emission};
use crate::core::cpu::{CpuFamily, EncodeError};
use crate::core::expr::Expr;
use crate::core::family::{EncodeResult, FamilyHandler, Instruction};
use crate::core::parser::ExprEnv;
use crate::core::patch::{Endian, Field};

use super::module::FAMILY_ID;
use super::operand::{classify, is_register, Value};
use super::table::{lookup, Format, Opcode};

const WORD: Field = Field::any(2, Endian::Big);

#[derive(Debug, Default)]
pub struct Dcpu16FamilyHandler;

/// `ADD x, -n` and `SUB x, -n` for small n turn into the opposite
/// operation with an inline literal.
fn negate_small(op: &'static Opcode, b: Value) -> (u16, Value) {
    let negatable = matches!(op.mnemonic, "ADD" | "SUB");
    match (negatable, b.literal()) {
        (true, Some(v)) if (0xffe1..=0xffff).contains(&(v as u32 & 0xffff)) => {
            let span = match &b {
                Value::Literal(expr) => expr.span,
                _ => Default::default(),
            };
            let positive = 0x10000 - (v as u32 & 0xffff);
            let opcode = if op.opcode == 0x2 { 0x3 } else { 0x2 };
            (opcode, Value::Literal(Expr::constant(positive as i32, span)))
        }
        _ => (op.opcode, b),
    }
}

fn encode(op: &'static Opcode, mut values: Vec<Value>, optimize: bool) -> Emission {
    let mut em = Emission::new();
    let mut next_words = Vec::new();
    let word = match op.format {
        Format::Basic => {
            let (b, a) = match (values.pop(), values.pop()) {
                (Some(b), Some(a)) => (b, a),
                _ => return em,
            };
            let (opcode, b) = if optimize {
                negate_small(op, b)
            } else {
                (op.opcode, b)
            };
            let (a_code, a_next) = a.code(optimize);
            let (b_code, b_next) = b.code(optimize);
            next_words.extend(a_next);
            next_words.extend(b_next);
            b_code << 10 | a_code << 4 | opcode
        }
        Format::NonBasic => {
            let Some(a) = values.pop() else {
                return em;
            };
            let (a_code, a_next) = a.code(optimize);
            next_words.extend(a_next);
            a_code << 10 | op.opcode << 4
        }
    };
    em.value(word as u32, 2, Endian::Big);
    for expr in next_words {
        em.field(WORD, expr);
    }
    em
}

impl FamilyHandler for Dcpu16FamilyHandler {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn is_register(&self, name: &str) -> bool {
        is_register(&name.to_ascii_uppercase())
    }

    fn encode_instruction(&self, instr: &Instruction<'_>, ctx: &mut AsmContext) -> EncodeResult<()> {
        let Some(op) = lookup(&instr.mnemonic) else {
            return EncodeResult::NotFound;
        };
        if let Err(err) = instr.expect_operands(op.operands.len()) {
            return EncodeResult::Error(err);
        }
        if let Some(span) = instr.size_span {
            ctx.report_error(EncodeError::size("DCPU-16 instructions take no size suffix", span));
        }
        let optimize = ctx.optimize();
        let mut values = Vec::with_capacity(op.operands.len());
        {
            let resolver = ctx.resolver();
            let env = ExprEnv {
                lookup: &resolver,
                pc: ctx.pc_expr(instr.mnemonic_span),
            };
            for (idx, tokens) in instr.operands.iter().enumerate() {
                let value = match classify(tokens, &env, optimize) {
                    Ok(value) => value,
                    Err(err) => return EncodeResult::Error(err),
                };
                if !op.operands[idx].contains(value.kind()) {
                    return EncodeResult::Error(EncodeError::legality(
                        format!("Illegal operand {} for {}", idx + 1, op.mnemonic),
                        instr.operand_span(idx),
                    ));
                }
                values.push(value);
            }
        }
        debug!(mnemonic = op.mnemonic, "encoding");
        ctx.emit(encode(op, values, optimize));
        EncodeResult::Ok(())
    }
}
