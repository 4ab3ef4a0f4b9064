// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Line-at-a-time assembly through one family module, for encoder tests.

use crate::core::assembler::error::Diagnostic;
use crate::core::context::{AsmContext, AsmOptions};
use crate::core::cpu::CpuType;
use crate::core::family::{EncodeResult, Instruction};
use crate::core::parser::split_line;
use crate::core::registry::FamilyModule;
use crate::core::symbol_table::{SymbolTableResult, SymbolValue};
use crate::core::tokenizer::tokenize_line;

/// Assemble `source` at the family's default origin. Labels must start in
/// column one; every other line must be an instruction.
pub(crate) fn assemble_lines(
    module: &dyn FamilyModule,
    cpu: CpuType,
    optimize: bool,
    source: &[&str],
) -> (Vec<u8>, Vec<Diagnostic>) {
    let handler = module.handler();
    let options = AsmOptions {
        optimize,
        ..AsmOptions::default()
    };
    let mut ctx = AsmContext::new(cpu, module.endian(), module.default_origin(), options);
    for (idx, line) in source.iter().enumerate() {
        let line_num = idx as u32 + 1;
        ctx.set_line(line_num);
        let tokens = tokenize_line(line, line_num, module.register_checker()).unwrap();
        let parts = split_line(&tokens).unwrap();
        if let Some((label, _)) = &parts.label {
            let value = SymbolValue::Address {
                section: ctx.current_section(),
                offset: ctx.current_offset(),
            };
            assert_eq!(
                ctx.symbols_mut().add(label, value, false, line_num),
                SymbolTableResult::Ok
            );
        }
        let Some((mnemonic, span)) = parts.mnemonic.clone() else {
            continue;
        };
        let instr = Instruction::new(&mnemonic, span, parts.size.clone(), parts.operands);
        match handler.encode_instruction(&instr, &mut ctx) {
            EncodeResult::Ok(()) => {}
            EncodeResult::Error(err) => ctx.report_error(err),
            EncodeResult::NotFound => panic!("unknown mnemonic {mnemonic}"),
        }
    }
    ctx.finish(module.alignment());
    let bytes = ctx.sections().current().bytes.clone();
    (bytes, ctx.take_diagnostics())
}

/// Assemble and require a clean run.
pub(crate) fn assemble_ok(module: &dyn FamilyModule, cpu: CpuType, source: &[&str]) -> Vec<u8> {
    let (bytes, diags) = assemble_lines(module, cpu, true, source);
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    bytes
}
