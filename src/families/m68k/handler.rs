// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! 680x0 family handler.

use tracing::debug;

use crate::core::context::AsmContext;
use crate::core::cpu::{CpuFamily, EncodeError};
use crate::core::family::{EncodeResult, FamilyHandler, Instruction};
use crate::core::parser::ExprEnv;

use super::classifier::Classifier;
use super::module::{cpu_features, FAMILY_ID};
use super::operand::{condition_code, fpu_condition, is_register, Size};
use super::table::{dispatch, has_mnemonic, Enc, FULL_EXT};

pub struct M68kFamilyHandler;

/// Map a source mnemonic to its table mnemonic and condition code.
fn resolve_mnemonic(mnemonic: &str) -> Option<(&str, u16)> {
    if has_mnemonic(mnemonic) && !mnemonic.ends_with("cc") {
        return Some((mnemonic, 0));
    }
    match mnemonic {
        "BRA" => return Some(("Bcc", 0)),
        "BSR" => return Some(("Bcc", 1)),
        "DBRA" => return Some(("DBcc", 1)),
        "FBRA" => return Some(("FBcc", 15)),
        _ => {}
    }
    if let Some(cc) = mnemonic.strip_prefix("DB").and_then(condition_code) {
        return Some(("DBcc", cc));
    }
    if let Some(cc) = mnemonic.strip_prefix("FB").and_then(fpu_condition) {
        return Some(("FBcc", cc));
    }
    // BT and BF would collide with BRA and BSR
    if let Some(cc) = mnemonic.strip_prefix('B').and_then(condition_code) {
        return (cc >= 2).then_some(("Bcc", cc));
    }
    if let Some(cc) = mnemonic.strip_prefix('S').and_then(condition_code) {
        return Some(("Scc", cc));
    }
    None
}

impl FamilyHandler for M68kFamilyHandler {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn is_register(&self, name: &str) -> bool {
        is_register(&name.to_ascii_uppercase())
    }

    fn encode_instruction(&self, instr: &Instruction<'_>, ctx: &mut AsmContext) -> EncodeResult<()> {
        let Some((mnemonic, cond)) = resolve_mnemonic(&instr.mnemonic) else {
            return EncodeResult::NotFound;
        };
        let cpu = cpu_features(ctx.cpu());
        let optimize = ctx.optimize();

        let mut operands = Vec::with_capacity(instr.operands.len());
        {
            let resolver = ctx.resolver();
            let env = ExprEnv {
                lookup: &resolver,
                pc: ctx.pc_expr(instr.mnemonic_span),
            };
            let classifier = Classifier::new(&env, cpu & FULL_EXT != 0, optimize);
            for tokens in &instr.operands {
                match classifier.classify(tokens) {
                    Ok(ops) => operands.extend(ops),
                    Err(err) => return EncodeResult::Error(err),
                }
            }
        }

        let size = match (&instr.size, instr.size_span) {
            (Some(suffix), span) => {
                let size = Size::from_suffix(suffix);
                if size.is_none() {
                    ctx.report_error(EncodeError::size(
                        format!("Unknown size .{suffix}"),
                        span.unwrap_or(instr.mnemonic_span),
                    ));
                }
                size
            }
            (None, _) => None,
        };

        let mut enc = Enc::new(cpu, optimize, instr.mnemonic_span);
        enc.size_span = instr.size_span;
        enc.pc = ctx.current_pc();
        enc.cond = cond;
        debug!(mnemonic = %instr.mnemonic, operands = operands.len(), "encoding");
        let result = dispatch(&mut enc, mnemonic, size, &operands);
        for report in enc.reports.drain(..) {
            ctx.report_error(report);
        }
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
    fn condition_mnemonics_resolve_to_pseudo_rows() {
        assert_eq!(resolve_mnemonic("BNE"), Some(("Bcc", 6)));
        assert_eq!(resolve_mnemonic("BRA"), Some(("Bcc", 0)));
        assert_eq!(resolve_mnemonic("BSR"), Some(("Bcc", 1)));
        assert_eq!(resolve_mnemonic("DBRA"), Some(("DBcc", 1)));
        assert_eq!(resolve_mnemonic("DBEQ"), Some(("DBcc", 7)));
        assert_eq!(resolve_mnemonic("SNE"), Some(("Scc", 6)));
        assert_eq!(resolve_mnemonic("ST"), Some(("Scc", 0)));
        assert_eq!(resolve_mnemonic("FBGT"), Some(("FBcc", 18)));
        assert_eq!(resolve_mnemonic("BTST"), Some(("BTST", 0)));
        assert_eq!(resolve_mnemonic("BT"), None);
        assert_eq!(resolve_mnemonic("Bcc"), None);
        assert_eq!(resolve_mnemonic("FROB"), None);
    }
}
