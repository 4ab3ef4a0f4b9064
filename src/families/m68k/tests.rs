// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use crate::core::assembler::error::{AsmErrorKind, Diagnostic};
use crate::core::cpu::CpuType;
use crate::families::test_support::{assemble_lines, assemble_ok};

use super::module::{M68kFamilyModule, CPU_68000, CPU_68020};

fn assemble_with(cpu: CpuType, optimize: bool, source: &[&str]) -> (Vec<u8>, Vec<Diagnostic>) {
    assemble_lines(&M68kFamilyModule, cpu, optimize, source)
}

fn assemble(source: &[&str]) -> Vec<u8> {
    assemble_ok(&M68kFamilyModule, CPU_68020, source)
}

#[test]
fn move_long_immediate_to_data_register() {
    assert_eq!(
        assemble(&["  MOVE.L #$1234,D0"]),
        vec![0x20, 0x3C, 0x00, 0x00, 0x12, 0x34]
    );
}

#[test]
fn moveq_and_inherent_instructions() {
    assert_eq!(
        assemble(&["  MOVEQ #5,D1", "  NOP", "  RTS"]),
        vec![0x72, 0x05, 0x4E, 0x71, 0x4E, 0x75]
    );
}

#[test]
fn small_add_immediates_become_quick() {
    assert_eq!(assemble(&["  ADD.W #8,D0"]), vec![0x50, 0x40]);
    assert_eq!(
        assemble(&["  ADD.L #9,D0"]),
        vec![0x06, 0x80, 0x00, 0x00, 0x00, 0x09]
    );
    assert_eq!(assemble(&["  ADD.W #-3,D0"]), vec![0x57, 0x40]);
}

#[test]
fn quick_rewrite_is_skipped_without_optimization() {
    let (bytes, diags) = assemble_with(CPU_68000, false, &["  ADD.W #8,D0"]);
    assert!(diags.is_empty());
    assert_eq!(bytes, vec![0x06, 0x40, 0x00, 0x08]);
}

#[test]
fn short_branch_backward() {
    assert_eq!(
        assemble(&["loop NOP", "  BRA.S loop"]),
        vec![0x4E, 0x71, 0x60, 0xFC]
    );
}

#[test]
fn forward_branch_is_patched() {
    assert_eq!(
        assemble(&["  BRA fwd", "  NOP", "fwd NOP"]),
        vec![0x60, 0x00, 0x00, 0x04, 0x4E, 0x71, 0x4E, 0x71]
    );
}

#[test]
fn jump_to_data_register_is_illegal() {
    let (bytes, diags) = assemble_with(CPU_68000, true, &["  JSR D0"]);
    assert!(bytes.is_empty());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind(), AsmErrorKind::Legality);
}

#[test]
fn zero_displacement_folds_to_indirect() {
    assert_eq!(assemble(&["  LEA (0,A0),A1"]), vec![0x43, 0xD0]);
}

#[test]
fn brief_index_extension_word() {
    assert_eq!(
        assemble(&["  MOVE.W (4,A0,D1.W),D2"]),
        vec![0x34, 0x30, 0x10, 0x04]
    );
}

#[test]
fn fpu_register_forms() {
    assert_eq!(assemble(&["  FMOVE.X FP0,FP1"]), vec![0xF2, 0x00, 0x00, 0x80]);
    assert_eq!(assemble(&["  FADD.L D0,FP2"]), vec![0xF2, 0x00, 0x41, 0x22]);
}

#[test]
fn fpu_on_plain_68000_is_reported_but_encoded() {
    let (bytes, diags) = assemble_with(CPU_68000, true, &["  FMOVE.X FP0,FP1"]);
    assert_eq!(bytes, vec![0xF2, 0x00, 0x00, 0x80]);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind(), AsmErrorKind::Cpu);
}

#[test]
fn undefined_branch_target_is_unresolved() {
    let (bytes, diags) = assemble_with(CPU_68000, true, &["  BRA nowhere"]);
    assert_eq!(bytes.len(), 4);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind(), AsmErrorKind::Unresolved);
}

fn kinds(diags: &[Diagnostic]) -> Vec<AsmErrorKind> {
    diags.iter().map(Diagnostic::kind).collect()
}

#[test]
fn move_long_immediate_fields_decode_back() {
    let bytes = assemble(&["  MOVE.L #$1234,D0"]);
    let word = u16::from_be_bytes([bytes[0], bytes[1]]);
    assert_eq!(word >> 14, 0, "MOVE family");
    assert_eq!((word >> 12) & 3, 2, "long size");
    assert_eq!((word >> 9) & 7, 0, "destination register");
    assert_eq!((word >> 6) & 7, 0, "destination is a data register");
    assert_eq!(word & 0x3f, 0x3c, "immediate source");
    assert_eq!(u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]), 0x1234);
}

#[test]
fn moveq_range_edges() {
    assert_eq!(assemble(&["  MOVEQ #-128,D0"]), vec![0x70, 0x80]);
    assert_eq!(assemble(&["  MOVE.L #-128,D3"]), vec![0x76, 0x80]);
    assert_eq!(
        assemble(&["  MOVE.L #128,D0"]),
        vec![0x20, 0x3C, 0x00, 0x00, 0x00, 0x80]
    );

    let (bytes, diags) = assemble_with(CPU_68000, true, &["  MOVEQ #128,D0"]);
    assert_eq!(bytes, vec![0x70, 0x80]);
    assert_eq!(kinds(&diags), vec![AsmErrorKind::Range]);
}

#[test]
fn negative_quick_boundary() {
    assert_eq!(assemble(&["  ADD.W #-8,D0"]), vec![0x51, 0x40]);
    assert_eq!(
        assemble(&["  ADD.W #-9,D0"]),
        vec![0x06, 0x40, 0xFF, 0xF7]
    );
    assert_eq!(assemble(&["  SUB.W #-8,D1"]), vec![0x50, 0x41]);
}

#[test]
fn address_register_adds_become_quick() {
    assert_eq!(assemble(&["  ADDA.W #4,A0"]), vec![0x58, 0x48]);
    assert_eq!(assemble(&["  ADDA.L #-2,A1"]), vec![0x55, 0x89]);
    assert_eq!(assemble(&["  ADD.L #4,A0"]), vec![0x58, 0x88]);
    assert_eq!(
        assemble(&["  ADDA.L #100,A0"]),
        vec![0xD1, 0xFC, 0x00, 0x00, 0x00, 0x64]
    );

    let (bytes, diags) = assemble_with(CPU_68000, false, &["  ADDA.W #4,A0"]);
    assert!(diags.is_empty());
    assert_eq!(bytes, vec![0xD0, 0xFC, 0x00, 0x04]);
}

#[test]
fn compare_with_immediate_uses_cmpi() {
    assert_eq!(assemble(&["  CMP.W #5,D0"]), vec![0x0C, 0x40, 0x00, 0x05]);
    assert_eq!(assemble(&["  CMP.W D1,D0"]), vec![0xB0, 0x41]);
    assert_eq!(assemble(&["  CMP.W #5,A0"]), vec![0xB0, 0xFC, 0x00, 0x05]);
}

#[test]
fn bit_operations_static_and_dynamic() {
    assert_eq!(assemble(&["  BTST #3,D0"]), vec![0x08, 0x00, 0x00, 0x03]);
    assert_eq!(assemble(&["  BSET D1,(A0)"]), vec![0x03, 0xD0]);
    assert_eq!(assemble(&["  BCHG #7,(A1)+"]), vec![0x08, 0x59, 0x00, 0x07]);

    let (bytes, diags) = assemble_with(CPU_68000, true, &["  BCLR #8,(A0)"]);
    assert_eq!(bytes, vec![0x08, 0x90, 0x00, 0x08]);
    assert_eq!(kinds(&diags), vec![AsmErrorKind::Range]);
}

#[test]
fn word_displacement_limit_depends_on_cpu() {
    assert_eq!(
        assemble(&["  MOVE.W (32767,A0),D0"]),
        vec![0x30, 0x28, 0x7F, 0xFF]
    );
    assert_eq!(
        assemble(&["  MOVE.W (32768,A0),D0"]),
        vec![0x30, 0x30, 0x01, 0x70, 0x00, 0x00, 0x80, 0x00]
    );

    let (bytes, diags) = assemble_with(CPU_68000, true, &["  MOVE.W (32768,A0),D0"]);
    assert_eq!(bytes, vec![0x30, 0x28, 0x80, 0x00]);
    assert_eq!(kinds(&diags), vec![AsmErrorKind::Range]);
}

#[test]
fn absolute_address_size_follows_value() {
    assert_eq!(assemble(&["  MOVE.W $7FFF,D0"]), vec![0x30, 0x38, 0x7F, 0xFF]);
    assert_eq!(
        assemble(&["  MOVE.W $8000,D0"]),
        vec![0x30, 0x39, 0x00, 0x00, 0x80, 0x00]
    );
}

#[test]
fn pc_displacement_counts_from_extension_word() {
    assert_eq!(
        assemble(&["  LEA (msg,PC),A0", "  NOP", "msg NOP"]),
        vec![0x41, 0xFA, 0x00, 0x04, 0x4E, 0x71, 0x4E, 0x71]
    );
    assert_eq!(
        assemble(&["msg NOP", "  MOVE.W msg(PC),D1"]),
        vec![0x4E, 0x71, 0x32, 0x3A, 0xFF, 0xFC]
    );
}

#[test]
fn pc_indexed_brief_and_full_formats() {
    assert_eq!(
        assemble(&["table NOP", "  LEA (table,PC,D0.W),A0"]),
        vec![0x4E, 0x71, 0x41, 0xFB, 0x00, 0xFC]
    );

    let (bytes, diags) =
        assemble_with(CPU_68000, true, &["  LEA (tbl,PC,D1.L),A1", "  NOP", "tbl NOP"]);
    assert!(diags.is_empty());
    assert_eq!(bytes, vec![0x43, 0xFB, 0x18, 0x04, 0x4E, 0x71, 0x4E, 0x71]);

    // forward target on a full-format CPU: word base displacement
    assert_eq!(
        assemble(&["  LEA (tbl,PC,D1.L),A1", "  NOP", "tbl NOP"]),
        vec![0x43, 0xFB, 0x19, 0x20, 0x00, 0x04, 0x4E, 0x71, 0x4E, 0x71]
    );
}

#[test]
fn memory_indirect_extension_words() {
    assert_eq!(
        assemble(&["  MOVE.L ([4,A0,D1.W],8),D2"]),
        vec![0x24, 0x30, 0x11, 0x22, 0x00, 0x04, 0x00, 0x08]
    );
    assert_eq!(
        assemble(&["  MOVE.L ([4,A0],D1.W,8),D2"]),
        vec![0x24, 0x30, 0x11, 0x26, 0x00, 0x04, 0x00, 0x08]
    );
    assert_eq!(
        assemble(&["  JMP ([$1000])"]),
        vec![0x4E, 0xF0, 0x01, 0xE1, 0x10, 0x00]
    );
}

#[test]
fn memory_indirect_needs_full_format_cpu() {
    let (_, diags) = assemble_with(CPU_68000, true, &["  JMP ([$1000])"]);
    assert!(!diags.is_empty());
    assert!(diags
        .iter()
        .all(|d| matches!(d.kind(), AsmErrorKind::Legality | AsmErrorKind::Cpu)));
}

#[test]
fn movem_masks() {
    assert_eq!(
        assemble(&["  MOVEM.L D0-D2/A6,-(A7)"]),
        vec![0x48, 0xE7, 0xE0, 0x02]
    );
    assert_eq!(
        assemble(&["  MOVEM.L (A7)+,D0-D2/A6"]),
        vec![0x4C, 0xDF, 0x40, 0x07]
    );
    assert_eq!(
        assemble(&["  MOVEM.W D0/A1,(A0)"]),
        vec![0x48, 0x90, 0x02, 0x01]
    );
}

#[test]
fn bitfield_extension_words() {
    assert_eq!(
        assemble(&["  BFEXTU (A0){4:8},D1"]),
        vec![0xE9, 0xD0, 0x11, 0x08]
    );
    assert_eq!(assemble(&["  BFSET D0{D1:D2}"]), vec![0xEE, 0xC0, 0x08, 0x62]);
    assert_eq!(
        assemble(&["  BFINS D3,(A1){0:32}"]),
        vec![0xEF, 0xD1, 0x30, 0x00]
    );
}

#[test]
fn long_multiply_and_divide() {
    assert_eq!(assemble(&["  MULS.L D0,D1"]), vec![0x4C, 0x00, 0x18, 0x01]);
    assert_eq!(assemble(&["  MULU.L D2,D3:D4"]), vec![0x4C, 0x02, 0x44, 0x03]);
    assert_eq!(assemble(&["  DIVS.L D0,D1"]), vec![0x4C, 0x40, 0x18, 0x01]);
    assert_eq!(assemble(&["  DIVUL.L D0,D2:D3"]), vec![0x4C, 0x40, 0x30, 0x02]);
    assert_eq!(assemble(&["  DIVS.L D0,D2:D3"]), vec![0x4C, 0x40, 0x3C, 0x02]);
    assert_eq!(assemble(&["  MULU.W D1,D0"]), vec![0xC0, 0xC1]);
}

#[test]
fn pc_relative_target_fifty_lines_later() {
    let mut source = vec!["  LEA (far,PC),A0"];
    source.extend(std::iter::repeat("  NOP").take(49));
    source.push("far NOP");
    let bytes = assemble(&source);

    // far = 4 + 49 * 2; PC is the extension word at 2
    assert_eq!(bytes[..4].to_vec(), vec![0x41, 0xFA, 0x00, 0x64]);
    assert_eq!(bytes.len(), 4 + 50 * 2);
    assert!(bytes[4..].chunks(2).all(|w| w == [0x4E, 0x71].as_slice()));
}

#[test]
fn illegal_operand_does_not_stop_the_next_line() {
    let (bytes, diags) = assemble_with(CPU_68000, true, &["  JSR D0", "  NOP"]);
    assert_eq!(bytes, vec![0x4E, 0x71]);
    assert_eq!(kinds(&diags), vec![AsmErrorKind::Legality]);
    assert_eq!(diags[0].line(), 1);
}

#[test]
fn short_branch_to_next_instruction_is_reported() {
    for cpu in [CPU_68000, CPU_68020] {
        let (bytes, diags) = assemble_with(cpu, true, &["  BRA.S fwd", "fwd NOP"]);
        assert_eq!(bytes, vec![0x60, 0x00, 0x4E, 0x71]);
        assert_eq!(kinds(&diags), vec![AsmErrorKind::Range]);
        assert_eq!(diags[0].line(), 1);
    }

    let (bytes, diags) = assemble_with(CPU_68000, true, &["  BRA.S 2"]);
    assert_eq!(bytes, vec![0x60, 0x00]);
    assert_eq!(kinds(&diags), vec![AsmErrorKind::Range]);
    assert_eq!(diags[0].message(), "Value 0 cannot be encoded in this field");
}

#[test]
fn short_branch_of_minus_one_needs_a_16_bit_cpu() {
    let (bytes, diags) = assemble_with(CPU_68000, true, &["  BRA.S 1"]);
    assert!(diags.is_empty());
    assert_eq!(bytes, vec![0x60, 0xFF]);

    let (bytes, diags) = assemble_with(CPU_68020, true, &["  BRA.S 1"]);
    assert_eq!(bytes, vec![0x60, 0xFF]);
    assert_eq!(kinds(&diags), vec![AsmErrorKind::Range]);
}

#[test]
fn unsized_branch_to_next_instruction_takes_word_form() {
    assert_eq!(assemble(&["  BRA 2"]), vec![0x60, 0x00, 0x00, 0x00]);
}
