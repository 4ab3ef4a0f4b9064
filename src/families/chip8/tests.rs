// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use crate::core::assembler::error::AsmErrorKind;
use crate::core::cpu::CpuType;
use crate::families::test_support::{assemble_lines, assemble_ok};

use super::module::{Chip8FamilyModule, CPU_CHIP8, CPU_SCHIP};

fn assemble(source: &[&str]) -> Vec<u8> {
    assemble_ok(&Chip8FamilyModule, CPU_CHIP8, source)
}

fn first_error(cpu: CpuType, source: &[&str]) -> (Vec<u8>, AsmErrorKind) {
    let (bytes, diags) = assemble_lines(&Chip8FamilyModule, cpu, true, source);
    assert_eq!(diags.len(), 1, "diagnostics: {:?}", diags);
    (bytes, diags[0].kind())
}

#[test]
fn register_forms() {
    assert_eq!(assemble(&["  CLS"]), vec![0x00, 0xE0]);
    assert_eq!(assemble(&["  LD V1, $2A"]), vec![0x61, 0x2A]);
    assert_eq!(assemble(&["  ADD V1, V2"]), vec![0x81, 0x24]);
    assert_eq!(assemble(&["  DRW V0, V1, 5"]), vec![0xD0, 0x15]);
}

#[test]
fn index_register_forms() {
    assert_eq!(assemble(&["  LD I, $300"]), vec![0xA3, 0x00]);
    assert_eq!(assemble(&["  LD [I], V3"]), vec![0xF3, 0x55]);
    assert_eq!(assemble(&["  LD V3, [I]"]), vec![0xF3, 0x65]);
    assert_eq!(assemble(&["  JP V0, $400"]), vec![0xB4, 0x00]);
}

#[test]
fn forward_jump_starts_at_program_origin() {
    assert_eq!(
        assemble(&["  JP end", "  CLS", "end RET"]),
        vec![0x12, 0x04, 0x00, 0xE0, 0x00, 0xEE]
    );
}

#[test]
fn superchip_extensions() {
    assert_eq!(
        assemble_ok(&Chip8FamilyModule, CPU_SCHIP, &["  SCD 4", "  LD HF, V2"]),
        vec![0x00, 0xC4, 0xF2, 0x30]
    );
    let (bytes, kind) = first_error(CPU_CHIP8, &["  SCD 4"]);
    assert_eq!(kind, AsmErrorKind::Cpu);
    assert!(bytes.is_empty());
}

#[test]
fn byte_immediate_out_of_range() {
    let (bytes, kind) = first_error(CPU_CHIP8, &["  LD V1, 300"]);
    assert_eq!(kind, AsmErrorKind::Range);
    assert_eq!(bytes.len(), 2);
}

#[test]
fn delay_timer_takes_only_a_register() {
    let (bytes, kind) = first_error(CPU_CHIP8, &["  LD DT, 5"]);
    assert_eq!(kind, AsmErrorKind::Legality);
    assert!(bytes.is_empty());
}
