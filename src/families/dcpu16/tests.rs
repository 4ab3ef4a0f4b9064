// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use crate::core::assembler::error::AsmErrorKind;
use crate::families::test_support::{assemble_lines, assemble_ok};

use super::module::{Dcpu16FamilyModule, CPU_DCPU16};

fn assemble(source: &[&str]) -> Vec<u8> {
    assemble_ok(&Dcpu16FamilyModule, CPU_DCPU16, source)
}

#[test]
fn next_word_literal_and_memory() {
    assert_eq!(assemble(&["  SET A, $30"]), vec![0x7C, 0x01, 0x00, 0x30]);
    assert_eq!(
        assemble(&["  SET [$1000], $20"]),
        vec![0x7D, 0xE1, 0x10, 0x00, 0x00, 0x20]
    );
    assert_eq!(assemble(&["  SUB A, [$1000]"]), vec![0x78, 0x03, 0x10, 0x00]);
}

#[test]
fn small_literals_are_inlined() {
    assert_eq!(assemble(&["  IFN A, $10"]), vec![0xC0, 0x0D]);
    assert_eq!(assemble(&["  SET I, 10"]), vec![0xA8, 0x61]);
}

#[test]
fn indexed_and_indirect_registers() {
    assert_eq!(
        assemble(&["  SET [$2000+I], [A]"]),
        vec![0x21, 0x61, 0x20, 0x00]
    );
    assert_eq!(assemble(&["  SET A, [B+0]"]), vec![0x24, 0x01]);
}

#[test]
fn negative_add_becomes_sub() {
    assert_eq!(assemble(&["  ADD A, -1"]), vec![0x84, 0x03]);
    assert_eq!(assemble(&["  SUB B, $FFE1"]), vec![0xFC, 0x12]);
}

#[test]
fn jsr_and_forward_reference() {
    assert_eq!(assemble(&["  JSR $100"]), vec![0x7C, 0x10, 0x01, 0x00]);
    assert_eq!(
        assemble(&["  SET PC, end", "end SET A, 1"]),
        vec![0x7D, 0xC1, 0x00, 0x04, 0x84, 0x01]
    );
}

#[test]
fn literal_destination_is_illegal() {
    let (bytes, diags) = assemble_lines(&Dcpu16FamilyModule, CPU_DCPU16, true, &["  SET 5, A"]);
    assert!(bytes.is_empty());
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind(), AsmErrorKind::Legality);
}

#[test]
fn no_inlining_without_optimization() {
    let (bytes, diags) = assemble_lines(&Dcpu16FamilyModule, CPU_DCPU16, false, &["  SET I, 10"]);
    assert!(diags.is_empty());
    assert_eq!(bytes, vec![0x7C, 0x61, 0x00, 0x0A]);
}
