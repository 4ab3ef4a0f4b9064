// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! DCPU-16 opcode table.
//!
//! Basic instructions are `bbbbbbaaaaaaoooo`: a 4-bit opcode, the
//! destination `a` and the source `b`. Non-basic instructions put their
//! opcode in the `a` slot and their single operand in `b`'s place.

use super::operand::ValueSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Basic,
    NonBasic,
}

#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    pub mnemonic: &'static str,
    pub format: Format,
    pub opcode: u16,
    /// Accepted values per operand position.
    pub operands: &'static [ValueSet],
}

const ASSIGN: &[ValueSet] = &[ValueSet::WRITABLE, ValueSet::ALL];
const COMPARE: &[ValueSet] = &[ValueSet::ALL, ValueSet::ALL];

const fn basic(mnemonic: &'static str, opcode: u16, operands: &'static [ValueSet]) -> Opcode {
    Opcode {
        mnemonic,
        format: Format::Basic,
        opcode,
        operands,
    }
}

pub const OPCODES: &[Opcode] = &[
    basic("SET", 0x1, ASSIGN),
    basic("ADD", 0x2, ASSIGN),
    basic("SUB", 0x3, ASSIGN),
    basic("MUL", 0x4, ASSIGN),
    basic("DIV", 0x5, ASSIGN),
    basic("MOD", 0x6, ASSIGN),
    basic("SHL", 0x7, ASSIGN),
    basic("SHR", 0x8, ASSIGN),
    basic("AND", 0x9, ASSIGN),
    basic("BOR", 0xa, ASSIGN),
    basic("XOR", 0xb, ASSIGN),
    basic("IFE", 0xc, COMPARE),
    basic("IFN", 0xd, COMPARE),
    basic("IFG", 0xe, COMPARE),
    basic("IFB", 0xf, COMPARE),
    Opcode {
        mnemonic: "JSR",
        format: Format::NonBasic,
        opcode: 0x01,
        operands: &[ValueSet::ALL],
    },
];

pub fn lookup(mnemonic: &str) -> Option<&'static Opcode> {
    OPCODES.iter().find(|op| op.mnemonic == mnemonic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_destinations_are_only_legal_for_compares() {
        let set = lookup("SET").unwrap();
        assert!(!set.operands[0].contains(ValueSet::LITERAL));
        assert!(lookup("IFE").unwrap().operands[0].contains(ValueSet::LITERAL));
        assert_eq!(lookup("JSR").unwrap().format, Format::NonBasic);
        assert!(lookup("HCF").is_none());
    }
}
