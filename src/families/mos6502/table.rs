// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Opcode table for the MOS 6502 family.
//!
//! One row per (mnemonic, addressing mode). Rows added by the 65C02 carry
//! only the 65C02 CPU bit. The Rockwell bit instructions (RMBn, SMBn, BBRn,
//! BBSn) are listed once with bit 0; the bit number is added to the opcode
//! at encode time.

use super::operand::AddressMode::{self, *};

pub type CpuSet = u8;

pub const M6502: CpuSet = 0x01;
pub const M65C02: CpuSet = 0x02;
pub const ALL_CPUS: CpuSet = M6502 | M65C02;

#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    pub mnemonic: &'static str,
    pub mode: AddressMode,
    pub opcode: u8,
    pub cpus: CpuSet,
}

const fn op(mnemonic: &'static str, mode: AddressMode, opcode: u8) -> Opcode {
    Opcode {
        mnemonic,
        mode,
        opcode,
        cpus: ALL_CPUS,
    }
}

const fn c02(mnemonic: &'static str, mode: AddressMode, opcode: u8) -> Opcode {
    Opcode {
        mnemonic,
        mode,
        opcode,
        cpus: M65C02,
    }
}

/// The eight modes of the ALU group, in table order.
macro_rules! alu {
    ($m:literal, $imm:literal, $zp:literal, $zpx:literal, $abs:literal, $absx:literal,
     $absy:literal, $indx:literal, $indy:literal, $zpind:literal) => {
        [
            op($m, Immediate, $imm),
            op($m, ZeroPage, $zp),
            op($m, ZeroPageX, $zpx),
            op($m, Absolute, $abs),
            op($m, AbsoluteX, $absx),
            op($m, AbsoluteY, $absy),
            op($m, IndexedIndirectX, $indx),
            op($m, IndirectIndexedY, $indy),
            c02($m, ZeroPageIndirect, $zpind),
        ]
    };
}

/// Accumulator, zp, zp,X, abs, abs,X.
macro_rules! rmw {
    ($m:literal, $acc:literal, $zp:literal, $zpx:literal, $abs:literal, $absx:literal) => {
        [
            op($m, Accumulator, $acc),
            op($m, ZeroPage, $zp),
            op($m, ZeroPageX, $zpx),
            op($m, Absolute, $abs),
            op($m, AbsoluteX, $absx),
        ]
    };
}

const ADC: [Opcode; 9] = alu!("ADC", 0x69, 0x65, 0x75, 0x6D, 0x7D, 0x79, 0x61, 0x71, 0x72);
const AND: [Opcode; 9] = alu!("AND", 0x29, 0x25, 0x35, 0x2D, 0x3D, 0x39, 0x21, 0x31, 0x32);
const CMP: [Opcode; 9] = alu!("CMP", 0xC9, 0xC5, 0xD5, 0xCD, 0xDD, 0xD9, 0xC1, 0xD1, 0xD2);
const EOR: [Opcode; 9] = alu!("EOR", 0x49, 0x45, 0x55, 0x4D, 0x5D, 0x59, 0x41, 0x51, 0x52);
const LDA: [Opcode; 9] = alu!("LDA", 0xA9, 0xA5, 0xB5, 0xAD, 0xBD, 0xB9, 0xA1, 0xB1, 0xB2);
const ORA: [Opcode; 9] = alu!("ORA", 0x09, 0x05, 0x15, 0x0D, 0x1D, 0x19, 0x01, 0x11, 0x12);
const SBC: [Opcode; 9] = alu!("SBC", 0xE9, 0xE5, 0xF5, 0xED, 0xFD, 0xF9, 0xE1, 0xF1, 0xF2);

const ASL: [Opcode; 5] = rmw!("ASL", 0x0A, 0x06, 0x16, 0x0E, 0x1E);
const LSR: [Opcode; 5] = rmw!("LSR", 0x4A, 0x46, 0x56, 0x4E, 0x5E);
const ROL: [Opcode; 5] = rmw!("ROL", 0x2A, 0x26, 0x36, 0x2E, 0x3E);
const ROR: [Opcode; 5] = rmw!("ROR", 0x6A, 0x66, 0x76, 0x6E, 0x7E);

const OTHERS: &[Opcode] = &[
    // Branches
    op("BCC", Relative, 0x90),
    op("BCS", Relative, 0xB0),
    op("BEQ", Relative, 0xF0),
    op("BMI", Relative, 0x30),
    op("BNE", Relative, 0xD0),
    op("BPL", Relative, 0x10),
    op("BVC", Relative, 0x50),
    op("BVS", Relative, 0x70),
    c02("BRA", Relative, 0x80),
    // BIT
    op("BIT", ZeroPage, 0x24),
    op("BIT", Absolute, 0x2C),
    c02("BIT", Immediate, 0x89),
    c02("BIT", ZeroPageX, 0x34),
    c02("BIT", AbsoluteX, 0x3C),
    // Compare index registers
    op("CPX", Immediate, 0xE0),
    op("CPX", ZeroPage, 0xE4),
    op("CPX", Absolute, 0xEC),
    op("CPY", Immediate, 0xC0),
    op("CPY", ZeroPage, 0xC4),
    op("CPY", Absolute, 0xCC),
    // Increment and decrement
    op("DEC", ZeroPage, 0xC6),
    op("DEC", ZeroPageX, 0xD6),
    op("DEC", Absolute, 0xCE),
    op("DEC", AbsoluteX, 0xDE),
    c02("DEC", Accumulator, 0x3A),
    c02("DEA", Implied, 0x3A),
    op("INC", ZeroPage, 0xE6),
    op("INC", ZeroPageX, 0xF6),
    op("INC", Absolute, 0xEE),
    op("INC", AbsoluteX, 0xFE),
    c02("INC", Accumulator, 0x1A),
    c02("INA", Implied, 0x1A),
    op("DEX", Implied, 0xCA),
    op("DEY", Implied, 0x88),
    op("INX", Implied, 0xE8),
    op("INY", Implied, 0xC8),
    // Jumps
    op("JMP", Absolute, 0x4C),
    op("JMP", Indirect, 0x6C),
    c02("JMP", AbsoluteIndexedIndirect, 0x7C),
    op("JSR", Absolute, 0x20),
    op("RTI", Implied, 0x40),
    op("RTS", Implied, 0x60),
    op("BRK", Implied, 0x00),
    // Loads and stores
    op("LDX", Immediate, 0xA2),
    op("LDX", ZeroPage, 0xA6),
    op("LDX", ZeroPageY, 0xB6),
    op("LDX", Absolute, 0xAE),
    op("LDX", AbsoluteY, 0xBE),
    op("LDY", Immediate, 0xA0),
    op("LDY", ZeroPage, 0xA4),
    op("LDY", ZeroPageX, 0xB4),
    op("LDY", Absolute, 0xAC),
    op("LDY", AbsoluteX, 0xBC),
    op("STA", ZeroPage, 0x85),
    op("STA", ZeroPageX, 0x95),
    op("STA", Absolute, 0x8D),
    op("STA", AbsoluteX, 0x9D),
    op("STA", AbsoluteY, 0x99),
    op("STA", IndexedIndirectX, 0x81),
    op("STA", IndirectIndexedY, 0x91),
    c02("STA", ZeroPageIndirect, 0x92),
    op("STX", ZeroPage, 0x86),
    op("STX", ZeroPageY, 0x96),
    op("STX", Absolute, 0x8E),
    op("STY", ZeroPage, 0x84),
    op("STY", ZeroPageX, 0x94),
    op("STY", Absolute, 0x8C),
    c02("STZ", ZeroPage, 0x64),
    c02("STZ", ZeroPageX, 0x74),
    c02("STZ", Absolute, 0x9C),
    c02("STZ", AbsoluteX, 0x9E),
    // Test and set or reset bits
    c02("TRB", ZeroPage, 0x14),
    c02("TRB", Absolute, 0x1C),
    c02("TSB", ZeroPage, 0x04),
    c02("TSB", Absolute, 0x0C),
    c02("RMB", ZeroPage, 0x07),
    c02("SMB", ZeroPage, 0x87),
    c02("BBR", ZeroPageRelative, 0x0F),
    c02("BBS", ZeroPageRelative, 0x8F),
    // Flags
    op("CLC", Implied, 0x18),
    op("CLD", Implied, 0xD8),
    op("CLI", Implied, 0x58),
    op("CLV", Implied, 0xB8),
    op("SEC", Implied, 0x38),
    op("SED", Implied, 0xF8),
    op("SEI", Implied, 0x78),
    // Stack
    op("PHA", Implied, 0x48),
    op("PHP", Implied, 0x08),
    op("PLA", Implied, 0x68),
    op("PLP", Implied, 0x28),
    c02("PHX", Implied, 0xDA),
    c02("PHY", Implied, 0x5A),
    c02("PLX", Implied, 0xFA),
    c02("PLY", Implied, 0x7A),
    // Transfers
    op("TAX", Implied, 0xAA),
    op("TAY", Implied, 0xA8),
    op("TSX", Implied, 0xBA),
    op("TXA", Implied, 0x8A),
    op("TXS", Implied, 0x9A),
    op("TYA", Implied, 0x98),
    op("NOP", Implied, 0xEA),
    c02("STP", Implied, 0xDB),
    c02("WAI", Implied, 0xCB),
];

const GROUPS: &[&[Opcode]] = &[
    &ADC, &AND, &CMP, &EOR, &LDA, &ORA, &SBC, &ASL, &LSR, &ROL, &ROR, OTHERS,
];

fn rows() -> impl Iterator<Item = &'static Opcode> {
    GROUPS.iter().flat_map(|group| group.iter())
}

/// All rows of a mnemonic, on any CPU.
pub fn rows_for(mnemonic: &str) -> impl Iterator<Item = &'static Opcode> + '_ {
    rows().filter(move |row| row.mnemonic == mnemonic)
}

/// Look up an instruction by mnemonic and addressing mode.
pub fn lookup_instruction(mnemonic: &str, mode: AddressMode) -> Option<&'static Opcode> {
    rows_for(mnemonic).find(|row| row.mode == mode)
}

/// Check if a mnemonic exists in the family table (any mode, any CPU).
pub fn has_mnemonic(mnemonic: &str) -> bool {
    rows_for(mnemonic).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_lda_immediate() {
        let entry = lookup_instruction("LDA", Immediate).unwrap();
        assert_eq!(entry.opcode, 0xA9);
        assert_eq!(entry.cpus, ALL_CPUS);
    }

    #[test]
    fn lookup_jmp_forms() {
        assert_eq!(lookup_instruction("JMP", Indirect).unwrap().opcode, 0x6C);
        let indexed = lookup_instruction("JMP", AbsoluteIndexedIndirect).unwrap();
        assert_eq!(indexed.opcode, 0x7C);
        assert_eq!(indexed.cpus, M65C02);
    }

    #[test]
    fn has_mnemonic_test() {
        assert!(has_mnemonic("LDA"));
        assert!(has_mnemonic("BRA"));
        assert!(!has_mnemonic("lda"));
        assert!(!has_mnemonic("XXX"));
    }

    #[test]
    fn no_duplicate_rows() {
        let all: Vec<_> = rows().collect();
        for (idx, row) in all.iter().enumerate() {
            assert!(
                !all[idx + 1..]
                    .iter()
                    .any(|other| other.mnemonic == row.mnemonic && other.mode == row.mode),
                "duplicate {} {:?}",
                row.mnemonic,
                row.mode
            );
        }
    }
}
