// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! RV32I and M-extension opcode table.
//!
//! Every row carries the instruction word with opcode, funct3 and funct7
//! already in place; encoders OR in registers and immediates.

pub type Extensions = u8;

pub const BASE: Extensions = 0x01;
pub const MUL: Extensions = 0x02;

/// Operand shape of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// rd, rs1, rs2
    R,
    /// rd, rs1, imm12
    I,
    /// rd, rs1, shamt
    Shift,
    /// rd, offset(rs1)
    Load,
    /// rs2, offset(rs1)
    Store,
    /// rs1, rs2, target
    Branch,
    /// rd, imm20
    Upper,
    /// [rd,] target
    Jump,
    /// rd, offset(rs1) or rd, rs1, imm12 or rs1
    JumpReg,
    /// No operands.
    Fixed,
}

#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    pub mnemonic: &'static str,
    pub format: Format,
    pub word: u32,
    pub ext: Extensions,
}

const fn row(mnemonic: &'static str, format: Format, opcode: u32, funct3: u32, funct7: u32) -> Opcode {
    Opcode {
        mnemonic,
        format,
        word: funct7 << 25 | funct3 << 12 | opcode,
        ext: BASE,
    }
}

const fn r(mnemonic: &'static str, funct3: u32, funct7: u32) -> Opcode {
    row(mnemonic, Format::R, 0x33, funct3, funct7)
}

const fn m(mnemonic: &'static str, funct3: u32) -> Opcode {
    Opcode {
        ext: MUL,
        ..row(mnemonic, Format::R, 0x33, funct3, 0x01)
    }
}

const fn fixed(mnemonic: &'static str, word: u32) -> Opcode {
    Opcode {
        mnemonic,
        format: Format::Fixed,
        word,
        ext: BASE,
    }
}

pub const OPCODES: &[Opcode] = &[
    row("LUI", Format::Upper, 0x37, 0, 0),
    row("AUIPC", Format::Upper, 0x17, 0, 0),
    row("JAL", Format::Jump, 0x6f, 0, 0),
    row("JALR", Format::JumpReg, 0x67, 0, 0),
    row("BEQ", Format::Branch, 0x63, 0, 0),
    row("BNE", Format::Branch, 0x63, 1, 0),
    row("BLT", Format::Branch, 0x63, 4, 0),
    row("BGE", Format::Branch, 0x63, 5, 0),
    row("BLTU", Format::Branch, 0x63, 6, 0),
    row("BGEU", Format::Branch, 0x63, 7, 0),
    row("LB", Format::Load, 0x03, 0, 0),
    row("LH", Format::Load, 0x03, 1, 0),
    row("LW", Format::Load, 0x03, 2, 0),
    row("LBU", Format::Load, 0x03, 4, 0),
    row("LHU", Format::Load, 0x03, 5, 0),
    row("SB", Format::Store, 0x23, 0, 0),
    row("SH", Format::Store, 0x23, 1, 0),
    row("SW", Format::Store, 0x23, 2, 0),
    row("ADDI", Format::I, 0x13, 0, 0),
    row("SLTI", Format::I, 0x13, 2, 0),
    row("SLTIU", Format::I, 0x13, 3, 0),
    row("XORI", Format::I, 0x13, 4, 0),
    row("ORI", Format::I, 0x13, 6, 0),
    row("ANDI", Format::I, 0x13, 7, 0),
    row("SLLI", Format::Shift, 0x13, 1, 0),
    row("SRLI", Format::Shift, 0x13, 5, 0),
    row("SRAI", Format::Shift, 0x13, 5, 0x20),
    r("ADD", 0, 0),
    r("SUB", 0, 0x20),
    r("SLL", 1, 0),
    r("SLT", 2, 0),
    r("SLTU", 3, 0),
    r("XOR", 4, 0),
    r("SRL", 5, 0),
    r("SRA", 5, 0x20),
    r("OR", 6, 0),
    r("AND", 7, 0),
    fixed("FENCE", 0x0ff0_000f),
    fixed("ECALL", 0x0000_0073),
    fixed("EBREAK", 0x0010_0073),
    m("MUL", 0),
    m("MULH", 1),
    m("MULHSU", 2),
    m("MULHU", 3),
    m("DIV", 4),
    m("DIVU", 5),
    m("REM", 6),
    m("REMU", 7),
];

pub fn lookup(mnemonic: &str) -> Option<&'static Opcode> {
    OPCODES.iter().find(|op| op.mnemonic == mnemonic)
}
