// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CHIP-8 and SUPER-CHIP opcode table.

use super::operand::Special;

pub type CpuSet = u8;

pub const CHIP8: CpuSet = 0x01;
pub const SCHIP: CpuSet = 0x02;
pub const ALL_CPUS: CpuSet = CHIP8 | SCHIP;

/// What an operand position accepts and where it goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Vx in bits 8-11.
    Vx,
    /// Vy in bits 4-7.
    Vy,
    /// V0 only (JP V0,addr).
    V0,
    Reg(Special),
    /// `[I]`
    IndirectI,
    /// 8-bit immediate in bits 0-7.
    Byte,
    /// 12-bit address in bits 0-11.
    Addr,
    /// 4-bit immediate in bits 0-3.
    Nibble,
}

#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    pub mnemonic: &'static str,
    pub slots: &'static [Slot],
    pub opcode: u16,
    pub cpus: CpuSet,
}

const fn op(mnemonic: &'static str, slots: &'static [Slot], opcode: u16) -> Opcode {
    Opcode {
        mnemonic,
        slots,
        opcode,
        cpus: ALL_CPUS,
    }
}

const fn schip(mnemonic: &'static str, slots: &'static [Slot], opcode: u16) -> Opcode {
    Opcode {
        mnemonic,
        slots,
        opcode,
        cpus: SCHIP,
    }
}

use Slot::*;

const XY: &[Slot] = &[Vx, Vy];
const X: &[Slot] = &[Vx];
const XB: &[Slot] = &[Vx, Byte];
const ADDR: &[Slot] = &[Addr];

pub const OPCODES: &[Opcode] = &[
    op("CLS", &[], 0x00e0),
    op("RET", &[], 0x00ee),
    op("SYS", ADDR, 0x0000),
    op("JP", ADDR, 0x1000),
    op("JP", &[V0, Addr], 0xb000),
    op("CALL", ADDR, 0x2000),
    op("SE", XB, 0x3000),
    op("SE", XY, 0x5000),
    op("SNE", XB, 0x4000),
    op("SNE", XY, 0x9000),
    op("LD", XB, 0x6000),
    op("LD", XY, 0x8000),
    op("LD", &[Reg(Special::I), Addr], 0xa000),
    op("LD", &[Vx, Reg(Special::Dt)], 0xf007),
    op("LD", &[Vx, Reg(Special::K)], 0xf00a),
    op("LD", &[Reg(Special::Dt), Vx], 0xf015),
    op("LD", &[Reg(Special::St), Vx], 0xf018),
    op("LD", &[Reg(Special::F), Vx], 0xf029),
    op("LD", &[Reg(Special::B), Vx], 0xf033),
    op("LD", &[IndirectI, Vx], 0xf055),
    op("LD", &[Vx, IndirectI], 0xf065),
    op("ADD", XB, 0x7000),
    op("ADD", XY, 0x8004),
    op("ADD", &[Reg(Special::I), Vx], 0xf01e),
    op("OR", XY, 0x8001),
    op("AND", XY, 0x8002),
    op("XOR", XY, 0x8003),
    op("SUB", XY, 0x8005),
    op("SHR", X, 0x8006),
    op("SHR", XY, 0x8006),
    op("SUBN", XY, 0x8007),
    op("SHL", X, 0x800e),
    op("SHL", XY, 0x800e),
    op("RND", XB, 0xc000),
    op("DRW", &[Vx, Vy, Nibble], 0xd000),
    op("SKP", X, 0xe09e),
    op("SKNP", X, 0xe0a1),
    schip("SCD", &[Nibble], 0x00c0),
    schip("SCR", &[], 0x00fb),
    schip("SCL", &[], 0x00fc),
    schip("EXIT", &[], 0x00fd),
    schip("LOW", &[], 0x00fe),
    schip("HIGH", &[], 0x00ff),
    schip("LD", &[Reg(Special::Hf), Vx], 0xf030),
    schip("LD", &[Reg(Special::R), Vx], 0xf075),
    schip("LD", &[Vx, Reg(Special::R)], 0xf085),
];

pub fn rows_for(mnemonic: &str) -> impl Iterator<Item = &'static Opcode> + '_ {
    OPCODES.iter().filter(move |op| op.mnemonic == mnemonic)
}

pub fn has_mnemonic(mnemonic: &str) -> bool {
    rows_for(mnemonic).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superchip_rows_are_marked() {
        assert!(rows_for("SCD").all(|row| row.cpus == SCHIP));
        assert_eq!(rows_for("LD").filter(|row| row.cpus == SCHIP).count(), 3);
        assert!(has_mnemonic("DRW"));
        assert!(!has_mnemonic("MOV"));
    }
}
