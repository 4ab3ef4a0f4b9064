// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! 680x0 operand types: sizes, addressing modes and mode sets.

use std::ops::BitOr;

use crate::core::expr::Expr;
use crate::core::tokenizer::Span;

/// Operation size taken from the mnemonic suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Byte,
    Word,
    Long,
    /// `.S`: short branch, or single precision for FPU instructions.
    Short,
    Double,
    Extended,
    Packed,
}

impl Size {
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "B" => Some(Size::Byte),
            "W" => Some(Size::Word),
            "L" => Some(Size::Long),
            "S" => Some(Size::Short),
            "D" => Some(Size::Double),
            "X" => Some(Size::Extended),
            "P" => Some(Size::Packed),
            _ => None,
        }
    }

    pub fn suffix(self) -> char {
        match self {
            Size::Byte => 'B',
            Size::Word => 'W',
            Size::Long => 'L',
            Size::Short => 'S',
            Size::Double => 'D',
            Size::Extended => 'X',
            Size::Packed => 'P',
        }
    }

    /// Standard two-bit size field (00 byte, 01 word, 10 long).
    pub fn code(self) -> u16 {
        match self {
            Size::Byte => 0,
            Size::Word => 1,
            _ => 2,
        }
    }

    /// Size field of MOVE/MOVEA (01 byte, 11 word, 10 long).
    pub fn move_code(self) -> u16 {
        match self {
            Size::Byte => 1,
            Size::Word => 3,
            _ => 2,
        }
    }

    /// Immediate payload width in bytes.
    pub fn bytes(self) -> u8 {
        match self {
            Size::Byte | Size::Word => 2,
            _ => 4,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Size::Byte => 0x01,
            Size::Word => 0x02,
            Size::Long => 0x04,
            Size::Short => 0x08,
            Size::Double => 0x10,
            Size::Extended => 0x20,
            Size::Packed => 0x40,
        }
    }
}

/// Set of allowed sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSet(u8);

impl SizeSet {
    pub const NONE: SizeSet = SizeSet(0);
    pub const B: SizeSet = SizeSet(0x01);
    pub const W: SizeSet = SizeSet(0x02);
    pub const L: SizeSet = SizeSet(0x04);
    pub const BW: SizeSet = SizeSet(0x03);
    pub const WL: SizeSet = SizeSet(0x06);
    pub const BWL: SizeSet = SizeSet(0x07);
    pub const BL: SizeSet = SizeSet(0x05);
    /// Branches: `.S`, `.B`, `.W`, `.L`.
    pub const BRANCH: SizeSet = SizeSet(0x0f);
    /// FPU source formats.
    pub const FPU: SizeSet = SizeSet(0x7f);
    pub const X: SizeSet = SizeSet(0x20);

    pub fn contains(self, size: Size) -> bool {
        self.0 & size.bit() != 0
    }
}

/// One bit per addressing-mode category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeSet(u32);

impl ModeSet {
    pub const EMPTY: ModeSet = ModeSet(0);
    pub const DN: ModeSet = ModeSet(1 << 0);
    pub const AN: ModeSet = ModeSet(1 << 1);
    pub const AIND: ModeSet = ModeSet(1 << 2);
    pub const POSTINC: ModeSet = ModeSet(1 << 3);
    pub const PREDEC: ModeSet = ModeSet(1 << 4);
    pub const DISP: ModeSet = ModeSet(1 << 5);
    pub const INDEX: ModeSet = ModeSet(1 << 6);
    pub const MEMIND: ModeSet = ModeSet(1 << 7);
    pub const ABSW: ModeSet = ModeSet(1 << 8);
    pub const ABSL: ModeSet = ModeSet(1 << 9);
    pub const PCDISP: ModeSet = ModeSet(1 << 10);
    pub const PCINDEX: ModeSet = ModeSet(1 << 11);
    pub const PCMEM: ModeSet = ModeSet(1 << 12);
    pub const IMM: ModeSet = ModeSet(1 << 13);
    pub const REGLIST: ModeSet = ModeSet(1 << 14);
    pub const BITFIELD: ModeSet = ModeSet(1 << 15);
    pub const CCR: ModeSet = ModeSet(1 << 16);
    pub const SR: ModeSet = ModeSet(1 << 17);
    pub const USP: ModeSet = ModeSet(1 << 18);
    pub const CTRL: ModeSet = ModeSet(1 << 19);
    pub const FPN: ModeSet = ModeSet(1 << 20);
    pub const FPCTRL: ModeSet = ModeSet(1 << 21);
    pub const FPLIST: ModeSet = ModeSet(1 << 22);
    pub const PAIR: ModeSet = ModeSet(1 << 23);

    pub const ALL: ModeSet = ModeSet(
        Self::DN.0
            | Self::AN.0
            | Self::AIND.0
            | Self::POSTINC.0
            | Self::PREDEC.0
            | Self::DISP.0
            | Self::INDEX.0
            | Self::ABSW.0
            | Self::ABSL.0
            | Self::PCDISP.0
            | Self::PCINDEX.0
            | Self::IMM.0,
    );
    pub const DATA: ModeSet = Self::ALL.without(Self::AN);
    pub const MEMORY: ModeSet = Self::DATA.without(Self::DN);
    pub const CONTROL: ModeSet = ModeSet(
        Self::AIND.0
            | Self::DISP.0
            | Self::INDEX.0
            | Self::ABSW.0
            | Self::ABSL.0
            | Self::PCDISP.0
            | Self::PCINDEX.0,
    );
    pub const ALTERABLE: ModeSet = Self::ALL
        .without(Self::PCDISP)
        .without(Self::PCINDEX)
        .without(Self::IMM);
    pub const DATA_ALT: ModeSet = Self::ALTERABLE.without(Self::AN);
    pub const MEM_ALT: ModeSet = Self::DATA_ALT.without(Self::DN);
    pub const CONTROL_ALT: ModeSet = Self::CONTROL.without(Self::PCDISP).without(Self::PCINDEX);

    pub const fn union(self, other: ModeSet) -> ModeSet {
        ModeSet(self.0 | other.0)
    }

    pub const fn without(self, other: ModeSet) -> ModeSet {
        ModeSet(self.0 & !other.0)
    }

    pub const fn intersects(self, other: ModeSet) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Add the memory-indirect modes wherever the matching indexed mode is
    /// allowed.
    pub const fn with_memory_indirect(self) -> ModeSet {
        let mut out = self;
        if self.intersects(Self::INDEX) {
            out = out.union(Self::MEMIND);
        }
        if self.intersects(Self::PCINDEX) {
            out = out.union(Self::PCMEM);
        }
        out
    }
}

impl BitOr for ModeSet {
    type Output = ModeSet;

    fn bitor(self, rhs: ModeSet) -> ModeSet {
        self.union(rhs)
    }
}

/// Index register of an indexed mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexReg {
    /// 0-7 data registers, 8-15 address registers.
    pub reg: u8,
    pub long: bool,
    /// 1, 2, 4 or 8.
    pub scale: u8,
}

impl IndexReg {
    /// D/A, register and W/L bits of an extension word.
    pub fn ext_bits(self) -> u16 {
        let mut bits = ((self.reg as u16) & 0xf) << 12;
        if self.long {
            bits |= 0x0800;
        }
        bits | (self.scale_code() << 9)
    }

    pub fn scale_code(self) -> u16 {
        match self.scale {
            2 => 1,
            4 => 2,
            8 => 3,
            _ => 0,
        }
    }
}

/// Base of an indexed or memory-indirect mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Address(u8),
    Pc,
    /// Omitted base register (base suppress).
    Suppressed,
    /// `ZPC`: PC-relative mode with the PC suppressed.
    ZeroPc,
}

impl Base {
    pub fn is_pc(self) -> bool {
        matches!(self, Base::Pc | Base::ZeroPc)
    }
}

/// One part of a bitfield specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitfieldPart {
    Register(u8),
    Value(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressingMode {
    DataRegister(u8),
    AddressRegister(u8),
    Indirect(u8),
    PostIncrement(u8),
    PreDecrement(u8),
    /// `(d16,An)`.
    Displacement { reg: u8, disp: Expr },
    /// `(d8,An,Xn)` or any full-format form without memory indirection.
    /// For a PC base `disp` is the target address.
    IndexedDisplacement {
        base: Base,
        index: Option<IndexReg>,
        disp: Option<Expr>,
    },
    /// `(target,PC)`; `None` for a bare `(PC)`.
    PcDisplacement { target: Option<Expr> },
    /// `([bd,An,Xn],od)`; also `([bd,An],od)` without index.
    MemoryIndirectPre {
        base: Base,
        index: Option<IndexReg>,
        bd: Option<Expr>,
        od: Option<Expr>,
    },
    /// `([bd,An],Xn,od)`.
    MemoryIndirectPost {
        base: Base,
        index: IndexReg,
        bd: Option<Expr>,
        od: Option<Expr>,
    },
    AbsoluteWord(Expr),
    AbsoluteLong(Expr),
    Immediate(Expr),
    /// MOVEM mask, bit 0 = D0 .. bit 15 = A7.
    RegisterList(u16),
    /// `Dh:Dl` pair of the long multiply and divide forms.
    RegisterPair(u8, u8),
    Bitfield {
        offset: BitfieldPart,
        width: BitfieldPart,
    },
    Ccr,
    Sr,
    Usp,
    ControlRegister(u16),
    FpRegister(u8),
    /// Mask of FPCR (4), FPSR (2), FPIAR (1).
    FpControl(u8),
    /// Bit n = FPn.
    FpRegisterList(u8),
}

impl AddressingMode {
    /// Category bit checked against the legality table.
    pub fn mode_bit(&self) -> ModeSet {
        match self {
            AddressingMode::DataRegister(_) => ModeSet::DN,
            AddressingMode::AddressRegister(_) => ModeSet::AN,
            AddressingMode::Indirect(_) => ModeSet::AIND,
            AddressingMode::PostIncrement(_) => ModeSet::POSTINC,
            AddressingMode::PreDecrement(_) => ModeSet::PREDEC,
            AddressingMode::Displacement { .. } => ModeSet::DISP,
            AddressingMode::IndexedDisplacement { base, .. } if base.is_pc() => ModeSet::PCINDEX,
            AddressingMode::IndexedDisplacement { .. } => ModeSet::INDEX,
            AddressingMode::PcDisplacement { .. } => ModeSet::PCDISP,
            AddressingMode::MemoryIndirectPre { base, .. }
            | AddressingMode::MemoryIndirectPost { base, .. }
                if base.is_pc() =>
            {
                ModeSet::PCMEM
            }
            AddressingMode::MemoryIndirectPre { .. } | AddressingMode::MemoryIndirectPost { .. } => {
                ModeSet::MEMIND
            }
            AddressingMode::AbsoluteWord(_) => ModeSet::ABSW,
            AddressingMode::AbsoluteLong(_) => ModeSet::ABSL,
            AddressingMode::Immediate(_) => ModeSet::IMM,
            AddressingMode::RegisterList(_) => ModeSet::REGLIST,
            AddressingMode::RegisterPair(..) => ModeSet::PAIR,
            AddressingMode::Bitfield { .. } => ModeSet::BITFIELD,
            AddressingMode::Ccr => ModeSet::CCR,
            AddressingMode::Sr => ModeSet::SR,
            AddressingMode::Usp => ModeSet::USP,
            AddressingMode::ControlRegister(_) => ModeSet::CTRL,
            AddressingMode::FpRegister(_) => ModeSet::FPN,
            AddressingMode::FpControl(_) => ModeSet::FPCTRL,
            AddressingMode::FpRegisterList(_) => ModeSet::FPLIST,
        }
    }

    /// Six-bit effective address field (mode << 3 | register).
    pub fn ea_field(&self) -> u16 {
        let (mode, reg) = match self {
            AddressingMode::DataRegister(r) => (0, *r),
            AddressingMode::AddressRegister(r) => (1, *r),
            AddressingMode::Indirect(r) => (2, *r),
            AddressingMode::PostIncrement(r) => (3, *r),
            AddressingMode::PreDecrement(r) => (4, *r),
            AddressingMode::Displacement { reg, .. } => (5, *reg),
            AddressingMode::IndexedDisplacement { base, .. }
            | AddressingMode::MemoryIndirectPre { base, .. }
            | AddressingMode::MemoryIndirectPost { base, .. } => match base {
                Base::Address(r) => (6, *r),
                Base::Suppressed => (6, 0),
                Base::Pc | Base::ZeroPc => (7, 3),
            },
            AddressingMode::AbsoluteWord(_) => (7, 0),
            AddressingMode::AbsoluteLong(_) => (7, 1),
            AddressingMode::PcDisplacement { .. } => (7, 2),
            AddressingMode::Immediate(_) => (7, 4),
            _ => (0, 0),
        };
        ((mode as u16) << 3) | (reg as u16 & 7)
    }

    /// Register number of a register-direct operand (address registers 8-15).
    pub fn register(&self) -> Option<u8> {
        match self {
            AddressingMode::DataRegister(r) => Some(*r),
            AddressingMode::AddressRegister(r) => Some(*r + 8),
            _ => None,
        }
    }
}

/// A classified operand and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub mode: AddressingMode,
    pub span: Span,
}

impl Operand {
    pub fn new(mode: AddressingMode, span: Span) -> Self {
        Self { mode, span }
    }
}

/// Two-letter condition codes of Bcc, DBcc and Scc.
pub fn condition_code(name: &str) -> Option<u16> {
    let cc = match name {
        "T" => 0,
        "F" => 1,
        "HI" => 2,
        "LS" => 3,
        "CC" | "HS" => 4,
        "CS" | "LO" => 5,
        "NE" => 6,
        "EQ" => 7,
        "VC" => 8,
        "VS" => 9,
        "PL" => 10,
        "MI" => 11,
        "GE" => 12,
        "LT" => 13,
        "GT" => 14,
        "LE" => 15,
        _ => return None,
    };
    Some(cc)
}

/// Six-bit FPU condition predicates of FBcc.
pub fn fpu_condition(name: &str) -> Option<u16> {
    const NAMES: [&str; 32] = [
        "F", "EQ", "OGT", "OGE", "OLT", "OLE", "OGL", "OR", "UN", "UEQ", "UGT", "UGE", "ULT",
        "ULE", "NE", "T", "SF", "SEQ", "GT", "GE", "LT", "LE", "GL", "GLE", "NGLE", "NGL", "NLE",
        "NLT", "NGE", "NGT", "SNE", "ST",
    ];
    NAMES.iter().position(|n| *n == name).map(|p| p as u16)
}

/// MOVEC control register numbers.
pub fn control_register(name: &str) -> Option<u16> {
    let code = match name {
        "SFC" => 0x000,
        "DFC" => 0x001,
        "CACR" => 0x002,
        "VBR" => 0x801,
        "CAAR" => 0x802,
        "MSP" => 0x803,
        "ISP" => 0x804,
        _ => return None,
    };
    Some(code)
}

/// Register names known to the tokenizer (uppercase).
pub fn is_register(name: &str) -> bool {
    if matches!(
        name,
        "SP" | "PC" | "ZPC" | "SR" | "CCR" | "USP" | "FPCR" | "FPSR" | "FPIAR"
    ) || control_register(name).is_some()
    {
        return true;
    }
    let bytes = name.as_bytes();
    match bytes {
        [b'D' | b'A', n] => (b'0'..=b'7').contains(n),
        [b'F', b'P', n] => (b'0'..=b'7').contains(n),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_sets_match_the_ea_categories() {
        assert!(!ModeSet::DATA.intersects(ModeSet::AN));
        assert!(!ModeSet::CONTROL.intersects(ModeSet::POSTINC | ModeSet::PREDEC));
        assert!(ModeSet::CONTROL_ALT.intersects(ModeSet::ABSL));
        assert!(!ModeSet::CONTROL_ALT.intersects(ModeSet::PCDISP));
        assert!(!ModeSet::MEM_ALT.intersects(ModeSet::DN | ModeSet::IMM));
        let ext = ModeSet::CONTROL_ALT.with_memory_indirect();
        assert!(ext.intersects(ModeSet::MEMIND) && !ext.intersects(ModeSet::PCMEM));
    }

    #[test]
    fn ea_fields() {
        assert_eq!(AddressingMode::DataRegister(3).ea_field(), 0o03);
        assert_eq!(AddressingMode::PreDecrement(7).ea_field(), 0o47);
        let idx = AddressingMode::IndexedDisplacement {
            base: Base::Pc,
            index: None,
            disp: None,
        };
        assert_eq!(idx.ea_field(), 0o73);
        assert_eq!(idx.mode_bit(), ModeSet::PCINDEX);
    }

    #[test]
    fn index_extension_bits() {
        let xn = IndexReg {
            reg: 9,
            long: true,
            scale: 4,
        };
        assert_eq!(xn.ext_bits(), 0x9c00);
    }

    #[test]
    fn register_names() {
        assert!(is_register("D7") && is_register("A0") && is_register("FP3"));
        assert!(is_register("VBR") && is_register("ZPC"));
        assert!(!is_register("D8") && !is_register("DATA"));
        assert_eq!(condition_code("HS"), condition_code("CC"));
        assert_eq!(fpu_condition("ST"), Some(0x1f));
    }
}
