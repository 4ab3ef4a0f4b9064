// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand types for the MOS 6502 family.

use crate::core::expr::Expr;
use crate::core::tokenizer::Span;

/// Addressing modes for the MOS 6502 family.
///
/// This enum includes all modes supported by any CPU in the family.
/// Rows of the instruction table say which CPU has which mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressMode {
    /// No operand (NOP, RTS, BRK, etc.)
    Implied,
    /// Accumulator (ASL A, ROL A, etc.)
    Accumulator,
    /// #$nn
    Immediate,
    /// $nn
    ZeroPage,
    /// $nn,X
    ZeroPageX,
    /// $nn,Y
    ZeroPageY,
    /// $nnnn
    Absolute,
    /// $nnnn,X
    AbsoluteX,
    /// $nnnn,Y
    AbsoluteY,
    /// ($nnnn), JMP only
    Indirect,
    /// ($nn,X)
    IndexedIndirectX,
    /// ($nn),Y
    IndirectIndexedY,
    /// Signed 8-bit offset from the next instruction.
    Relative,

    // 65C02 extensions
    /// ($nn)
    ZeroPageIndirect,
    /// ($nnnn,X), JMP only
    AbsoluteIndexedIndirect,
    /// $nn,target for BBRn and BBSn
    ZeroPageRelative,
}

impl AddressMode {
    /// Number of operand bytes after the opcode.
    pub fn operand_size(self) -> u8 {
        match self {
            AddressMode::Implied | AddressMode::Accumulator => 0,
            AddressMode::Immediate
            | AddressMode::ZeroPage
            | AddressMode::ZeroPageX
            | AddressMode::ZeroPageY
            | AddressMode::IndexedIndirectX
            | AddressMode::IndirectIndexedY
            | AddressMode::Relative
            | AddressMode::ZeroPageIndirect => 1,
            AddressMode::Absolute
            | AddressMode::AbsoluteX
            | AddressMode::AbsoluteY
            | AddressMode::Indirect
            | AddressMode::AbsoluteIndexedIndirect
            | AddressMode::ZeroPageRelative => 2,
        }
    }
}

/// Operand as written. Whether an address is zero page or absolute is
/// decided against the instruction table.
#[derive(Clone, Debug)]
pub enum FamilyOperand {
    None,
    Accumulator(Span),
    /// #expr
    Immediate(Expr),
    /// expr
    Direct(Expr),
    /// expr,X
    DirectX(Expr),
    /// expr,Y
    DirectY(Expr),
    /// (expr,X)
    IndexedIndirectX(Expr),
    /// (expr),Y
    IndirectIndexedY(Expr),
    /// (expr)
    Indirect(Expr),
    /// zp,target
    BitBranch(Expr, Expr),
}

fn fits_zero_page(expr: &Expr) -> bool {
    matches!(expr.value(), Some(0..=255))
}

impl FamilyOperand {
    /// Addressing modes this operand can take, preferred first.
    ///
    /// Constant addresses below 256 prefer zero page. Anything not known
    /// yet takes the absolute form so a later definition cannot change the
    /// instruction length.
    pub fn candidates(&self) -> Vec<AddressMode> {
        use AddressMode::*;
        let sized = |expr: &Expr, zp: AddressMode, abs: AddressMode| {
            if fits_zero_page(expr) {
                vec![zp, abs]
            } else {
                vec![abs, zp]
            }
        };
        match self {
            FamilyOperand::None => vec![Implied, Accumulator],
            FamilyOperand::Accumulator(_) => vec![Accumulator],
            FamilyOperand::Immediate(_) => vec![Immediate],
            FamilyOperand::Direct(expr) => {
                let mut modes = vec![Relative];
                modes.extend(sized(expr, ZeroPage, Absolute));
                modes
            }
            FamilyOperand::DirectX(expr) => sized(expr, ZeroPageX, AbsoluteX),
            FamilyOperand::DirectY(expr) => sized(expr, ZeroPageY, AbsoluteY),
            FamilyOperand::IndexedIndirectX(_) => vec![IndexedIndirectX, AbsoluteIndexedIndirect],
            FamilyOperand::IndirectIndexedY(_) => vec![IndirectIndexedY],
            FamilyOperand::Indirect(_) => vec![Indirect, ZeroPageIndirect],
            FamilyOperand::BitBranch(..) => vec![ZeroPageRelative],
        }
    }

    /// Span of this operand for error reporting.
    pub fn span(&self) -> Option<Span> {
        match self {
            FamilyOperand::None => None,
            FamilyOperand::Accumulator(span) => Some(*span),
            FamilyOperand::Immediate(expr)
            | FamilyOperand::Direct(expr)
            | FamilyOperand::DirectX(expr)
            | FamilyOperand::DirectY(expr)
            | FamilyOperand::IndexedIndirectX(expr)
            | FamilyOperand::IndirectIndexedY(expr)
            | FamilyOperand::Indirect(expr)
            | FamilyOperand::BitBranch(expr, _) => Some(expr.span),
        }
    }
}

/// Check if an identifier is a register for the MOS 6502 family.
pub fn is_register(name: &str) -> bool {
    matches!(name, "A" | "X" | "Y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_addresses_prefer_zero_page() {
        let low = FamilyOperand::DirectX(Expr::constant(0x20, Span::default()));
        assert_eq!(low.candidates()[0], AddressMode::ZeroPageX);
        let high = FamilyOperand::DirectX(Expr::constant(0x1234, Span::default()));
        assert_eq!(high.candidates()[0], AddressMode::AbsoluteX);
        let forward = FamilyOperand::Direct(Expr::symbol("later", Span::default()));
        assert_eq!(forward.candidates()[1], AddressMode::Absolute);
    }

    #[test]
    fn operand_sizes() {
        assert_eq!(AddressMode::Implied.operand_size(), 0);
        assert_eq!(AddressMode::IndirectIndexedY.operand_size(), 1);
        assert_eq!(AddressMode::AbsoluteIndexedIndirect.operand_size(), 2);
    }
}
