// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! 68881/68882 and on-chip FPU instructions.
//!
//! All general instructions share the `F200 | ea` operation word; the
//! command word that follows selects the operation. Register-to-register
//! forms keep the row's opmode in `opcode`.

use crate::core::assembler::error::AsmErrorKind;
use crate::core::context::{Emission, PcAnchor};
use crate::core::cpu::EncodeError;
use crate::core::patch::{Endian, Field};

use super::encoder::{ea, opword};
use super::operand::{AddressingMode, ModeSet, Operand, Size, SizeSet};
use super::table::{Enc, EncodeFn, Row, FPU};

const BE: Endian = Endian::Big;

const FPN: ModeSet = ModeSet::FPN;
const FPCTRL: ModeSet = ModeSet::FPCTRL;
const FP_REGS: ModeSet = ModeSet::FPLIST.union(FPN);
const DATA: ModeSet = ModeSet::DATA;
const ALL: ModeSet = ModeSet::ALL;
const DATA_ALT: ModeSet = ModeSet::DATA_ALT;
const ALT: ModeSet = ModeSet::ALTERABLE;
const CTRL: ModeSet = ModeSet::CONTROL;
const CTRL_ALT: ModeSet = ModeSet::CONTROL_ALT;
const STORE: ModeSet = CTRL_ALT.union(ModeSet::PREDEC);
const LOAD: ModeSet = CTRL.union(ModeSet::POSTINC);
const ABS: ModeSet = ModeSet::ABSW.union(ModeSet::ABSL);

/// Source format field of the command word.
fn format_code(size: Size) -> u16 {
    match size {
        Size::Long => 0,
        Size::Short => 1,
        Size::Extended => 2,
        Size::Packed => 3,
        Size::Word => 4,
        Size::Double => 5,
        Size::Byte => 6,
    }
}

fn fp_reg(op: &Operand) -> u16 {
    match op.mode {
        AddressingMode::FpRegister(n) => n as u16,
        _ => 0,
    }
}

fn fp_mask(op: &Operand) -> u8 {
    match op.mode {
        AddressingMode::FpRegisterList(mask) => mask,
        AddressingMode::FpRegister(n) => 1 << n,
        _ => 0,
    }
}

/// Data registers hold at most a long word.
fn data_register_size(enc: &mut Enc, size: Size, op: &Operand) -> Size {
    let wide = matches!(size, Size::Double | Size::Extended | Size::Packed);
    if wide && matches!(op.mode, AddressingMode::DataRegister(_)) {
        enc.report(EncodeError::size(
            format!("A data register cannot hold .{}", size.suffix()),
            enc.size_span.unwrap_or(op.span),
        ));
        return Size::Long;
    }
    size
}

/// Extension words of an FPU source operand. Single and double
/// immediates are integer constants converted to IEEE format.
fn fpu_operand(enc: &mut Enc, em: &mut Emission, op: &Operand, size: Size) -> Result<(), EncodeError> {
    let AddressingMode::Immediate(expr) = &op.mode else {
        return ea(enc, em, op, size);
    };
    match size {
        Size::Short | Size::Double => {
            let Some(value) = expr.value() else {
                return Err(EncodeError::with_span(
                    AsmErrorKind::Expression,
                    "Floating point immediate must be a constant",
                    expr.span,
                ));
            };
            if size == Size::Short {
                em.value((value as f32).to_bits(), 4, BE);
            } else {
                let bits = (value as f64).to_bits();
                em.value((bits >> 32) as u32, 4, BE).value(bits as u32, 4, BE);
            }
            Ok(())
        }
        Size::Extended | Size::Packed => Err(EncodeError::size(
            format!("Immediate of size .{} not supported", size.suffix()),
            op.span,
        )),
        _ => ea(enc, em, op, size),
    }
}

/// FMOVE, FADD and the other register-destination operations.
pub fn encode_fpu_arith(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let (src, dst) = match ops {
        [only] => (only, only),
        [src, dst, ..] => (src, dst),
        [] => return Err(EncodeError::syntax("Missing operand", enc.span)),
    };
    let opmode = row.opcode;
    // FTST has no destination register
    let dst_reg = if row.mnemonic == "FTST" { 0 } else { fp_reg(dst) };

    if let AddressingMode::FpRegister(n) = src.mode {
        if let Some(size) = size.filter(|s| *s != Size::Extended) {
            enc.report(EncodeError::size(
                format!("FPU register operands are .X, not .{}", size.suffix()),
                enc.size_span.unwrap_or(enc.span),
            ));
        }
        let mut em = opword(0xF200);
        em.value(((n as u32) << 10) | (dst_reg as u32) << 7 | opmode as u32, 2, BE);
        return Ok(em);
    }

    let size = match size {
        Some(size) => data_register_size(enc, size, src),
        None if matches!(src.mode, AddressingMode::DataRegister(_)) => Size::Long,
        None => Size::Extended,
    };
    let mut em = opword(0xF200 | src.mode.ea_field());
    let command = 0x4000 | format_code(size) << 10 | dst_reg << 7 | opmode;
    em.value(command as u32, 2, BE);
    fpu_operand(enc, &mut em, src, size)?;
    Ok(em)
}

/// FMOVE FPn,<ea>.
pub fn encode_fpu_store(
    enc: &mut Enc,
    _row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let (src, dst) = (&ops[0], &ops[1]);
    let size = match size {
        Some(size) => data_register_size(enc, size, dst),
        None if matches!(dst.mode, AddressingMode::DataRegister(_)) => Size::Long,
        None => Size::Extended,
    };
    let mut em = opword(0xF200 | dst.mode.ea_field());
    let command = 0x6000 | format_code(size) << 10 | fp_reg(src) << 7;
    em.value(command as u32, 2, BE);
    ea(enc, &mut em, dst, size)?;
    Ok(em)
}

/// FMOVE and FMOVEM to or from FPCR, FPSR and FPIAR.
pub fn encode_fpu_control(
    enc: &mut Enc,
    _row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let (src, dst) = (&ops[0], &ops[1]);
    let (direction, mask, operand) = match (&src.mode, &dst.mode) {
        (_, AddressingMode::FpControl(mask)) => (0x8000, *mask, src),
        (AddressingMode::FpControl(mask), _) => (0xA000, *mask, dst),
        _ => return Err(EncodeError::legality("Expected FPU control register", src.span)),
    };
    let mut em = opword(0xF200 | operand.mode.ea_field());
    em.value(direction | (mask as u32) << 10, 2, BE);
    ea(enc, &mut em, operand, Size::Long)?;
    Ok(em)
}

/// FMOVEM of data registers.
pub fn encode_fmovem(
    enc: &mut Enc,
    _row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let (src, dst) = (&ops[0], &ops[1]);
    let (command, memory) = match dst.mode {
        AddressingMode::FpRegister(_) | AddressingMode::FpRegisterList(_) => {
            (0xD000 | fp_mask(dst).reverse_bits() as u32, src)
        }
        AddressingMode::PreDecrement(_) => (0xE000 | fp_mask(src) as u32, dst),
        _ => (0xF000 | fp_mask(src).reverse_bits() as u32, dst),
    };
    let mut em = opword(0xF200 | memory.mode.ea_field());
    em.value(command, 2, BE);
    ea(enc, &mut em, memory, Size::Extended)?;
    Ok(em)
}

/// FBcc.
pub fn encode_fpu_branch(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let target = match &ops[0].mode {
        AddressingMode::AbsoluteWord(expr) | AddressingMode::AbsoluteLong(expr) => expr,
        _ => return Err(EncodeError::legality("Expected branch target", ops[0].span)),
    };
    let opcode = row.opcode | enc.cond;
    let mut em = Emission::new();
    if size == Some(Size::Long) {
        em.value((opcode | 0x0040) as u32, 2, BE);
        em.relative(Field::signed(4, BE), target.clone(), PcAnchor::FieldStart, 0);
    } else {
        em.value(opcode as u32, 2, BE);
        em.relative(Field::signed(2, BE), target.clone(), PcAnchor::FieldStart, 0);
    }
    Ok(em)
}

pub fn encode_fnop(
    _enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    _ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let mut em = opword(row.opcode);
    em.value(0, 2, BE);
    Ok(em)
}

/// FSAVE, FRESTORE.
pub fn encode_fpu_state(
    enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let mut em = opword(row.opcode | ops[0].mode.ea_field());
    ea(enc, &mut em, &ops[0], Size::Long)?;
    Ok(em)
}

const fn fpu(
    mnemonic: &'static str,
    sizes: SizeSet,
    modes: &'static [ModeSet],
    opcode: u16,
    encode: EncodeFn,
) -> Row {
    Row::new(mnemonic, FPU, sizes, None, modes, opcode, encode)
}

const fn dyadic(mnemonic: &'static str, opmode: u16) -> [Row; 2] {
    [
        fpu(mnemonic, SizeSet::X, &[FPN, FPN], opmode, encode_fpu_arith),
        fpu(mnemonic, SizeSet::FPU, &[DATA, FPN], opmode, encode_fpu_arith),
    ]
}

const fn monadic(mnemonic: &'static str, opmode: u16) -> [Row; 3] {
    [
        fpu(mnemonic, SizeSet::X, &[FPN, FPN], opmode, encode_fpu_arith),
        fpu(mnemonic, SizeSet::FPU, &[DATA, FPN], opmode, encode_fpu_arith),
        fpu(mnemonic, SizeSet::X, &[FPN], opmode, encode_fpu_arith),
    ]
}

const FADD: [Row; 2] = dyadic("FADD", 0x22);
const FSUB: [Row; 2] = dyadic("FSUB", 0x28);
const FMUL: [Row; 2] = dyadic("FMUL", 0x23);
const FDIV: [Row; 2] = dyadic("FDIV", 0x20);
const FSGLMUL: [Row; 2] = dyadic("FSGLMUL", 0x27);
const FSGLDIV: [Row; 2] = dyadic("FSGLDIV", 0x24);
const FCMP: [Row; 2] = dyadic("FCMP", 0x38);
const FINT: [Row; 3] = monadic("FINT", 0x01);
const FINTRZ: [Row; 3] = monadic("FINTRZ", 0x03);
const FSQRT: [Row; 3] = monadic("FSQRT", 0x04);
const FABS: [Row; 3] = monadic("FABS", 0x18);
const FNEG: [Row; 3] = monadic("FNEG", 0x1A);

pub static FPU_ROWS: &[Row] = &[
    fpu("FMOVE", SizeSet::X, &[FPN, FPN], 0x00, encode_fpu_arith),
    fpu("FMOVE", SizeSet::FPU, &[DATA, FPN], 0x00, encode_fpu_arith),
    fpu("FMOVE", SizeSet::FPU, &[FPN, DATA_ALT], 0x00, encode_fpu_store),
    fpu("FMOVE", SizeSet::L, &[ALL, FPCTRL], 0x00, encode_fpu_control),
    fpu("FMOVE", SizeSet::L, &[FPCTRL, ALT], 0x00, encode_fpu_control),
    fpu("FMOVEM", SizeSet::X, &[FP_REGS, STORE], 0x00, encode_fmovem),
    fpu("FMOVEM", SizeSet::X, &[LOAD, FP_REGS], 0x00, encode_fmovem),
    fpu("FMOVEM", SizeSet::L, &[FPCTRL, STORE], 0x00, encode_fpu_control),
    fpu("FMOVEM", SizeSet::L, &[LOAD.union(ModeSet::IMM), FPCTRL], 0x00, encode_fpu_control),
    FADD[0], FADD[1],
    FSUB[0], FSUB[1],
    FMUL[0], FMUL[1],
    FDIV[0], FDIV[1],
    FSGLMUL[0], FSGLMUL[1],
    FSGLDIV[0], FSGLDIV[1],
    FCMP[0], FCMP[1],
    FINT[0], FINT[1], FINT[2],
    FINTRZ[0], FINTRZ[1], FINTRZ[2],
    FSQRT[0], FSQRT[1], FSQRT[2],
    FABS[0], FABS[1], FABS[2],
    FNEG[0], FNEG[1], FNEG[2],
    fpu("FTST", SizeSet::X, &[FPN], 0x3A, encode_fpu_arith),
    fpu("FTST", SizeSet::FPU, &[DATA], 0x3A, encode_fpu_arith),
    fpu("FBcc", SizeSet::WL, &[ABS], 0xF280, encode_fpu_branch),
    fpu("FNOP", SizeSet::NONE, &[], 0xF280, encode_fnop),
    fpu("FSAVE", SizeSet::NONE, &[STORE], 0xF300, encode_fpu_state),
    fpu("FRESTORE", SizeSet::NONE, &[LOAD], 0xF340, encode_fpu_state),
];
