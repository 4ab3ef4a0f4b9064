// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! 680x0 instruction encoders.
//!
//! Each encoder builds the operation word, then appends the extension words
//! of its operands in source order through [`ea`]. Encoders that only pick a
//! better-suited mnemonic (ADD to ADDQ, MOVE to MOVEQ, ...) re-dispatch
//! through [`Enc::redirect`] so the target row's legality rules apply.

use crate::core::assembler::error::AsmErrorKind;
use crate::core::context::{Emission, PcAnchor};
use crate::core::cpu::EncodeError;
use crate::core::expr::{fits_signed, Expr};
use crate::core::patch::{Endian, Field};
use crate::core::tokenizer::Span;

use super::operand::{AddressingMode, Base, BitfieldPart, IndexReg, Operand, Size};
use super::table::{Enc, Row, FULL_EXT, SCALED};

const BE: Endian = Endian::Big;

pub(super) fn merge_low_byte(existing: u32, value: i32) -> u32 {
    (existing & 0xff00) | (value as u32 & 0xff)
}

/// Three-bit count of ADDQ, SUBQ and the immediate shifts; 8 encodes as 0.
fn merge_quick(existing: u32, value: i32) -> u32 {
    (existing & !0x0e00) | ((value as u32 & 7) << 9)
}

fn merge_vector(existing: u32, value: i32) -> u32 {
    (existing & 0xfff0) | (value as u32 & 0x0f)
}

fn merge_breakpoint(existing: u32, value: i32) -> u32 {
    (existing & 0xfff8) | (value as u32 & 0x07)
}

pub(super) fn opword(op: u16) -> Emission {
    let mut em = Emission::new();
    em.value(op as u32, 2, BE);
    em
}

fn sized(size: Option<Size>) -> Size {
    size.unwrap_or(Size::Word)
}

fn reg(op: &Operand) -> u16 {
    match op.mode {
        AddressingMode::DataRegister(r)
        | AddressingMode::AddressRegister(r)
        | AddressingMode::Indirect(r)
        | AddressingMode::PostIncrement(r)
        | AddressingMode::PreDecrement(r) => (r & 7) as u16,
        _ => 0,
    }
}

pub(super) fn constant(op: &Operand) -> Option<i32> {
    match &op.mode {
        AddressingMode::Immediate(expr) => expr.value(),
        _ => None,
    }
}

fn immediate_expr(op: &Operand) -> Result<&Expr, EncodeError> {
    match &op.mode {
        AddressingMode::Immediate(expr) => Ok(expr),
        _ => Err(EncodeError::legality("Expected immediate operand", op.span)),
    }
}

fn target_expr(op: &Operand) -> Result<&Expr, EncodeError> {
    match &op.mode {
        AddressingMode::AbsoluteWord(expr) | AddressingMode::AbsoluteLong(expr) => Ok(expr),
        _ => Err(EncodeError::legality("Expected branch target", op.span)),
    }
}

fn negated(op: &Operand, value: i32) -> Operand {
    let span = match &op.mode {
        AddressingMode::Immediate(expr) => expr.span,
        _ => op.span,
    };
    Operand::new(
        AddressingMode::Immediate(Expr::constant(value.wrapping_neg(), span)),
        op.span,
    )
}

fn is_address_register(op: &Operand) -> bool {
    matches!(op.mode, AddressingMode::AddressRegister(_))
}

fn byte_on_address_register(enc: &mut Enc, size: Size, op: &Operand) -> Size {
    if size == Size::Byte && is_address_register(op) {
        enc.report(EncodeError::size(
            "Byte size not allowed with an address register",
            op.span,
        ));
        return Size::Word;
    }
    size
}

/// Append the extension words of `op`. `size` sizes an immediate.
pub fn ea(enc: &mut Enc, em: &mut Emission, op: &Operand, size: Size) -> Result<(), EncodeError> {
    match &op.mode {
        AddressingMode::Displacement { disp, .. } => {
            em.field(Field::signed(2, BE), disp.clone());
        }
        AddressingMode::PcDisplacement { target } => match target {
            Some(target) => {
                em.relative(Field::signed(2, BE), target.clone(), PcAnchor::FieldStart, 0);
            }
            None => {
                em.value(0, 2, BE);
            }
        },
        AddressingMode::IndexedDisplacement { base, index, disp } => {
            indexed(enc, em, op.span, *base, *index, disp.as_ref());
        }
        AddressingMode::MemoryIndirectPre {
            base,
            index,
            bd,
            od,
        } => {
            enc.require(FULL_EXT, "Memory indirect addressing", op.span);
            full_format(enc, em, *base, *index, bd.as_ref(), Indirection::Pre(od.as_ref()));
        }
        AddressingMode::MemoryIndirectPost {
            base,
            index,
            bd,
            od,
        } => {
            enc.require(FULL_EXT, "Memory indirect addressing", op.span);
            full_format(
                enc,
                em,
                *base,
                Some(*index),
                bd.as_ref(),
                Indirection::Post(od.as_ref()),
            );
        }
        AddressingMode::AbsoluteWord(expr) => {
            em.field(Field::any(2, BE), expr.clone());
        }
        AddressingMode::AbsoluteLong(expr) => {
            em.field(Field::any(4, BE), expr.clone());
        }
        AddressingMode::Immediate(expr) => immediate(em, expr, size, op.span)?,
        _ => {}
    }
    Ok(())
}

fn immediate(em: &mut Emission, expr: &Expr, size: Size, span: Span) -> Result<(), EncodeError> {
    let field = match size {
        Size::Byte => Field::merged(2, BE, 0, -128, 255, merge_low_byte),
        Size::Word => Field::any(2, BE),
        Size::Long => Field::any(4, BE),
        other => {
            return Err(EncodeError::size(
                format!("Immediate of size .{} not supported here", other.suffix()),
                span,
            ))
        }
    };
    em.field(field, expr.clone());
    Ok(())
}

#[derive(Clone, Copy)]
enum Indirection<'a> {
    None,
    Pre(Option<&'a Expr>),
    Post(Option<&'a Expr>),
}

/// Displacement from the extension word about to be appended to `target`,
/// when both are known.
fn pc_distance(enc: &Enc, em: &Emission, target: &Expr) -> Option<i64> {
    let target = target.value()? as i64;
    let pc = enc.pc? as i64;
    Some(target - (pc + em.len() as i64))
}

fn indexed(
    enc: &mut Enc,
    em: &mut Emission,
    span: Span,
    base: Base,
    index: Option<IndexReg>,
    disp: Option<&Expr>,
) {
    if let Some(index) = index {
        if index.scale != 1 {
            enc.require(SCALED, "Scaled index", span);
        }
    }
    let known = match (base, disp) {
        (_, None) => Some(0),
        (Base::Pc, Some(target)) => pc_distance(enc, em, target),
        (_, Some(disp)) => disp.value().map(i64::from),
    };
    let brief = index.is_some()
        && matches!(base, Base::Address(_) | Base::Pc)
        && (known.is_some_and(|d| fits_signed(d, 8)) || !enc.has(FULL_EXT));
    let Some(index) = index.filter(|_| brief) else {
        enc.require(FULL_EXT, "Full extension format", span);
        full_format(enc, em, base, index, disp, Indirection::None);
        return;
    };

    let ext = index.ext_bits() as u32;
    match disp {
        None => {
            em.value(ext, 2, BE);
        }
        Some(disp) => {
            let field = Field::merged(2, BE, ext, -128, 127, merge_low_byte);
            if base == Base::Pc {
                em.relative(field, disp.clone(), PcAnchor::FieldStart, 0);
            } else {
                em.field(field, disp.clone());
            }
        }
    }
}

fn full_format(
    enc: &mut Enc,
    em: &mut Emission,
    base: Base,
    index: Option<IndexReg>,
    bd: Option<&Expr>,
    indirection: Indirection<'_>,
) {
    let mut ext: u16 = 0x0100;
    match index {
        Some(index) => ext |= index.ext_bits(),
        None => ext |= 0x0040,
    }
    if matches!(base, Base::Suppressed | Base::ZeroPc) {
        ext |= 0x0080;
    }

    let pc_relative = base == Base::Pc;
    let bd_size: u16 = match bd {
        None => 1,
        Some(bd) => {
            let known = if pc_relative {
                pc_distance(enc, em, bd)
            } else {
                bd.value().map(i64::from)
            };
            match known {
                Some(value) if fits_signed(value, 16) => 2,
                Some(_) => 3,
                // register-relative offsets of an indexed mode stay word sized
                None if matches!(indirection, Indirection::None) => 2,
                None => 3,
            }
        }
    };
    ext |= bd_size << 4;

    let od = match indirection {
        Indirection::None => None,
        Indirection::Pre(od) | Indirection::Post(od) => {
            let od_size: u16 = match od.map(Expr::value) {
                None => 1,
                Some(Some(value)) if fits_signed(value as i64, 16) => 2,
                Some(_) => 3,
            };
            ext |= od_size;
            if matches!(indirection, Indirection::Post(_)) {
                ext |= 0x0004;
            }
            od.map(|od| (od, od_size))
        }
    };

    em.value(ext as u32, 2, BE);
    if let Some(bd) = bd {
        let field = if bd_size == 2 {
            Field::signed(2, BE)
        } else {
            Field::any(4, BE)
        };
        if pc_relative {
            // PC is the address of the extension word
            em.relative(field, bd.clone(), PcAnchor::FieldStart, -2);
        } else {
            em.field(field, bd.clone());
        }
    }
    if let Some((od, od_size)) = od {
        let field = if od_size == 2 {
            Field::signed(2, BE)
        } else {
            Field::any(4, BE)
        };
        em.field(field, od.clone());
    }
}

pub fn encode_inherent(
    _enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    _ops: &[Operand],
) -> Result<Emission, EncodeError> {
    Ok(opword(row.opcode))
}

/// ADD/SUB with an immediate source.
pub fn encode_add_immediate(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let (quick, opposite, immediate, address) = if row.mnemonic == "ADD" {
        ("ADDQ", "SUBQ", "ADDI", "ADDA")
    } else {
        ("SUBQ", "ADDQ", "SUBI", "SUBA")
    };
    if is_address_register(&ops[1]) {
        return enc.redirect(address, size, ops);
    }
    if enc.optimize {
        match constant(&ops[0]) {
            Some(value) if (1..=8).contains(&value) => return enc.redirect(quick, size, ops),
            Some(value) if (-8..=-1).contains(&value) => {
                let ops = [negated(&ops[0], value), ops[1].clone()];
                return enc.redirect(opposite, size, &ops);
            }
            _ => {}
        }
    }
    enc.redirect(immediate, size, ops)
}

/// Two-operand ALU form with a data register on one side.
pub fn encode_arith(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = sized(size);
    let (src, dst) = (&ops[0], &ops[1]);
    if is_address_register(dst) {
        return enc.redirect(&format!("{}A", row.mnemonic), Some(size), ops);
    }
    let size = byte_on_address_register(enc, size, src);
    let mut em;
    if let AddressingMode::DataRegister(n) = dst.mode {
        em = opword(row.opcode | (n as u16) << 9 | size.code() << 6 | src.mode.ea_field());
        ea(enc, &mut em, src, size)?;
    } else {
        em = opword(row.opcode | reg(src) << 9 | (4 + size.code()) << 6 | dst.mode.ea_field());
        ea(enc, &mut em, dst, size)?;
    }
    Ok(em)
}

/// ADDA, SUBA, CMPA.
pub fn encode_adda(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = match size {
        Some(Size::Long) => Size::Long,
        _ => Size::Word,
    };
    if enc.optimize && row.mnemonic != "CMPA" {
        let (quick, opposite) = if row.mnemonic == "ADDA" {
            ("ADDQ", "SUBQ")
        } else {
            ("SUBQ", "ADDQ")
        };
        match constant(&ops[0]) {
            Some(value) if (1..=8).contains(&value) => return enc.redirect(quick, Some(size), ops),
            Some(value) if (-8..=-1).contains(&value) => {
                let ops = [negated(&ops[0], value), ops[1].clone()];
                return enc.redirect(opposite, Some(size), &ops);
            }
            _ => {}
        }
    }
    let long = if size == Size::Long { 0x0100 } else { 0 };
    let (src, dst) = (&ops[0], &ops[1]);
    let mut em = opword(row.opcode | reg(dst) << 9 | long | src.mode.ea_field());
    ea(enc, &mut em, src, size)?;
    Ok(em)
}

/// ADDI, SUBI, ANDI, ORI, EORI, CMPI.
pub fn encode_immediate_op(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = sized(size);
    let (src, dst) = (&ops[0], &ops[1]);
    let mut em = opword(row.opcode | size.code() << 6 | dst.mode.ea_field());
    ea(enc, &mut em, src, size)?;
    ea(enc, &mut em, dst, size)?;
    Ok(em)
}

/// ANDI, ORI, EORI to CCR or SR.
pub fn encode_status_immediate(
    enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = match ops[1].mode {
        AddressingMode::Ccr => Size::Byte,
        _ => Size::Word,
    };
    let mut em = opword(row.opcode);
    ea(enc, &mut em, &ops[0], size)?;
    Ok(em)
}

/// ADDQ, SUBQ.
pub fn encode_quick(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let (src, dst) = (&ops[0], &ops[1]);
    let size = byte_on_address_register(enc, sized(size), dst);
    let data = immediate_expr(src)?;
    let base = row.opcode | size.code() << 6 | dst.mode.ea_field();
    let mut em = Emission::new();
    em.field(Field::merged(2, BE, base as u32, 1, 8, merge_quick), data.clone());
    ea(enc, &mut em, dst, size)?;
    Ok(em)
}

/// ADDX, SUBX, ABCD, SBCD.
pub fn encode_extended(
    _enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = sized(size);
    let (src, dst) = (&ops[0], &ops[1]);
    let memory = match src.mode {
        AddressingMode::PreDecrement(_) => 0x0008,
        _ => 0,
    };
    Ok(opword(row.opcode | reg(dst) << 9 | size.code() << 6 | memory | reg(src)))
}

/// CMP, AND, OR, EOR with an immediate source become the immediate form.
pub fn encode_to_immediate(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = match ops[1].mode {
        AddressingMode::Ccr | AddressingMode::Sr => None,
        _ => size,
    };
    enc.redirect(&format!("{}I", row.mnemonic), size, ops)
}

pub fn encode_to_memory_compare(
    enc: &mut Enc,
    _row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    enc.redirect("CMPM", size, ops)
}

pub fn encode_to_movea(
    enc: &mut Enc,
    _row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    enc.redirect("MOVEA", size, ops)
}

pub fn encode_cmpm(
    _enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = sized(size);
    Ok(opword(row.opcode | reg(&ops[1]) << 9 | size.code() << 6 | reg(&ops[0])))
}

pub fn encode_eor(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = sized(size);
    let (src, dst) = (&ops[0], &ops[1]);
    let mut em = opword(row.opcode | reg(src) << 9 | size.code() << 6 | dst.mode.ea_field());
    ea(enc, &mut em, dst, size)?;
    Ok(em)
}

/// NEG, NEGX, NOT, CLR, TST.
pub fn encode_unary(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = byte_on_address_register(enc, sized(size), &ops[0]);
    let mut em = opword(row.opcode | size.code() << 6 | ops[0].mode.ea_field());
    ea(enc, &mut em, &ops[0], size)?;
    Ok(em)
}

pub fn encode_multiply(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let (src, dst) = (&ops[0], &ops[1]);
    let signed = u16::from(row.opcode & 0x0100 != 0);
    if let (AddressingMode::DataRegister(n), Size::Word) = (&dst.mode, sized(size)) {
        let mut em = opword(row.opcode | (*n as u16) << 9 | src.mode.ea_field());
        ea(enc, &mut em, src, Size::Word)?;
        return Ok(em);
    }
    enc.require(SCALED, "Long multiply", enc.span);
    let (high, low, wide) = match dst.mode {
        AddressingMode::DataRegister(n) => (n, n, 0),
        AddressingMode::RegisterPair(h, l) => (h, l, 1),
        _ => return Err(EncodeError::legality("Illegal addressing mode for operand 2", dst.span)),
    };
    let mut em = opword(0x4C00 | src.mode.ea_field());
    let ext = (low as u16) << 12 | signed << 11 | wide << 10 | high as u16;
    em.value(ext as u32, 2, BE);
    ea(enc, &mut em, src, Size::Long)?;
    Ok(em)
}

/// DIVU, DIVS, DIVUL, DIVSL.
pub fn encode_divide(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let (src, dst) = (&ops[0], &ops[1]);
    let signed = u16::from(row.opcode & 0x0100 != 0);
    if let (AddressingMode::DataRegister(n), Size::Word) = (&dst.mode, sized(size)) {
        let mut em = opword(row.opcode | (*n as u16) << 9 | src.mode.ea_field());
        ea(enc, &mut em, src, Size::Word)?;
        return Ok(em);
    }
    enc.require(SCALED, "Long divide", enc.span);
    let remainder_form = row.mnemonic.ends_with('L');
    let (remainder, quotient, wide) = match dst.mode {
        AddressingMode::DataRegister(n) => (n, n, 0),
        AddressingMode::RegisterPair(r, q) => (r, q, u16::from(!remainder_form)),
        _ => return Err(EncodeError::legality("Illegal addressing mode for operand 2", dst.span)),
    };
    let mut em = opword(0x4C40 | src.mode.ea_field());
    let ext = (quotient as u16) << 12 | signed << 11 | wide << 10 | remainder as u16;
    em.value(ext as u32, 2, BE);
    ea(enc, &mut em, src, Size::Long)?;
    Ok(em)
}

/// EXT, EXTB.
pub fn encode_ext(
    _enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let long = if row.mnemonic == "EXT" && size == Some(Size::Long) {
        0x0040
    } else {
        0
    };
    Ok(opword(row.opcode | long | reg(&ops[0])))
}

/// SWAP, UNLK.
pub fn encode_register(
    _enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    Ok(opword(row.opcode | reg(&ops[0])))
}

pub fn encode_chk(
    enc: &mut Enc,
    _row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = sized(size);
    let opcode = if size == Size::Long {
        enc.require(SCALED, "CHK.L", enc.span);
        0x4100
    } else {
        0x4180
    };
    let (src, dst) = (&ops[0], &ops[1]);
    let mut em = opword(opcode | reg(dst) << 9 | src.mode.ea_field());
    ea(enc, &mut em, src, size)?;
    Ok(em)
}

/// ASL, ASR, LSL, LSR, ROXL, ROXR, ROL, ROR.
pub fn encode_shift(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = sized(size);
    let kind = (row.opcode >> 3) & 3;
    let dir = row.opcode & 0x0100;
    let register_form = 0xE000 | dir | size.code() << 6 | kind << 3;
    match ops {
        [count, dst] => match &count.mode {
            AddressingMode::DataRegister(c) => Ok(opword(
                register_form | (*c as u16) << 9 | 0x0020 | reg(dst),
            )),
            _ => {
                let count = immediate_expr(count)?;
                let mut em = Emission::new();
                em.field(
                    Field::merged(2, BE, (register_form | reg(dst)) as u32, 1, 8, merge_quick),
                    count.clone(),
                );
                Ok(em)
            }
        },
        [dst] if matches!(dst.mode, AddressingMode::DataRegister(_)) => {
            Ok(opword(register_form | 1 << 9 | reg(dst)))
        }
        [dst] => {
            let mut em = opword(0xE0C0 | kind << 9 | dir | dst.mode.ea_field());
            ea(enc, &mut em, dst, Size::Word)?;
            Ok(em)
        }
        _ => Err(EncodeError::syntax("Wrong number of operands", enc.span)),
    }
}

/// BTST, BCHG, BCLR, BSET.
pub fn encode_bit(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let kind = (row.opcode >> 6) & 3;
    let (bit, dst) = (&ops[0], &ops[1]);
    let on_register = matches!(dst.mode, AddressingMode::DataRegister(_));
    let natural = if on_register { Size::Long } else { Size::Byte };
    if let Some(size) = size.filter(|s| *s != natural) {
        enc.report(EncodeError::size(
            format!(
                "Bit operation on {} is .{}, not .{}",
                if on_register { "a data register" } else { "memory" },
                natural.suffix(),
                size.suffix()
            ),
            enc.size_span.unwrap_or(enc.span),
        ));
    }
    let mut em;
    if let AddressingMode::DataRegister(n) = bit.mode {
        em = opword(0x0100 | (n as u16) << 9 | kind << 6 | dst.mode.ea_field());
    } else {
        let number = immediate_expr(bit)?;
        let high = if on_register { 31 } else { 7 };
        em = opword(0x0800 | kind << 6 | dst.mode.ea_field());
        em.field(Field::new(2, BE, 0, high), number.clone());
    }
    ea(enc, &mut em, dst, Size::Byte)?;
    Ok(em)
}

fn bitfield_constant(
    enc: &mut Enc,
    expr: &Expr,
    low: i32,
    high: i32,
    what: &str,
) -> Result<u16, EncodeError> {
    let Some(value) = expr.value() else {
        return Err(EncodeError::with_span(
            AsmErrorKind::Expression,
            format!("Bitfield {what} must be a constant"),
            expr.span,
        ));
    };
    if !(low..=high).contains(&value) {
        enc.report(EncodeError::range(
            format!("Bitfield {what} {value} out of range ({low}..{high})"),
            expr.span,
        ));
    }
    Ok((value & 31) as u16)
}

/// BFTST, BFCHG, BFCLR, BFSET, BFEXTU, BFEXTS, BFFFO, BFINS.
pub fn encode_bitfield(
    enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let (target, spec, data) = match row.mnemonic {
        "BFINS" => (&ops[1], &ops[2], reg(&ops[0])),
        "BFEXTU" | "BFEXTS" | "BFFFO" => (&ops[0], &ops[1], reg(&ops[2])),
        _ => (&ops[0], &ops[1], 0),
    };
    let AddressingMode::Bitfield { offset, width } = &spec.mode else {
        return Err(EncodeError::legality("Expected bitfield specifier", spec.span));
    };
    let mut ext = data << 12;
    ext |= match offset {
        BitfieldPart::Register(n) => 0x0800 | (*n as u16) << 6,
        BitfieldPart::Value(expr) => bitfield_constant(enc, expr, 0, 31, "offset")? << 6,
    };
    ext |= match width {
        BitfieldPart::Register(n) => 0x0020 | *n as u16,
        BitfieldPart::Value(expr) => bitfield_constant(enc, expr, 1, 32, "width")?,
    };
    let mut em = opword(row.opcode | target.mode.ea_field());
    em.value(ext as u32, 2, BE);
    ea(enc, &mut em, target, Size::Long)?;
    Ok(em)
}

pub fn encode_move(
    enc: &mut Enc,
    _row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = sized(size);
    let (src, dst) = (&ops[0], &ops[1]);
    if enc.optimize && size == Size::Long {
        if let (Some(value), AddressingMode::DataRegister(_)) = (constant(src), &dst.mode) {
            if (-128..=127).contains(&value) {
                return enc.redirect("MOVEQ", Some(Size::Long), ops);
            }
        }
    }
    let size = byte_on_address_register(enc, size, src);
    let dst_ea = dst.mode.ea_field();
    let word = size.move_code() << 12 | (dst_ea & 7) << 9 | (dst_ea >> 3) << 6 | src.mode.ea_field();
    let mut em = opword(word);
    ea(enc, &mut em, src, size)?;
    ea(enc, &mut em, dst, size)?;
    Ok(em)
}

pub fn encode_movea(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = match size {
        Some(Size::Long) => Size::Long,
        _ => Size::Word,
    };
    let (src, dst) = (&ops[0], &ops[1]);
    let mut em = opword(size.move_code() << 12 | reg(dst) << 9 | row.opcode | src.mode.ea_field());
    ea(enc, &mut em, src, size)?;
    Ok(em)
}

pub fn encode_moveq(
    _enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let data = immediate_expr(&ops[0])?;
    let base = row.opcode | reg(&ops[1]) << 9;
    let mut em = Emission::new();
    em.field(Field::merged(2, BE, base as u32, -128, 127, merge_low_byte), data.clone());
    Ok(em)
}

/// MOVE to or from CCR, SR and USP.
pub fn encode_status_move(
    enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let (src, dst) = (&ops[0], &ops[1]);
    let (opcode, operand) = match (&src.mode, &dst.mode) {
        (AddressingMode::AddressRegister(n), AddressingMode::Usp)
        | (AddressingMode::Usp, AddressingMode::AddressRegister(n)) => {
            return Ok(opword(row.opcode | *n as u16));
        }
        (_, AddressingMode::Ccr | AddressingMode::Sr) => (row.opcode | src.mode.ea_field(), src),
        _ => (row.opcode | dst.mode.ea_field(), dst),
    };
    let mut em = opword(opcode);
    ea(enc, &mut em, operand, Size::Word)?;
    Ok(em)
}

fn register_mask(mode: &AddressingMode) -> u16 {
    match mode {
        AddressingMode::RegisterList(mask) => *mask,
        AddressingMode::DataRegister(n) => 1 << n,
        AddressingMode::AddressRegister(n) => 1 << (n + 8),
        _ => 0,
    }
}

pub fn encode_movem(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = match size {
        Some(Size::Long) => Size::Long,
        _ => Size::Word,
    };
    let long = if size == Size::Long { 0x0040 } else { 0 };
    let to_memory = row.opcode == 0x4880;
    let (list, memory) = if to_memory {
        (&ops[0], &ops[1])
    } else {
        (&ops[1], &ops[0])
    };
    let mut em = opword(row.opcode | long | memory.mode.ea_field());
    match &list.mode {
        AddressingMode::Immediate(mask) => {
            em.field(Field::new(2, BE, 0, 0xffff), mask.clone());
        }
        mode => {
            let mut mask = register_mask(mode);
            if matches!(memory.mode, AddressingMode::PreDecrement(_)) {
                mask = mask.reverse_bits();
            }
            em.value(mask as u32, 2, BE);
        }
    }
    ea(enc, &mut em, memory, size)?;
    Ok(em)
}

pub fn encode_movep(
    _enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let long = if size == Some(Size::Long) { 0x0040 } else { 0 };
    let (data, memory, to_memory) = match ops[0].mode {
        AddressingMode::DataRegister(_) => (&ops[0], &ops[1], 0x0080),
        _ => (&ops[1], &ops[0], 0),
    };
    let mut em = opword(row.opcode | reg(data) << 9 | to_memory | long | reg(memory));
    match &memory.mode {
        AddressingMode::Displacement { disp, .. } => {
            em.field(Field::signed(2, BE), disp.clone());
        }
        _ => {
            em.value(0, 2, BE);
        }
    }
    Ok(em)
}

pub fn encode_movec(
    _enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let (control, general) = match (&ops[0].mode, &ops[1].mode) {
        (AddressingMode::ControlRegister(c), other) | (other, AddressingMode::ControlRegister(c)) => {
            (*c, other.register().unwrap_or(0))
        }
        _ => return Err(EncodeError::legality("Expected control register", ops[0].span)),
    };
    let mut em = opword(row.opcode);
    em.value(((general as u32) << 12) | control as u32, 2, BE);
    Ok(em)
}

pub fn encode_moves(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let size = sized(size);
    let (general, memory, to_memory) = match ops[0].mode.register() {
        Some(r) => (r, &ops[1], 0x0800),
        None => (ops[1].mode.register().unwrap_or(0), &ops[0], 0),
    };
    let mut em = opword(row.opcode | size.code() << 6 | memory.mode.ea_field());
    em.value(((general as u32) << 12) | to_memory, 2, BE);
    ea(enc, &mut em, memory, size)?;
    Ok(em)
}

pub fn encode_exg(
    _enc: &mut Enc,
    _row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let word = match (&ops[0].mode, &ops[1].mode) {
        (AddressingMode::DataRegister(x), AddressingMode::DataRegister(y)) => {
            0xC140 | (*x as u16) << 9 | *y as u16
        }
        (AddressingMode::AddressRegister(x), AddressingMode::AddressRegister(y)) => {
            0xC148 | (*x as u16) << 9 | *y as u16
        }
        (AddressingMode::DataRegister(x), AddressingMode::AddressRegister(y))
        | (AddressingMode::AddressRegister(y), AddressingMode::DataRegister(x)) => {
            0xC188 | (*x as u16) << 9 | *y as u16
        }
        _ => return Err(EncodeError::legality("Illegal addressing mode for operand 1", ops[0].span)),
    };
    Ok(opword(word))
}

pub fn encode_lea(
    enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let (src, dst) = (&ops[0], &ops[1]);
    let mut em = opword(row.opcode | reg(dst) << 9 | src.mode.ea_field());
    ea(enc, &mut em, src, Size::Long)?;
    Ok(em)
}

/// PEA, JMP, JSR, NBCD, TAS.
pub fn encode_single_ea(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let mut em = opword(row.opcode | ops[0].mode.ea_field());
    ea(enc, &mut em, &ops[0], size.unwrap_or(Size::Long))?;
    Ok(em)
}

pub fn encode_set_condition(
    enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let mut em = opword(row.opcode | enc.cond << 8 | ops[0].mode.ea_field());
    ea(enc, &mut em, &ops[0], Size::Byte)?;
    Ok(em)
}

pub fn encode_link(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let displacement = immediate_expr(&ops[1])?;
    let an = reg(&ops[0]);
    let mut em;
    if size == Some(Size::Long) {
        enc.require(SCALED, "LINK.L", enc.span);
        em = opword(0x4808 | an);
        em.field(Field::signed(4, BE), displacement.clone());
    } else {
        em = opword(row.opcode | an);
        em.field(Field::signed(2, BE), displacement.clone());
    }
    Ok(em)
}

/// TRAP, BKPT.
pub fn encode_vector(
    _enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let vector = immediate_expr(&ops[0])?;
    let field = if row.mnemonic == "TRAP" {
        Field::merged(2, BE, row.opcode as u32, 0, 15, merge_vector)
    } else {
        Field::merged(2, BE, row.opcode as u32, 0, 7, merge_breakpoint)
    };
    let mut em = Emission::new();
    em.field(field, vector.clone());
    Ok(em)
}

/// STOP, RTD.
pub fn encode_immediate_word(
    _enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let value = immediate_expr(&ops[0])?;
    let field = if row.mnemonic == "RTD" {
        Field::signed(2, BE)
    } else {
        Field::any(2, BE)
    };
    let mut em = opword(row.opcode);
    em.field(field, value.clone());
    Ok(em)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchForm {
    Short,
    Word,
    Long,
}

/// Short displacements that select a longer form instead: `$00` always,
/// `$FF` on CPUs with 32-bit branches.
fn short_branch_reserved(enc: &Enc) -> (i64, i64) {
    if enc.has(SCALED) {
        (-1, 0)
    } else {
        (0, 0)
    }
}

/// BRA, BSR and Bcc. Unsized branches to a known target within reach take
/// the short form when optimizing; everything else takes the word form.
pub fn encode_branch(
    enc: &mut Enc,
    row: &Row,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let target = target_expr(&ops[0])?;
    let opcode = row.opcode | enc.cond << 8;
    let distance = target
        .value()
        .zip(enc.pc)
        .map(|(target, pc)| target as i64 - (pc as i64 + 2));
    let (reserved_low, reserved_high) = short_branch_reserved(enc);
    let form = match size {
        Some(Size::Short | Size::Byte) => BranchForm::Short,
        Some(Size::Word) => BranchForm::Word,
        Some(Size::Long) => BranchForm::Long,
        _ => match distance {
            Some(d)
                if enc.optimize
                    && fits_signed(d, 8)
                    && !(reserved_low..=reserved_high).contains(&d) =>
            {
                BranchForm::Short
            }
            Some(d) if !fits_signed(d, 16) && enc.has(SCALED) => BranchForm::Long,
            _ => BranchForm::Word,
        },
    };
    let mut em = Emission::new();
    match form {
        BranchForm::Short => {
            em.relative(
                Field::merged(2, BE, opcode as u32, -128, 127, merge_low_byte)
                    .reserving(reserved_low, reserved_high),
                target.clone(),
                PcAnchor::FieldStart,
                2,
            );
        }
        BranchForm::Word => {
            em.value(opcode as u32, 2, BE);
            em.relative(Field::signed(2, BE), target.clone(), PcAnchor::FieldStart, 0);
        }
        BranchForm::Long => {
            enc.require(SCALED, "Long branch", enc.span);
            em.value((opcode | 0x00ff) as u32, 2, BE);
            em.relative(Field::signed(4, BE), target.clone(), PcAnchor::FieldStart, 0);
        }
    }
    Ok(em)
}

/// DBcc, DBRA.
pub fn encode_decrement_branch(
    enc: &mut Enc,
    row: &Row,
    _size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let target = target_expr(&ops[1])?;
    let mut em = opword(row.opcode | enc.cond << 8 | reg(&ops[0]));
    em.relative(Field::signed(2, BE), target.clone(), PcAnchor::FieldStart, 0);
    Ok(em)
}
