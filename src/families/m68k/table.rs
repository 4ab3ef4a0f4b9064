// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Instruction legality table for the 680x0 family.
//!
//! Every mnemonic has one or more rows. A row lists the CPUs it exists on,
//! the allowed sizes, and one mode set per operand position. Later CPUs can
//! widen a position through `ext_modes`. Rows are searched in order; the
//! first row whose operand positions all accept the classified operands
//! wins, preferring rows that allow the requested size.

use tracing::trace;

use crate::core::context::Emission;
use crate::core::cpu::EncodeError;
use crate::core::tokenizer::Span;

use super::encoder::*;
use super::fpu::FPU_ROWS;
use super::operand::{ModeSet, Operand, Size, SizeSet};

/// Bit set of CPU models.
pub type CpuSet = u16;

pub const M68000: CpuSet = 0x01;
pub const M68010: CpuSet = 0x02;
pub const M68020: CpuSet = 0x04;
pub const M68030: CpuSet = 0x08;
pub const M68040: CpuSet = 0x10;
pub const M68060: CpuSet = 0x20;
pub const CPU32: CpuSet = 0x40;

pub const ALL_CPUS: CpuSet = 0x7f;
pub const M68010_UP: CpuSet = ALL_CPUS & !M68000;
/// Scaled index, long branches, EXTB, long multiply and divide.
pub const SCALED: CpuSet = M68020 | M68030 | M68040 | M68060 | CPU32;
/// Full extension format, memory indirection and bitfields.
pub const FULL_EXT: CpuSet = M68020 | M68030 | M68040 | M68060;
/// On-chip or coprocessor FPU.
pub const FPU: CpuSet = M68020 | M68030 | M68040 | M68060;

/// Nesting limit for instructions that re-dispatch as another mnemonic.
pub const MAX_REDIRECT: u8 = 2;

pub type EncodeFn = fn(&mut Enc, &Row, Option<Size>, &[Operand]) -> Result<Emission, EncodeError>;

#[derive(Clone, Copy)]
pub struct Row {
    pub mnemonic: &'static str,
    pub cpus: CpuSet,
    pub sizes: SizeSet,
    pub default_size: Option<Size>,
    pub modes: &'static [ModeSet],
    pub ext_modes: &'static [ModeSet],
    pub ext_cpus: CpuSet,
    pub opcode: u16,
    pub encode: EncodeFn,
}

impl Row {
    pub const fn new(
        mnemonic: &'static str,
        cpus: CpuSet,
        sizes: SizeSet,
        default_size: Option<Size>,
        modes: &'static [ModeSet],
        opcode: u16,
        encode: EncodeFn,
    ) -> Self {
        Self {
            mnemonic,
            cpus,
            sizes,
            default_size,
            modes,
            ext_modes: &[],
            ext_cpus: 0,
            opcode,
            encode,
        }
    }

    /// Extra modes per position, allowed on `cpus` only.
    pub const fn with_ext(mut self, cpus: CpuSet, modes: &'static [ModeSet]) -> Self {
        self.ext_cpus = cpus;
        self.ext_modes = modes;
        self
    }

    /// Modes allowed at operand `idx` on `cpu`.
    pub fn allowed(&self, idx: usize, cpu: CpuSet) -> ModeSet {
        let mut set = self.modes.get(idx).copied().unwrap_or(ModeSet::EMPTY);
        if cpu & self.ext_cpus != 0 {
            if let Some(ext) = self.ext_modes.get(idx) {
                set = set | *ext;
            }
        }
        if cpu & FULL_EXT != 0 {
            set = set.with_memory_indirect();
        }
        set
    }

    /// Index of the first operand the row rejects.
    fn first_illegal(&self, ops: &[Operand], cpu: CpuSet) -> Option<usize> {
        ops.iter()
            .enumerate()
            .position(|(idx, op)| !self.allowed(idx, cpu).intersects(op.mode.mode_bit()))
    }
}

/// Encoding state of one source instruction.
pub struct Enc {
    pub cpu: CpuSet,
    pub optimize: bool,
    pub span: Span,
    pub size_span: Option<Span>,
    /// Absolute address of the instruction, if its section is placed.
    pub pc: Option<u32>,
    /// Condition code of a Bcc, DBcc, Scc or FBcc mnemonic.
    pub cond: u16,
    pub depth: u8,
    /// Problems that do not stop the encoding.
    pub reports: Vec<EncodeError>,
}

impl Enc {
    pub fn new(cpu: CpuSet, optimize: bool, span: Span) -> Self {
        Self {
            cpu,
            optimize,
            span,
            size_span: None,
            pc: None,
            cond: 0,
            depth: 0,
            reports: Vec::new(),
        }
    }

    pub fn has(&self, features: CpuSet) -> bool {
        self.cpu & features != 0
    }

    pub fn report(&mut self, err: EncodeError) {
        self.reports.push(err);
    }

    /// Report a CPU mismatch unless the active CPU is in `features`.
    pub fn require(&mut self, features: CpuSet, what: &str, span: Span) {
        if !self.has(features) {
            self.report(EncodeError::cpu(
                format!("{what} not available on this CPU"),
                span,
            ));
        }
    }

    /// Encode the operands as a different mnemonic.
    pub fn redirect(
        &mut self,
        mnemonic: &str,
        size: Option<Size>,
        ops: &[Operand],
    ) -> Result<Emission, EncodeError> {
        if self.depth >= MAX_REDIRECT {
            return Err(EncodeError::syntax(
                format!("Too many redirections at {mnemonic}"),
                self.span,
            ));
        }
        trace!(mnemonic, depth = self.depth, "redirect");
        self.depth += 1;
        let result = dispatch(self, mnemonic, size, ops);
        self.depth -= 1;
        result
    }
}

/// All rows of a mnemonic.
pub fn rows_for<'a>(mnemonic: &'a str) -> impl Iterator<Item = &'static Row> + 'a {
    ROWS.iter()
        .chain(FPU_ROWS.iter())
        .filter(move |row| row.mnemonic == mnemonic)
}

pub fn has_mnemonic(mnemonic: &str) -> bool {
    rows_for(mnemonic).next().is_some()
}

/// Select the row for the classified operands and encode.
pub fn dispatch(
    enc: &mut Enc,
    mnemonic: &str,
    size: Option<Size>,
    ops: &[Operand],
) -> Result<Emission, EncodeError> {
    let candidates: Vec<&Row> = rows_for(mnemonic)
        .filter(|row| row.modes.len() == ops.len())
        .collect();
    if candidates.is_empty() {
        let message = if has_mnemonic(mnemonic) {
            format!("Wrong number of operands for {mnemonic}")
        } else {
            format!("Unknown instruction {mnemonic}")
        };
        return Err(EncodeError::syntax(message, enc.span));
    }

    let mut legal = Vec::new();
    let mut closest: Option<usize> = None;
    for row in candidates {
        match row.first_illegal(ops, enc.cpu) {
            None => legal.push(row),
            Some(idx) => closest = Some(closest.map_or(idx, |c| c.max(idx))),
        }
    }
    let Some(&first) = legal.first() else {
        let idx = closest.unwrap_or(0);
        return Err(EncodeError::legality(
            format!("Illegal addressing mode for operand {}", idx + 1),
            ops.get(idx).map_or(enc.span, |op| op.span),
        ));
    };
    let row = match size {
        Some(size) => legal
            .iter()
            .copied()
            .find(|row| row.sizes.contains(size))
            .unwrap_or(first),
        None => first,
    };

    if !enc.has(row.cpus) {
        enc.report(EncodeError::cpu(
            format!("{mnemonic} not available on this CPU"),
            enc.span,
        ));
    }
    let size = match size {
        Some(size) if row.sizes.contains(size) => Some(size),
        Some(size) => {
            enc.report(EncodeError::size(
                format!("Invalid size .{} for {mnemonic}", size.suffix()),
                enc.size_span.unwrap_or(enc.span),
            ));
            row.default_size
        }
        None => row.default_size,
    };
    trace!(mnemonic, opcode = row.opcode, "row selected");
    (row.encode)(enc, row, size, ops)
}

const DN: ModeSet = ModeSet::DN;
const AN: ModeSet = ModeSet::AN;
const AIND: ModeSet = ModeSet::AIND;
const POSTINC: ModeSet = ModeSet::POSTINC;
const PREDEC: ModeSet = ModeSet::PREDEC;
const DISP: ModeSet = ModeSet::DISP;
const IMM: ModeSet = ModeSet::IMM;
const ALL: ModeSet = ModeSet::ALL;
const DATA: ModeSet = ModeSet::DATA;
const ALT: ModeSet = ModeSet::ALTERABLE;
const DATA_ALT: ModeSet = ModeSet::DATA_ALT;
const MEM_ALT: ModeSet = ModeSet::MEM_ALT;
const CTRL: ModeSet = ModeSet::CONTROL;
const CTRL_ALT: ModeSet = ModeSet::CONTROL_ALT;
const ABS: ModeSet = ModeSet::ABSW.union(ModeSet::ABSL);
const PCREL: ModeSet = ModeSet::PCDISP.union(ModeSet::PCINDEX);
const REG: ModeSet = DN.union(AN);
const REGS: ModeSet = ModeSet::REGLIST.union(REG);
const BF: ModeSet = ModeSet::BITFIELD;
const BF_EA: ModeSet = DN.union(CTRL);
const BF_EA_ALT: ModeSet = DN.union(CTRL_ALT);
const CCR: ModeSet = ModeSet::CCR;
const SR: ModeSet = ModeSet::SR;
const USP: ModeSet = ModeSet::USP;
const CREG: ModeSet = ModeSet::CTRL;
const PAIR: ModeSet = ModeSet::PAIR;
const NO_OPS: &[ModeSet] = &[];

const fn alu(
    mnemonic: &'static str,
    modes: &'static [ModeSet],
    opcode: u16,
    encode: EncodeFn,
) -> Row {
    Row::new(mnemonic, ALL_CPUS, SizeSet::BWL, Some(Size::Word), modes, opcode, encode)
}

const fn inherent(mnemonic: &'static str, cpus: CpuSet, opcode: u16) -> Row {
    Row::new(mnemonic, cpus, SizeSet::NONE, None, NO_OPS, opcode, encode_inherent)
}

const fn shift(mnemonic: &'static str, opcode: u16) -> [Row; 4] {
    [
        alu(mnemonic, &[DN, DN], opcode, encode_shift),
        alu(mnemonic, &[IMM, DN], opcode, encode_shift),
        alu(mnemonic, &[DN], opcode, encode_shift),
        Row::new(mnemonic, ALL_CPUS, SizeSet::W, Some(Size::Word), &[MEM_ALT], opcode, encode_shift),
    ]
}

/// Bit number in a data register, then bit number as an immediate.
const fn bit_op(
    mnemonic: &'static str,
    opcode: u16,
    dynamic: &'static [ModeSet],
    fixed: &'static [ModeSet],
) -> [Row; 2] {
    [
        Row::new(mnemonic, ALL_CPUS, SizeSet::BL, None, dynamic, opcode, encode_bit),
        Row::new(mnemonic, ALL_CPUS, SizeSet::BL, None, fixed, opcode, encode_bit),
    ]
}

const fn bitfield(mnemonic: &'static str, modes: &'static [ModeSet], opcode: u16) -> Row {
    Row::new(mnemonic, FULL_EXT, SizeSet::NONE, None, modes, opcode, encode_bitfield)
}

const ASL: [Row; 4] = shift("ASL", 0xE100);
const ASR: [Row; 4] = shift("ASR", 0xE000);
const LSL: [Row; 4] = shift("LSL", 0xE108);
const LSR: [Row; 4] = shift("LSR", 0xE008);
const ROXL: [Row; 4] = shift("ROXL", 0xE110);
const ROXR: [Row; 4] = shift("ROXR", 0xE010);
const ROL: [Row; 4] = shift("ROL", 0xE118);
const ROR: [Row; 4] = shift("ROR", 0xE018);

const BTST_DYNAMIC: &[ModeSet] = &[DN, DATA];
const BTST_FIXED: &[ModeSet] = &[IMM, DATA.without(IMM)];
const BIT_ALT_DYNAMIC: &[ModeSet] = &[DN, DATA_ALT];
const BIT_ALT_FIXED: &[ModeSet] = &[IMM, DATA_ALT];

const BTST: [Row; 2] = bit_op("BTST", 0x0000, BTST_DYNAMIC, BTST_FIXED);
const BCHG: [Row; 2] = bit_op("BCHG", 0x0040, BIT_ALT_DYNAMIC, BIT_ALT_FIXED);
const BCLR: [Row; 2] = bit_op("BCLR", 0x0080, BIT_ALT_DYNAMIC, BIT_ALT_FIXED);
const BSET: [Row; 2] = bit_op("BSET", 0x00C0, BIT_ALT_DYNAMIC, BIT_ALT_FIXED);

pub static ROWS: &[Row] = &[
    // Integer arithmetic
    alu("ADD", &[IMM, ALT], 0xD000, encode_add_immediate),
    alu("ADD", &[ALL, REG], 0xD000, encode_arith),
    alu("ADD", &[DN, MEM_ALT], 0xD000, encode_arith),
    alu("SUB", &[IMM, ALT], 0x9000, encode_add_immediate),
    alu("SUB", &[ALL, REG], 0x9000, encode_arith),
    alu("SUB", &[DN, MEM_ALT], 0x9000, encode_arith),
    Row::new("ADDA", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[ALL, AN], 0xD0C0, encode_adda),
    Row::new("SUBA", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[ALL, AN], 0x90C0, encode_adda),
    alu("ADDI", &[IMM, DATA_ALT], 0x0600, encode_immediate_op),
    alu("SUBI", &[IMM, DATA_ALT], 0x0400, encode_immediate_op),
    alu("ADDQ", &[IMM, ALT], 0x5000, encode_quick),
    alu("SUBQ", &[IMM, ALT], 0x5100, encode_quick),
    alu("ADDX", &[DN, DN], 0xD100, encode_extended),
    alu("ADDX", &[PREDEC, PREDEC], 0xD100, encode_extended),
    alu("SUBX", &[DN, DN], 0x9100, encode_extended),
    alu("SUBX", &[PREDEC, PREDEC], 0x9100, encode_extended),
    Row::new("ABCD", ALL_CPUS, SizeSet::B, Some(Size::Byte), &[DN, DN], 0xC100, encode_extended),
    Row::new("ABCD", ALL_CPUS, SizeSet::B, Some(Size::Byte), &[PREDEC, PREDEC], 0xC100, encode_extended),
    Row::new("SBCD", ALL_CPUS, SizeSet::B, Some(Size::Byte), &[DN, DN], 0x8100, encode_extended),
    Row::new("SBCD", ALL_CPUS, SizeSet::B, Some(Size::Byte), &[PREDEC, PREDEC], 0x8100, encode_extended),
    Row::new("NBCD", ALL_CPUS, SizeSet::B, Some(Size::Byte), &[DATA_ALT], 0x4800, encode_single_ea),
    alu("CMP", &[IMM, DATA_ALT], 0xB000, encode_to_immediate).with_ext(SCALED, &[IMM, PCREL]),
    alu("CMP", &[ALL, REG], 0xB000, encode_arith),
    alu("CMP", &[POSTINC, POSTINC], 0xB000, encode_to_memory_compare),
    Row::new("CMPA", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[ALL, AN], 0xB0C0, encode_adda),
    alu("CMPI", &[IMM, DATA_ALT], 0x0C00, encode_immediate_op).with_ext(SCALED, &[IMM, PCREL]),
    alu("CMPM", &[POSTINC, POSTINC], 0xB108, encode_cmpm),
    alu("NEG", &[DATA_ALT], 0x4400, encode_unary),
    alu("NEGX", &[DATA_ALT], 0x4000, encode_unary),
    alu("CLR", &[DATA_ALT], 0x4200, encode_unary),
    alu("TST", &[DATA_ALT], 0x4A00, encode_unary).with_ext(SCALED, &[AN.union(PCREL).union(IMM)]),
    Row::new("MULU", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[DATA, DN], 0xC0C0, encode_multiply),
    Row::new("MULU", SCALED, SizeSet::L, Some(Size::Long), &[DATA, PAIR], 0xC0C0, encode_multiply),
    Row::new("MULS", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[DATA, DN], 0xC1C0, encode_multiply),
    Row::new("MULS", SCALED, SizeSet::L, Some(Size::Long), &[DATA, PAIR], 0xC1C0, encode_multiply),
    Row::new("DIVU", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[DATA, DN], 0x80C0, encode_divide),
    Row::new("DIVU", SCALED, SizeSet::L, Some(Size::Long), &[DATA, PAIR], 0x80C0, encode_divide),
    Row::new("DIVS", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[DATA, DN], 0x81C0, encode_divide),
    Row::new("DIVS", SCALED, SizeSet::L, Some(Size::Long), &[DATA, PAIR], 0x81C0, encode_divide),
    Row::new("DIVUL", SCALED, SizeSet::L, Some(Size::Long), &[DATA, PAIR], 0x80C0, encode_divide),
    Row::new("DIVSL", SCALED, SizeSet::L, Some(Size::Long), &[DATA, PAIR], 0x81C0, encode_divide),
    Row::new("EXT", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[DN], 0x4880, encode_ext),
    Row::new("EXTB", SCALED, SizeSet::L, Some(Size::Long), &[DN], 0x49C0, encode_ext),
    Row::new("CHK", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[DATA, DN], 0x4180, encode_chk),
    // Logic
    alu("AND", &[IMM, DATA_ALT.union(CCR).union(SR)], 0xC000, encode_to_immediate),
    alu("AND", &[DATA, DN], 0xC000, encode_arith),
    alu("AND", &[DN, MEM_ALT], 0xC000, encode_arith),
    alu("OR", &[IMM, DATA_ALT.union(CCR).union(SR)], 0x8000, encode_to_immediate),
    alu("OR", &[DATA, DN], 0x8000, encode_arith),
    alu("OR", &[DN, MEM_ALT], 0x8000, encode_arith),
    alu("EOR", &[IMM, DATA_ALT.union(CCR).union(SR)], 0xB100, encode_to_immediate),
    alu("EOR", &[DN, DATA_ALT], 0xB100, encode_eor),
    Row::new("ANDI", ALL_CPUS, SizeSet::B, Some(Size::Byte), &[IMM, CCR], 0x023C, encode_status_immediate),
    Row::new("ANDI", ALL_CPUS, SizeSet::W, Some(Size::Word), &[IMM, SR], 0x027C, encode_status_immediate),
    alu("ANDI", &[IMM, DATA_ALT], 0x0200, encode_immediate_op),
    Row::new("ORI", ALL_CPUS, SizeSet::B, Some(Size::Byte), &[IMM, CCR], 0x003C, encode_status_immediate),
    Row::new("ORI", ALL_CPUS, SizeSet::W, Some(Size::Word), &[IMM, SR], 0x007C, encode_status_immediate),
    alu("ORI", &[IMM, DATA_ALT], 0x0000, encode_immediate_op),
    Row::new("EORI", ALL_CPUS, SizeSet::B, Some(Size::Byte), &[IMM, CCR], 0x0A3C, encode_status_immediate),
    Row::new("EORI", ALL_CPUS, SizeSet::W, Some(Size::Word), &[IMM, SR], 0x0A7C, encode_status_immediate),
    alu("EORI", &[IMM, DATA_ALT], 0x0A00, encode_immediate_op),
    alu("NOT", &[DATA_ALT], 0x4600, encode_unary),
    // Shifts and rotates
    ASL[0], ASL[1], ASL[2], ASL[3],
    ASR[0], ASR[1], ASR[2], ASR[3],
    LSL[0], LSL[1], LSL[2], LSL[3],
    LSR[0], LSR[1], LSR[2], LSR[3],
    ROXL[0], ROXL[1], ROXL[2], ROXL[3],
    ROXR[0], ROXR[1], ROXR[2], ROXR[3],
    ROL[0], ROL[1], ROL[2], ROL[3],
    ROR[0], ROR[1], ROR[2], ROR[3],
    Row::new("SWAP", ALL_CPUS, SizeSet::W, Some(Size::Word), &[DN], 0x4840, encode_register),
    // Bit manipulation
    BTST[0], BTST[1],
    BCHG[0], BCHG[1],
    BCLR[0], BCLR[1],
    BSET[0], BSET[1],
    Row::new("TAS", ALL_CPUS, SizeSet::B, Some(Size::Byte), &[DATA_ALT], 0x4AC0, encode_single_ea),
    bitfield("BFTST", &[BF_EA, BF], 0xE8C0),
    bitfield("BFCHG", &[BF_EA_ALT, BF], 0xEAC0),
    bitfield("BFCLR", &[BF_EA_ALT, BF], 0xECC0),
    bitfield("BFSET", &[BF_EA_ALT, BF], 0xEEC0),
    bitfield("BFEXTU", &[BF_EA, BF, DN], 0xE9C0),
    bitfield("BFEXTS", &[BF_EA, BF, DN], 0xEBC0),
    bitfield("BFFFO", &[BF_EA, BF, DN], 0xEDC0),
    bitfield("BFINS", &[DN, BF_EA_ALT, BF], 0xEFC0),
    // Data movement
    alu("MOVE", &[ALL, AN], 0x0000, encode_to_movea),
    Row::new("MOVE", ALL_CPUS, SizeSet::W, Some(Size::Word), &[DATA, CCR], 0x44C0, encode_status_move),
    Row::new("MOVE", ALL_CPUS, SizeSet::W, Some(Size::Word), &[DATA, SR], 0x46C0, encode_status_move),
    Row::new("MOVE", ALL_CPUS, SizeSet::W, Some(Size::Word), &[SR, DATA_ALT], 0x40C0, encode_status_move),
    Row::new("MOVE", M68010_UP, SizeSet::W, Some(Size::Word), &[CCR, DATA_ALT], 0x42C0, encode_status_move),
    Row::new("MOVE", ALL_CPUS, SizeSet::L, Some(Size::Long), &[AN, USP], 0x4E60, encode_status_move),
    Row::new("MOVE", ALL_CPUS, SizeSet::L, Some(Size::Long), &[USP, AN], 0x4E68, encode_status_move),
    alu("MOVE", &[ALL, DATA_ALT], 0x0000, encode_move),
    Row::new("MOVEA", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[ALL, AN], 0x0040, encode_movea),
    Row::new("MOVEQ", ALL_CPUS, SizeSet::L, Some(Size::Long), &[IMM, DN], 0x7000, encode_moveq),
    Row::new("MOVEM", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[REGS.union(IMM), CTRL_ALT.union(PREDEC)], 0x4880, encode_movem),
    Row::new("MOVEM", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[CTRL.union(POSTINC), REGS], 0x4C80, encode_movem),
    Row::new("MOVEP", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[DN, DISP.union(AIND)], 0x0108, encode_movep),
    Row::new("MOVEP", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[DISP.union(AIND), DN], 0x0108, encode_movep),
    Row::new("MOVEC", M68010_UP, SizeSet::L, Some(Size::Long), &[CREG, REG], 0x4E7A, encode_movec),
    Row::new("MOVEC", M68010_UP, SizeSet::L, Some(Size::Long), &[REG, CREG], 0x4E7B, encode_movec),
    Row::new("MOVES", M68010_UP, SizeSet::BWL, Some(Size::Word), &[REG, MEM_ALT], 0x0E00, encode_moves),
    Row::new("MOVES", M68010_UP, SizeSet::BWL, Some(Size::Word), &[MEM_ALT, REG], 0x0E00, encode_moves),
    Row::new("EXG", ALL_CPUS, SizeSet::L, Some(Size::Long), &[REG, REG], 0xC100, encode_exg),
    Row::new("LEA", ALL_CPUS, SizeSet::L, Some(Size::Long), &[CTRL, AN], 0x41C0, encode_lea),
    Row::new("PEA", ALL_CPUS, SizeSet::L, Some(Size::Long), &[CTRL], 0x4840, encode_single_ea),
    Row::new("LINK", ALL_CPUS, SizeSet::WL, Some(Size::Word), &[AN, IMM], 0x4E50, encode_link),
    Row::new("UNLK", ALL_CPUS, SizeSet::NONE, None, &[AN], 0x4E58, encode_register),
    // Program control
    Row::new("Bcc", ALL_CPUS, SizeSet::BRANCH, None, &[ABS], 0x6000, encode_branch),
    Row::new("DBcc", ALL_CPUS, SizeSet::W, Some(Size::Word), &[DN, ABS], 0x50C8, encode_decrement_branch),
    Row::new("Scc", ALL_CPUS, SizeSet::B, Some(Size::Byte), &[DATA_ALT], 0x50C0, encode_set_condition),
    Row::new("JMP", ALL_CPUS, SizeSet::NONE, None, &[CTRL], 0x4EC0, encode_single_ea),
    Row::new("JSR", ALL_CPUS, SizeSet::NONE, None, &[CTRL], 0x4E80, encode_single_ea),
    Row::new("TRAP", ALL_CPUS, SizeSet::NONE, None, &[IMM], 0x4E40, encode_vector),
    Row::new("BKPT", M68010_UP, SizeSet::NONE, None, &[IMM], 0x4848, encode_vector),
    Row::new("STOP", ALL_CPUS, SizeSet::NONE, None, &[IMM], 0x4E72, encode_immediate_word),
    Row::new("RTD", M68010_UP, SizeSet::NONE, None, &[IMM], 0x4E74, encode_immediate_word),
    inherent("RTS", ALL_CPUS, 0x4E75),
    inherent("RTE", ALL_CPUS, 0x4E73),
    inherent("RTR", ALL_CPUS, 0x4E77),
    inherent("NOP", ALL_CPUS, 0x4E71),
    inherent("RESET", ALL_CPUS, 0x4E70),
    inherent("TRAPV", ALL_CPUS, 0x4E76),
    inherent("ILLEGAL", ALL_CPUS, 0x4AFC),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expr::Expr;
    use crate::families::m68k::operand::AddressingMode;

    fn op(mode: AddressingMode) -> Operand {
        Operand::new(mode, Span::default())
    }

    fn imm(value: i32) -> Operand {
        op(AddressingMode::Immediate(Expr::constant(value, Span::default())))
    }

    #[test]
    fn every_row_has_a_mode_set_per_operand() {
        for row in ROWS.iter().chain(FPU_ROWS.iter()) {
            assert!(
                row.ext_modes.is_empty() || row.ext_modes.len() == row.modes.len(),
                "{} has mismatched extension modes",
                row.mnemonic
            );
            assert!(row.cpus != 0, "{} has no CPU", row.mnemonic);
        }
    }

    #[test]
    fn extension_modes_depend_on_cpu() {
        let tst = rows_for("TST").next().unwrap();
        assert!(!tst.allowed(0, M68000).intersects(ModeSet::AN));
        assert!(tst.allowed(0, M68020).intersects(ModeSet::AN));
        assert!(!tst.allowed(0, CPU32).intersects(ModeSet::MEMIND));
        assert!(tst.allowed(0, M68030).intersects(ModeSet::MEMIND));
    }

    #[test]
    fn illegal_mode_names_the_operand() {
        let mut enc = Enc::new(M68000, true, Span::default());
        let err = dispatch(&mut enc, "JSR", None, &[op(AddressingMode::DataRegister(0))]).unwrap_err();
        assert_eq!(err.message, "Illegal addressing mode for operand 1");
        let err = dispatch(
            &mut enc,
            "MOVE",
            Some(Size::Word),
            &[op(AddressingMode::DataRegister(0)), imm(4)],
        )
        .unwrap_err();
        assert_eq!(err.message, "Illegal addressing mode for operand 2");
    }

    #[test]
    fn operand_count_and_unknown_mnemonics_are_syntax_errors() {
        let mut enc = Enc::new(M68000, true, Span::default());
        let err = dispatch(&mut enc, "RTS", None, &[imm(1)]).unwrap_err();
        assert_eq!(err.message, "Wrong number of operands for RTS");
        assert!(!has_mnemonic("FROB"));
    }

    #[test]
    fn size_and_cpu_problems_are_reported_without_failing() {
        let mut enc = Enc::new(M68000, true, Span::default());
        let em = dispatch(&mut enc, "EXTB", Some(Size::Long), &[op(AddressingMode::DataRegister(1))]);
        assert!(em.is_ok());
        assert_eq!(enc.reports.len(), 1);
        assert_eq!(enc.reports[0].kind, crate::core::assembler::error::AsmErrorKind::Cpu);

        let mut enc = Enc::new(M68000, true, Span::default());
        let em = dispatch(&mut enc, "SWAP", Some(Size::Byte), &[op(AddressingMode::DataRegister(1))]);
        assert!(em.is_ok());
        assert_eq!(enc.reports[0].kind, crate::core::assembler::error::AsmErrorKind::Size);
    }
}
