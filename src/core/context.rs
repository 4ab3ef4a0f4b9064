// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Per-assembly-unit state and the byte sink used by every encoder.
//!
//! [`AsmContext`] carries the active CPU, the optimization toggle, the
//! section and symbol tables, the patch queue and the accumulated
//! diagnostics. Encoders describe an instruction as an [`Emission`] and
//! commit it in one step, so an instruction rejected during operand checks
//! leaves no bytes behind.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::core::assembler::error::{AsmError, AsmErrorKind, Diagnostic, Severity};
use crate::core::cpu::{CpuType, EncodeError};
use crate::core::expr::{EvalError, Expr, SectionId};
use crate::core::patch::{from_bytes, to_bytes, Endian, Field, Patch, PatchQueue};
use crate::core::section::SectionTable;
use crate::core::symbol_table::{SymbolResolver, SymbolTable, SymbolValue};
use crate::core::tokenizer::Span;

/// Options fixed per assembly unit (CLI, overridable by directives).
#[derive(Debug, Clone, Copy)]
pub struct AsmOptions {
    pub optimize: bool,
    pub fill: u8,
}

impl Default for AsmOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            fill: 0xff,
        }
    }
}

/// Reference point of a PC-relative field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcAnchor {
    /// First byte of the instruction.
    InstructionStart,
    /// First byte after the instruction.
    InstructionEnd,
    /// First byte of the field itself.
    FieldStart,
}

#[derive(Debug, Clone)]
enum Piece {
    Bytes(Vec<u8>),
    Field {
        field: Field,
        expr: Expr,
    },
    Relative {
        field: Field,
        target: Expr,
        anchor: PcAnchor,
        adjustment: i32,
    },
}

impl Piece {
    fn len(&self) -> u32 {
        match self {
            Piece::Bytes(bytes) => bytes.len() as u32,
            Piece::Field { field, .. } | Piece::Relative { field, .. } => field.width as u32,
        }
    }
}

/// Encoded instruction waiting to be committed to the sink.
#[derive(Debug, Clone, Default)]
pub struct Emission {
    pieces: Vec<Piece>,
}

impl Emission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.pieces.push(Piece::Bytes(bytes.to_vec()));
        self
    }

    pub fn value(&mut self, value: u32, width: u8, endian: Endian) -> &mut Self {
        self.pieces.push(Piece::Bytes(to_bytes(value, width, endian)));
        self
    }

    pub fn field(&mut self, field: Field, expr: Expr) -> &mut Self {
        self.pieces.push(Piece::Field { field, expr });
        self
    }

    /// Field holding `target - (anchor + adjustment)`.
    pub fn relative(
        &mut self,
        field: Field,
        target: Expr,
        anchor: PcAnchor,
        adjustment: i32,
    ) -> &mut Self {
        self.pieces.push(Piece::Relative {
            field,
            target,
            anchor,
            adjustment,
        });
        self
    }

    pub fn len(&self) -> u32 {
        self.pieces.iter().map(Piece::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

pub struct AsmContext {
    cpu: CpuType,
    options: AsmOptions,
    endian: Endian,
    sections: SectionTable,
    symbols: SymbolTable,
    patches: PatchQueue,
    diagnostics: Vec<Diagnostic>,
    line: u32,
}

impl AsmContext {
    pub fn new(cpu: CpuType, endian: Endian, default_origin: Option<u32>, options: AsmOptions) -> Self {
        Self {
            cpu,
            options,
            endian,
            sections: SectionTable::new(default_origin),
            symbols: SymbolTable::new(),
            patches: PatchQueue::new(),
            diagnostics: Vec::new(),
            line: 0,
        }
    }

    pub fn cpu(&self) -> CpuType {
        self.cpu
    }

    pub fn set_cpu(&mut self, cpu: CpuType, endian: Endian) {
        self.cpu = cpu;
        self.endian = endian;
    }

    pub fn options(&self) -> AsmOptions {
        self.options
    }

    pub fn optimize(&self) -> bool {
        self.options.optimize
    }

    pub fn set_optimize(&mut self, on: bool) {
        self.options.optimize = on;
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn set_line(&mut self, line: u32) {
        self.line = line;
    }

    pub fn sections(&self) -> &SectionTable {
        &self.sections
    }

    pub fn sections_mut(&mut self) -> &mut SectionTable {
        &mut self.sections
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn pending_patches(&self) -> usize {
        self.patches.len()
    }

    /// Lookup over everything defined so far.
    pub fn resolver(&self) -> SymbolResolver<'_> {
        SymbolResolver {
            symbols: &self.symbols,
            sections: &self.sections,
            depth: 0,
        }
    }

    pub fn current_section(&self) -> SectionId {
        self.sections.current_id()
    }

    pub fn current_offset(&self) -> u32 {
        self.sections.current_offset()
    }

    /// Absolute PC, if the current section has a fixed origin.
    pub fn current_pc(&self) -> Option<u32> {
        self.sections
            .current()
            .origin
            .map(|origin| origin.wrapping_add(self.current_offset()))
    }

    /// Current PC as an expression (constant when the origin is fixed).
    pub fn pc_expr(&self, span: Span) -> Expr {
        match self.current_pc() {
            Some(pc) => Expr::constant(pc as i32, span),
            None => Expr::section_address(self.current_section(), self.current_offset(), span),
        }
    }

    pub fn emit_constant(&mut self, bytes: &[u8]) {
        self.sections.append(bytes);
    }

    /// Emit `expr` into `field` at the current offset, deferring it when it
    /// is not constant yet. Out-of-range constants are reported and emitted
    /// masked to the field width.
    pub fn emit_field(&mut self, field: Field, expr: Expr) {
        let span = expr.span;
        match expr.check_range(field.low, field.high) {
            Ok(checked) => match checked.value() {
                Some(value) => {
                    if let Err(err) = field.check_reserved(value) {
                        self.report(eval_error_kind(&err), err.to_string(), Some(span));
                    }
                    let bytes = field.encode(field.base, value);
                    self.emit_constant(&bytes);
                }
                None => self.emit_patch(field, checked),
            },
            Err(err) => {
                if let EvalError::OutOfRange { value, .. } = &err {
                    let bytes = field.encode(field.base, *value as i32);
                    self.emit_constant(&bytes);
                } else {
                    self.emit_constant(&to_bytes(field.base, field.width, field.endian));
                }
                self.report(eval_error_kind(&err), err.to_string(), Some(span));
            }
        }
    }

    /// Reserve the field and queue `expr` for the backpatch pass.
    pub fn emit_patch(&mut self, field: Field, expr: Expr) {
        let patch = Patch {
            section: self.current_section(),
            offset: self.current_offset(),
            field,
            expr,
            line: self.line,
        };
        trace!(section = patch.section, offset = patch.offset, line = patch.line, "queue patch");
        self.patches.push(patch);
        self.emit_constant(&to_bytes(field.base, field.width, field.endian));
    }

    /// Emit a field holding `target - (current offset + adjustment)`.
    pub fn emit_pc_relative(&mut self, field: Field, target: Expr, adjustment: i32) {
        let offset = self.current_offset();
        self.emit_relative_at(field, target, offset, adjustment);
    }

    fn emit_relative_at(&mut self, field: Field, target: Expr, anchor: u32, adjustment: i32) {
        let span = target.span;
        let origin = self.sections.current().origin;
        match Expr::pc_relative(target, self.current_section(), origin, anchor, adjustment) {
            Ok(expr) => self.emit_field(field, expr),
            Err(err) => {
                self.emit_constant(&to_bytes(field.base, field.width, field.endian));
                self.report(eval_error_kind(&err), err.to_string(), Some(span));
            }
        }
    }

    /// Commit an encoded instruction.
    pub fn emit(&mut self, emission: Emission) {
        let start = self.current_offset();
        let end = start.wrapping_add(emission.len());
        for piece in emission.pieces {
            match piece {
                Piece::Bytes(bytes) => self.emit_constant(&bytes),
                Piece::Field { field, expr } => self.emit_field(field, expr),
                Piece::Relative {
                    field,
                    target,
                    anchor,
                    adjustment,
                } => {
                    let anchor = match anchor {
                        PcAnchor::InstructionStart => start,
                        PcAnchor::InstructionEnd => end,
                        PcAnchor::FieldStart => self.current_offset(),
                    };
                    self.emit_relative_at(field, target, anchor, adjustment);
                }
            }
        }
    }

    /// Record an error diagnostic for the current line.
    pub fn report(&mut self, kind: AsmErrorKind, message: impl Into<String>, span: Option<Span>) {
        let message = message.into();
        let line = span.map(|s| s.line).filter(|l| *l != 0).unwrap_or(self.line);
        self.diagnostics.push(
            Diagnostic::new(line, Severity::Error, AsmError::new(kind, &message, None))
                .with_column(span.map(|s| s.col_start)),
        );
    }

    pub fn report_error(&mut self, err: EncodeError) {
        self.report(err.kind, err.message, err.span);
    }

    pub fn warn(&mut self, kind: AsmErrorKind, message: impl Into<String>, span: Option<Span>) {
        let message = message.into();
        self.diagnostics.push(
            Diagnostic::new(self.line, Severity::Warning, AsmError::new(kind, &message, None))
                .with_column(span.map(|s| s.col_start)),
        );
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Hand the finished tables and diagnostics to the caller.
    pub fn into_parts(self) -> (SectionTable, SymbolTable, Vec<Diagnostic>) {
        (self.sections, self.symbols, self.diagnostics)
    }

    /// Place open sections, then replay every queued patch once.
    pub fn finish(&mut self, align: u32) {
        self.sections.layout(align);
        self.report_circular_definitions();
        self.run_backpatch_pass();
    }

    /// One diagnostic per cycle of deferred definitions, on the line of its
    /// first-defined member.
    fn report_circular_definitions(&mut self) {
        let mut reported = HashSet::new();
        let mut found = Vec::new();
        for entry in self.symbols.entries() {
            if !matches!(entry.value, SymbolValue::Deferred(_))
                || reported.contains(&entry.name.to_ascii_uppercase())
            {
                continue;
            }
            let Some(cycle) = self.symbols.definition_cycle(&entry.name) else {
                continue;
            };
            if !cycle[0].eq_ignore_ascii_case(&entry.name) {
                continue;
            }
            reported.extend(cycle.iter().map(|name| name.to_ascii_uppercase()));
            found.push((entry.line, EvalError::Circular(cycle.join(" -> "))));
        }
        for (line, err) in found {
            debug!(line, "circular definition");
            self.diagnostics.push(Diagnostic::new(
                line,
                Severity::Error,
                AsmError::new(eval_error_kind(&err), &err.to_string(), None),
            ));
        }
    }

    /// Resolve and write every queued patch. Each patch that still cannot be
    /// evaluated produces exactly one diagnostic.
    pub fn run_backpatch_pass(&mut self) {
        let patches = self.patches.take();
        debug!(count = patches.len(), "backpatch pass");
        for patch in patches {
            let width = patch.field.width as usize;
            let result = patch.expr.eval(&self.resolver()).map_err(|err| match err {
                EvalError::Undefined(name) => match self.symbols.definition_cycle(&name) {
                    Some(cycle) => EvalError::Circular(cycle.join(" -> ")),
                    None => EvalError::Undefined(name),
                },
                other => other,
            });
            let value = match result {
                Ok(value) => value,
                Err(err) => {
                    let kind = match err {
                        EvalError::Undefined(_) => AsmErrorKind::Unresolved,
                        _ => eval_error_kind(&err),
                    };
                    self.diagnostics.push(
                        Diagnostic::new(
                            patch.line,
                            Severity::Error,
                            AsmError::new(kind, &err.to_string(), None),
                        )
                        .with_column(Some(patch.expr.span.col_start)),
                    );
                    match err {
                        EvalError::OutOfRange { value, .. } => value as i32,
                        _ => continue,
                    }
                }
            };
            if let Err(err) = patch.field.check_reserved(value) {
                self.diagnostics.push(
                    Diagnostic::new(
                        patch.line,
                        Severity::Error,
                        AsmError::new(eval_error_kind(&err), &err.to_string(), None),
                    )
                    .with_column(Some(patch.expr.span.col_start)),
                );
            }
            let existing = self
                .sections
                .read_at(patch.section, patch.offset, width)
                .map(|bytes| from_bytes(bytes, patch.field.endian))
                .unwrap_or(patch.field.base);
            let bytes = patch.field.encode(existing, value);
            if !self.sections.write_at(patch.section, patch.offset, &bytes) {
                self.report(
                    AsmErrorKind::Io,
                    format!("Patch at offset {} outside its section", patch.offset),
                    None,
                );
            }
        }
    }
}

pub fn eval_error_kind(err: &EvalError) -> AsmErrorKind {
    match err {
        EvalError::OutOfRange { .. } | EvalError::Reserved { .. } => AsmErrorKind::Range,
        EvalError::Undefined(_) => AsmErrorKind::Unresolved,
        EvalError::Circular(_) => AsmErrorKind::Symbol,
        _ => AsmErrorKind::Expression,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CPU: CpuType = CpuType::new("test");

    fn ctx(origin: Option<u32>) -> AsmContext {
        AsmContext::new(TEST_CPU, Endian::Big, origin, AsmOptions::default())
    }

    fn sp() -> Span {
        Span {
            line: 1,
            col_start: 1,
            col_end: 1,
        }
    }

    #[test]
    fn constant_fields_are_written_immediately() {
        let mut ctx = ctx(Some(0));
        ctx.emit_field(Field::any(2, Endian::Big), Expr::constant(0x1234, sp()));
        assert_eq!(ctx.sections().current().bytes, vec![0x12, 0x34]);
        assert_eq!(ctx.pending_patches(), 0);
    }

    #[test]
    fn out_of_range_constant_is_reported_and_masked() {
        let mut ctx = ctx(Some(0));
        ctx.emit_field(Field::signed(1, Endian::Big), Expr::constant(0x180, sp()));
        assert_eq!(ctx.sections().current().bytes, vec![0x80]);
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(ctx.diagnostics()[0].kind(), AsmErrorKind::Range);
    }

    #[test]
    fn deferred_field_is_patched_after_definition() {
        let mut ctx = ctx(Some(0x100));
        ctx.emit_constant(&[0x4e, 0xb9]);
        ctx.emit_field(Field::any(4, Endian::Big), Expr::symbol("later", sp()));
        assert_eq!(ctx.pending_patches(), 1);
        let _ = ctx.symbols_mut().add(
            "later",
            SymbolValue::Constant(0x00ab_cdef),
            false,
            2,
        );
        ctx.finish(2);
        assert_eq!(
            ctx.sections().current().bytes,
            vec![0x4e, 0xb9, 0x00, 0xab, 0xcd, 0xef]
        );
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn unresolved_patch_yields_exactly_one_diagnostic() {
        let mut ctx = ctx(Some(0));
        ctx.emit_field(Field::any(2, Endian::Big), Expr::symbol("nowhere", sp()));
        ctx.finish(2);
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(ctx.diagnostics()[0].kind(), AsmErrorKind::Unresolved);
        assert_eq!(ctx.diagnostics()[0].message(), "Undefined symbol: nowhere");
        ctx.run_backpatch_pass();
        assert_eq!(ctx.diagnostics().len(), 1);
    }

    #[test]
    fn reserved_values_are_reported_but_still_written() {
        let field = Field::signed(1, Endian::Big).reserving(0, 0);
        let mut ctx = ctx(Some(0));
        ctx.emit_field(field, Expr::constant(0, sp()));
        ctx.emit_field(field, Expr::symbol("zero", sp()));
        let _ = ctx.symbols_mut().add("zero", SymbolValue::Constant(0), false, 2);
        ctx.finish(2);
        assert_eq!(ctx.sections().current().bytes, vec![0x00, 0x00]);
        assert_eq!(ctx.diagnostics().len(), 2);
        assert!(ctx
            .diagnostics()
            .iter()
            .all(|d| d.kind() == AsmErrorKind::Range));
        assert_eq!(
            ctx.diagnostics()[1].message(),
            "Value 0 cannot be encoded in this field"
        );
    }

    #[test]
    fn circular_definitions_are_named_once() {
        let mut ctx = ctx(Some(0));
        let _ = ctx
            .symbols_mut()
            .add("a", SymbolValue::Deferred(Expr::symbol("b", sp())), false, 1);
        let _ = ctx
            .symbols_mut()
            .add("b", SymbolValue::Deferred(Expr::symbol("a", sp())), false, 2);
        ctx.finish(2);
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(ctx.diagnostics()[0].kind(), AsmErrorKind::Symbol);
        assert_eq!(ctx.diagnostics()[0].line(), 1);
        assert_eq!(
            ctx.diagnostics()[0].message(),
            "Symbol definition is circular: a -> b"
        );
    }

    #[test]
    fn patch_through_a_cycle_is_circular_not_undefined() {
        let mut ctx = ctx(Some(0));
        let _ = ctx
            .symbols_mut()
            .add("a", SymbolValue::Deferred(Expr::symbol("b", sp())), false, 1);
        let _ = ctx
            .symbols_mut()
            .add("b", SymbolValue::Deferred(Expr::symbol("a", sp())), false, 2);
        ctx.set_line(3);
        ctx.emit_field(Field::any(2, Endian::Big), Expr::symbol("a", sp()));
        ctx.finish(2);
        let kinds: Vec<_> = ctx.diagnostics().iter().map(Diagnostic::kind).collect();
        assert_eq!(kinds, vec![AsmErrorKind::Symbol, AsmErrorKind::Symbol]);
        assert_eq!(ctx.diagnostics()[1].line(), 3);
        assert!(ctx.diagnostics()[1].message().contains("circular"));
    }

    #[test]
    fn relative_pieces_use_their_anchor() {
        let mut ctx = ctx(Some(0x1000));
        let mut em = Emission::new();
        em.value(0x6000, 2, Endian::Big).relative(
            Field::signed(2, Endian::Big),
            Expr::constant(0x1010, sp()),
            PcAnchor::FieldStart,
            0,
        );
        assert_eq!(em.len(), 4);
        ctx.emit(em);
        // displacement measured from the extension word at 0x1002
        assert_eq!(ctx.sections().current().bytes, vec![0x60, 0x00, 0x00, 0x0e]);
    }

    #[test]
    fn relative_field_in_open_section_resolves_after_layout() {
        let mut ctx = ctx(Some(0x2000));
        ctx.emit_constant(&[0; 4]);
        ctx.sections_mut().switch_to("text");
        ctx.emit_constant(&[0xaa]);
        let target = ctx.pc_expr(sp());
        ctx.emit_constant(&[0xbb]);
        ctx.emit_pc_relative(Field::signed(1, Endian::Big), target, 1);
        ctx.finish(2);
        let text = ctx.sections().get(1).unwrap();
        assert_eq!(text.origin, Some(0x2004));
        // target = base+1, reference = base+2+1
        assert_eq!(text.bytes, vec![0xaa, 0xbb, 0xfe]);
    }
}
