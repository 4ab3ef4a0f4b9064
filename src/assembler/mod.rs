// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Single-pass driver: labels, directives and instruction dispatch.
//!
//! Every source line is read once. Instructions go to the handler of the
//! active CPU family; fields that cannot be resolved yet are queued in the
//! context and written by [`Assembler::finish`] after section layout.

pub mod cli;

use std::fs::File;
use std::io::{self, BufWriter, Write};

use tracing::{debug, info};

use crate::core::assembler::error::{
    AsmError, AsmErrorKind, AsmRunError, AsmRunReport, Diagnostic, LineStatus, PassCounts,
    Severity,
};
use crate::core::assembler::listing::{ListingLine, ListingWriter};
use crate::core::context::{AsmContext, AsmOptions, Emission};
use crate::core::cpu::{CpuType, EncodeError};
use crate::core::expr::{Expr, SectionId};
use crate::core::family::{EncodeResult, FamilyHandler, Instruction};
use crate::core::imagestore::ImageStore;
use crate::core::parser::{parse_expr_tokens, split_line, split_operands, ExprEnv, LineParts};
use crate::core::patch::Field;
use crate::core::registry::{FamilyModule, ModuleRegistry, RegistryError};
use crate::core::section::SectionTable;
use crate::core::symbol_table::{SymbolTable, SymbolTableResult, SymbolValue};
use crate::core::text_utils::{is_star_comment, split_comment};
use crate::core::tokenizer::{tokenize_line, Span, Token, TokenKind};

use cli::{input_base_from_path, resolve_output_path, validate_cli, Cli, VERSION};

/// Largest single `DS` reservation.
const MAX_RESERVE: u32 = 16 * 1024 * 1024;

/// Listing record of one source line. Bytes are read back from the
/// sections when the listing is written, so patched fields show their
/// final values.
#[derive(Debug, Clone)]
pub struct ListedLine {
    pub line_num: u32,
    pub section: SectionId,
    pub offset: u32,
    pub len: u32,
    pub status: LineStatus,
    pub aux: u32,
    pub show_section: bool,
}

#[derive(Debug, Clone, Copy)]
struct LineInfo {
    status: LineStatus,
    aux: u32,
    /// The line moved the location counter (ORG, SECTION); list it at the
    /// new position without bytes.
    restart: bool,
}

impl Default for LineInfo {
    fn default() -> Self {
        Self {
            status: LineStatus::Ok,
            aux: 0,
            restart: false,
        }
    }
}

impl LineInfo {
    fn restart() -> Self {
        Self {
            restart: true,
            ..Self::default()
        }
    }
}

fn directive_error(message: impl Into<String>, span: Span) -> EncodeError {
    EncodeError::with_span(AsmErrorKind::Directive, message, span)
}

/// `CPU name` is recognized before tokenizing, since names like `65C02`
/// are not valid numbers. Returns the optional label, the name and its
/// column.
fn cpu_directive(code: &str) -> Option<(Option<&str>, &str, usize)> {
    let labelled = !code.starts_with(|c: char| c.is_ascii_whitespace());
    let mut words = code.split_whitespace();
    let label = if labelled {
        Some(words.next()?.trim_end_matches(':'))
    } else {
        None
    };
    if !words.next()?.eq_ignore_ascii_case("CPU") {
        return None;
    }
    let name = words.next().unwrap_or("");
    let col = code.rfind(name).map_or(1, |idx| idx + 1);
    Some((label, name.trim_matches('"'), col))
}

/// Item width of a data or storage directive. `DC` and `DS` default to
/// words.
fn data_width(mnemonic: &str, size: Option<&(String, Span)>) -> Result<u8, EncodeError> {
    let fixed = match mnemonic {
        "DB" | ".BYTE" => Some(1),
        "DW" | ".WORD" => Some(2),
        "DL" | ".LONG" => Some(4),
        _ => None,
    };
    match (fixed, size) {
        (Some(width), None) => Ok(width),
        (None, None) => Ok(2),
        (None, Some((size, span))) => match size.as_str() {
            "B" => Ok(1),
            "W" => Ok(2),
            "L" => Ok(4),
            _ => Err(EncodeError::size(
                format!("{mnemonic} takes .B, .W or .L, not .{size}"),
                *span,
            )),
        },
        (Some(_), Some((size, span))) => Err(EncodeError::size(
            format!("{mnemonic} takes no size suffix (.{size})"),
            *span,
        )),
    }
}

/// Values accepted for a data item: signed or unsigned.
fn data_range(width: u8) -> (i64, i64) {
    match width {
        1 => (-0x80, 0xff),
        2 => (-0x8000, 0xffff),
        _ => (i32::MIN as i64, u32::MAX as i64),
    }
}

/// Assembler state for one unit.
pub struct Assembler<'r> {
    registry: &'r ModuleRegistry,
    family: &'r dyn FamilyModule,
    handler: Box<dyn FamilyHandler>,
    ctx: AsmContext,
    /// Largest alignment of any family used; applied at layout.
    align: u32,
    listing: Vec<ListedLine>,
    source_lines: Vec<String>,
    ended: bool,
    warned_after_end: bool,
}

impl<'r> Assembler<'r> {
    pub fn new(
        registry: &'r ModuleRegistry,
        cpu_name: &str,
        options: AsmOptions,
    ) -> Result<Self, RegistryError> {
        let pipeline = registry.resolve_name(cpu_name)?;
        let family = pipeline.family;
        let ctx = AsmContext::new(
            pipeline.cpu,
            family.endian(),
            family.default_origin(),
            options,
        );
        Ok(Self {
            registry,
            family,
            handler: pipeline.handler,
            ctx,
            align: family.alignment(),
            listing: Vec::new(),
            source_lines: Vec::new(),
            ended: false,
            warned_after_end: false,
        })
    }

    pub fn cpu(&self) -> CpuType {
        self.ctx.cpu()
    }

    /// Predefine a constant, as `-D NAME=VAL` does.
    pub fn define(&mut self, name: &str, value: i32) -> Result<(), AsmError> {
        match self
            .ctx
            .symbols_mut()
            .add(name, SymbolValue::Constant(value), false, 0)
        {
            SymbolTableResult::Ok => Ok(()),
            _ => Err(AsmError::new(
                AsmErrorKind::Symbol,
                "Duplicate definition",
                Some(name),
            )),
        }
    }

    /// Process every line of `source`.
    pub fn assemble(&mut self, source: &str) {
        debug!(cpu = self.ctx.cpu().as_str(), "pass start");
        for line in source.lines() {
            let line_num = self.source_lines.len() as u32 + 1;
            self.process_line(line, line_num);
        }
    }

    pub fn process_line(&mut self, line: &str, line_num: u32) {
        self.source_lines.push(line.to_string());
        self.ctx.set_line(line_num);
        let first_diag = self.ctx.diagnostics().len();
        let section = self.ctx.current_section();
        let start = self.ctx.current_offset();

        let info = if self.ended {
            self.after_end(line);
            LineInfo::default()
        } else {
            self.process(line, line_num)
        };

        let new_diags = &self.ctx.diagnostics()[first_diag..];
        let status = if new_diags.iter().any(|d| d.severity() == Severity::Error) {
            LineStatus::Error
        } else if !new_diags.is_empty() {
            LineStatus::Warning
        } else {
            info.status
        };
        let record = if info.restart || section != self.ctx.current_section() {
            ListedLine {
                line_num,
                section: self.ctx.current_section(),
                offset: self.ctx.current_offset(),
                len: 0,
                status,
                aux: info.aux,
                show_section: true,
            }
        } else {
            ListedLine {
                line_num,
                section,
                offset: start,
                len: self.ctx.current_offset().saturating_sub(start),
                status,
                aux: info.aux,
                show_section: false,
            }
        };
        self.listing.push(record);
    }

    fn after_end(&mut self, line: &str) {
        let (code, _) = split_comment(line);
        if !self.warned_after_end && !is_star_comment(line) && !code.trim().is_empty() {
            self.warned_after_end = true;
            self.ctx
                .warn(AsmErrorKind::Directive, "Source after END is ignored", None);
        }
    }

    fn process(&mut self, line: &str, line_num: u32) -> LineInfo {
        let (code, _) = split_comment(line);
        if is_star_comment(line) || code.trim().is_empty() {
            return LineInfo::default();
        }
        if let Some((label, name, col)) = cpu_directive(code) {
            if let Some(label) = label {
                self.define_label(label, Span::new(line_num, 0, label.len()));
            }
            let span = Span::new(line_num, col - 1, col - 1 + name.len());
            if let Err(err) = self.switch_cpu(name, span) {
                self.ctx.report_error(err);
            }
            return LineInfo::default();
        }

        let tokens = match tokenize_line(line, line_num, self.family.register_checker()) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.ctx
                    .report(AsmErrorKind::Syntax, err.message, Some(err.span));
                return LineInfo::default();
            }
        };
        let parts = match split_line(&tokens) {
            Ok(parts) => parts,
            Err(err) => {
                self.ctx
                    .report(AsmErrorKind::Syntax, err.message, Some(err.span));
                return LineInfo::default();
            }
        };
        match self.dispatch(&parts) {
            Ok(info) => info,
            Err(err) => {
                self.ctx.report_error(err);
                LineInfo::default()
            }
        }
    }

    fn dispatch(&mut self, parts: &LineParts<'_>) -> Result<LineInfo, EncodeError> {
        let Some((mnemonic, span)) = &parts.mnemonic else {
            if let Some((label, label_span)) = &parts.label {
                self.define_label(label, *label_span);
            }
            return Ok(LineInfo::default());
        };
        let span = *span;
        match mnemonic.as_str() {
            "EQU" | "=" => return self.assign(parts, false, span),
            // `label SET A, 1` is a DCPU-16 instruction, not an assignment.
            "SET" if parts.label.is_some() && split_operands(parts.operands).len() == 1 => {
                return self.assign(parts, true, span)
            }
            _ => {}
        }

        let places = matches!(
            mnemonic.as_str(),
            "ORG" | "SECTION" | "ALIGN" | ".ALIGN" | "EVEN"
        );
        if !places {
            if let Some((label, label_span)) = &parts.label {
                self.define_label(label, *label_span);
            }
        }
        let operands = parts.operands;
        let info = match mnemonic.as_str() {
            "ORG" => self.org(operands, span)?,
            "SECTION" => self.section(operands, span)?,
            "OPT" | "OPTIMIZE" => self.opt(operands, span)?,
            "DC" | "DB" | "DW" | "DL" | ".BYTE" | ".WORD" | ".LONG" => {
                let width = data_width(mnemonic, parts.size.as_ref())?;
                self.data(width, operands, span)?
            }
            "DS" => {
                let width = data_width(mnemonic, parts.size.as_ref())?;
                self.storage(width, operands, span)?
            }
            "ALIGN" | ".ALIGN" => {
                let boundary = self.constant(operands, span, "ALIGN boundary")?;
                self.align_to(boundary, span)?
            }
            "EVEN" => self.align_to(2, span)?,
            "END" => {
                self.ended = true;
                LineInfo::default()
            }
            "CPU" => return Err(directive_error("CPU needs a name", span)),
            _ => self.instruction(mnemonic, span, parts.size.clone(), operands)?,
        };
        if places {
            if let Some((label, label_span)) = &parts.label {
                self.define_label(label, *label_span);
            }
        }
        Ok(info)
    }

    fn define_label(&mut self, name: &str, span: Span) {
        let value = SymbolValue::Address {
            section: self.ctx.current_section(),
            offset: self.ctx.current_offset(),
        };
        let line = self.ctx.line();
        match self.ctx.symbols_mut().add(name, value, false, line) {
            SymbolTableResult::Ok => {}
            SymbolTableResult::Duplicate => self.ctx.report(
                AsmErrorKind::Symbol,
                format!("Duplicate label: {name}"),
                Some(span),
            ),
            _ => self
                .ctx
                .report(AsmErrorKind::Symbol, "Symbol table full", Some(span)),
        }
    }

    fn expr(&self, tokens: &[Token], span: Span) -> Result<Expr, EncodeError> {
        let resolver = self.ctx.resolver();
        let env = ExprEnv {
            lookup: &resolver,
            pc: self.ctx.pc_expr(span),
        };
        parse_expr_tokens(tokens, &env).map_err(|err| EncodeError::syntax(err.message, err.span))
    }

    /// Expression that has to be known when the line is read.
    fn constant(&self, tokens: &[Token], span: Span, what: &str) -> Result<i32, EncodeError> {
        let expr = self.expr(tokens, span)?;
        expr.value()
            .ok_or_else(|| directive_error(format!("{what} must be known here"), expr.span))
    }

    fn assign(&mut self, parts: &LineParts<'_>, rw: bool, span: Span) -> Result<LineInfo, EncodeError> {
        let Some((name, name_span)) = &parts.label else {
            return Err(directive_error("Assignment needs a symbol name", span));
        };
        let expr = self.expr(parts.operands, span)?;
        let (value, aux) = match expr.value() {
            Some(value) => (SymbolValue::Constant(value), value as u32),
            None => (SymbolValue::Deferred(expr), 0),
        };
        let line = self.ctx.line();
        match self.ctx.symbols_mut().add(name, value, rw, line) {
            SymbolTableResult::Ok => Ok(LineInfo {
                status: LineStatus::DirEqu,
                aux,
                restart: false,
            }),
            SymbolTableResult::Duplicate => Err(EncodeError::with_span(
                AsmErrorKind::Symbol,
                format!("Duplicate symbol: {name}"),
                *name_span,
            )),
            _ => Err(EncodeError::with_span(
                AsmErrorKind::Symbol,
                "Symbol table full",
                *name_span,
            )),
        }
    }

    fn switch_cpu(&mut self, name: &str, span: Span) -> Result<(), EncodeError> {
        if name.is_empty() {
            return Err(directive_error("CPU needs a name", span));
        }
        let pipeline = self
            .registry
            .resolve_name(name)
            .map_err(|err| EncodeError::cpu(err.to_string(), span))?;
        self.family = pipeline.family;
        self.handler = pipeline.handler;
        self.align = self.align.max(self.family.alignment());
        self.ctx.set_cpu(pipeline.cpu, self.family.endian());
        debug!(cpu = pipeline.cpu.as_str(), "switch cpu");
        Ok(())
    }

    fn org(&mut self, operands: &[Token], span: Span) -> Result<LineInfo, EncodeError> {
        let addr = self.constant(operands, span, "ORG address")?;
        let addr = u32::try_from(addr)
            .map_err(|_| EncodeError::range("ORG address must not be negative", span))?;
        let fill = self.ctx.options().fill;
        self.ctx
            .sections_mut()
            .set_origin(addr, fill)
            .map_err(|msg| directive_error(msg, span))?;
        debug!(addr, "origin");
        Ok(LineInfo::restart())
    }

    fn section(&mut self, operands: &[Token], span: Span) -> Result<LineInfo, EncodeError> {
        let name = match operands {
            [Token {
                kind: TokenKind::Identifier(name) | TokenKind::Register(name),
                ..
            }] => name.clone(),
            [Token {
                kind: TokenKind::String(lit),
                ..
            }] => String::from_utf8_lossy(&lit.bytes).into_owned(),
            _ => return Err(directive_error("SECTION needs a name", span)),
        };
        let id = self.ctx.sections_mut().switch_to(&name);
        debug!(section = %name, id, "switch section");
        Ok(LineInfo::restart())
    }

    fn opt(&mut self, operands: &[Token], span: Span) -> Result<LineInfo, EncodeError> {
        let on = match operands {
            [Token {
                kind: TokenKind::Identifier(word),
                ..
            }] if word.eq_ignore_ascii_case("ON") => true,
            [Token {
                kind: TokenKind::Identifier(word),
                ..
            }] if word.eq_ignore_ascii_case("OFF") => false,
            _ => return Err(directive_error("OPT expects ON or OFF", span)),
        };
        self.ctx.set_optimize(on);
        debug!(optimize = on, "options");
        Ok(LineInfo::default())
    }

    /// Data items go through the same field path as instruction operands.
    fn data(&mut self, width: u8, operands: &[Token], span: Span) -> Result<LineInfo, EncodeError> {
        let groups = split_operands(operands);
        if groups.is_empty() {
            return Err(directive_error("Missing data values", span));
        }
        let (low, high) = data_range(width);
        let field = Field::new(width, self.ctx.endian(), low, high);
        let mut em = Emission::new();
        for group in groups {
            match group {
                [Token {
                    kind: TokenKind::String(lit),
                    span,
                }] => {
                    if width != 1 {
                        return Err(directive_error("Strings are only allowed in byte data", *span));
                    }
                    em.bytes(&lit.bytes);
                }
                _ => {
                    em.field(field, self.expr(group, span)?);
                }
            }
        }
        self.ctx.emit(em);
        Ok(LineInfo::default())
    }

    fn storage(&mut self, width: u8, operands: &[Token], span: Span) -> Result<LineInfo, EncodeError> {
        let count = self.constant(operands, span, "DS count")?;
        let total = u32::try_from(count)
            .ok()
            .and_then(|count| count.checked_mul(width as u32))
            .filter(|total| *total <= MAX_RESERVE)
            .ok_or_else(|| EncodeError::range(format!("DS count {count} out of range"), span))?;
        let fill = self.ctx.options().fill;
        self.ctx.emit_constant(&vec![fill; total as usize]);
        Ok(LineInfo {
            status: LineStatus::DirDs,
            aux: total,
            restart: false,
        })
    }

    /// Pad to a multiple of `boundary`: of the address in placed sections,
    /// of the section offset otherwise.
    fn align_to(&mut self, boundary: i32, span: Span) -> Result<LineInfo, EncodeError> {
        let boundary = u32::try_from(boundary)
            .ok()
            .filter(|b| *b > 0)
            .ok_or_else(|| EncodeError::range("ALIGN boundary must be positive", span))?;
        let pos = self
            .ctx
            .current_pc()
            .unwrap_or_else(|| self.ctx.current_offset());
        let pad = (boundary - pos % boundary) % boundary;
        let fill = self.ctx.options().fill;
        self.ctx.emit_constant(&vec![fill; pad as usize]);
        Ok(LineInfo::default())
    }

    fn instruction(
        &mut self,
        mnemonic: &str,
        span: Span,
        size: Option<(String, Span)>,
        operands: &[Token],
    ) -> Result<LineInfo, EncodeError> {
        let instr = Instruction::new(mnemonic, span, size, operands);
        match self.handler.encode_instruction(&instr, &mut self.ctx) {
            EncodeResult::Ok(()) => Ok(LineInfo::default()),
            EncodeResult::NotFound => Err(EncodeError::syntax(
                format!("Unknown instruction or directive: {mnemonic}"),
                span,
            )),
            EncodeResult::Error(err) => Err(err),
        }
    }

    /// Lay out open sections, replay the patch queue once, and hand back
    /// the result. Any error diagnostic turns the run into an error.
    pub fn finish(mut self) -> Result<AssemblyOutput, AsmRunError> {
        debug!(patches = self.ctx.pending_patches(), "pass end");
        self.ctx.finish(self.align);
        let cpu = self.ctx.cpu();
        let (sections, symbols, diagnostics) = self.ctx.into_parts();
        let counts = PassCounts::from_diagnostics(self.source_lines.len() as u32, &diagnostics);
        debug!(
            lines = counts.lines,
            errors = counts.errors,
            warnings = counts.warnings,
            "assembly finished"
        );
        if counts.errors > 0 {
            let kind = diagnostics
                .iter()
                .find(|d| d.severity() == Severity::Error)
                .map_or(AsmErrorKind::Syntax, Diagnostic::kind);
            let message = format!("{} error(s) in source. No output written.", counts.errors);
            return Err(AsmRunError::new(
                AsmError::new(kind, &message, None),
                diagnostics,
                self.source_lines,
            ));
        }
        Ok(AssemblyOutput {
            cpu,
            sections,
            symbols,
            listing: self.listing,
            diagnostics,
            source_lines: self.source_lines,
        })
    }
}

/// Everything a successful run produced.
pub struct AssemblyOutput {
    /// CPU active at the end of the source.
    pub cpu: CpuType,
    pub sections: SectionTable,
    pub symbols: SymbolTable,
    pub listing: Vec<ListedLine>,
    /// Warnings only; errors fail the run.
    pub diagnostics: Vec<Diagnostic>,
    pub source_lines: Vec<String>,
}

impl AssemblyOutput {
    pub fn image(&self) -> ImageStore {
        ImageStore::from_sections(&self.sections)
    }

    /// Flat image from the lowest to the highest emitted address, gaps
    /// filled with `fill`.
    pub fn write_binary<W: Write>(&self, out: W, fill: u8) -> io::Result<()> {
        let image = self.image();
        match image.output_range() {
            Some((start, end)) => image.write_bin_file(out, start, end, fill),
            None => Ok(()),
        }
    }

    pub fn write_hex<W: Write>(&self, out: W) -> io::Result<()> {
        self.image().write_hex_file(out, None)
    }

    pub fn write_listing<W: Write>(&self, out: W, title: &str) -> io::Result<()> {
        let mut writer = ListingWriter::new(out);
        writer.header(title)?;
        for line in &self.listing {
            let section = self.sections.get(line.section);
            let end = line.offset.saturating_add(line.len) as usize;
            let bytes = section
                .and_then(|s| s.bytes.get(line.offset as usize..end))
                .unwrap_or(&[]);
            let source = self
                .source_lines
                .get(line.line_num.saturating_sub(1) as usize)
                .map_or("", String::as_str);
            writer.write_line(ListingLine {
                addr: section
                    .and_then(|s| s.origin)
                    .map(|origin| origin.wrapping_add(line.offset)),
                offset: line.offset,
                bytes,
                status: line.status,
                aux: line.aux,
                line_num: line.line_num,
                source,
                section: section
                    .filter(|_| line.show_section)
                    .map(|s| s.name.as_str()),
            })?;
            for diag in self.diagnostics.iter().filter(|d| d.line() == line.line_num) {
                writer.write_diagnostic(diag, &self.source_lines)?;
            }
        }
        let counts = PassCounts::from_diagnostics(self.source_lines.len() as u32, &self.diagnostics);
        writer.footer(&counts, &self.symbols, &self.sections)
    }
}

/// Assemble a whole source text, starting on `cpu_name`.
pub fn assemble_source(
    registry: &ModuleRegistry,
    cpu_name: &str,
    options: AsmOptions,
    defines: &[(String, i32)],
    source: &str,
) -> Result<AssemblyOutput, AsmRunError> {
    let mut asm = Assembler::new(registry, cpu_name, options).map_err(|err| {
        AsmRunError::new(
            AsmError::new(AsmErrorKind::Cli, &err.to_string(), None),
            Vec::new(),
            Vec::new(),
        )
    })?;
    for (name, value) in defines {
        asm.define(name, *value)
            .map_err(|err| AsmRunError::new(err, Vec::new(), Vec::new()))?;
    }
    asm.assemble(source);
    asm.finish()
}

fn io_error(message: &str, path: &str) -> AsmRunError {
    AsmRunError::new(
        AsmError::new(AsmErrorKind::Io, message, Some(path)),
        Vec::new(),
        Vec::new(),
    )
}

fn write_output<F>(path: &str, what: &str, write: F) -> Result<(), AsmRunError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let file = File::create(path).map_err(|_| io_error("Error opening file for write", path))?;
    let mut out = BufWriter::new(file);
    write(&mut out)
        .and_then(|()| out.flush())
        .map_err(|err| io_error(&err.to_string(), path))?;
    info!(path, what, "wrote output");
    Ok(())
}

/// Run the assembler for parsed command-line arguments.
pub fn run(cli: &Cli) -> Result<AsmRunReport, AsmRunError> {
    let config = validate_cli(cli)?;
    let base = input_base_from_path(&cli.infile)?;
    let input = cli.infile.display().to_string();
    let source = std::fs::read_to_string(&cli.infile)
        .map_err(|_| io_error("Error reading input file", &input))?;
    info!(input = %input, cpu = %cli.cpu, "assembling");

    let registry = ModuleRegistry::with_defaults();
    let output = assemble_source(&registry, &cli.cpu, config.options, &config.defines, &source)
        .map_err(|err| err.with_file(&input))?;

    if let Some(path) = &cli.outfile {
        let path = path.display().to_string();
        write_output(&path, "binary", |out| output.write_binary(out, config.options.fill))?;
    }
    if let Some(path) = resolve_output_path(&base, cli.hex_name.clone(), "hex") {
        write_output(&path, "hex", |out| output.write_hex(out))?;
    }
    if let Some(path) = resolve_output_path(&base, cli.list_name.clone(), "lst") {
        let title = format!(
            "asmforge {} Assembler v{VERSION}",
            output.cpu.as_str().to_ascii_uppercase()
        );
        write_output(&path, "listing", |out| output.write_listing(out, &title))?;
    }

    Ok(AsmRunReport::new(output.diagnostics, output.source_lines).with_file(&input))
}

#[cfg(test)]
mod tests;
