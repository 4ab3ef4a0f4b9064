// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and reporting for the assembler.

use thiserror::Error;

/// Listing status of one source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    Ok,
    /// Symbol assignment; the listing shows the value.
    DirEqu,
    /// Storage reservation; the listing shows the size.
    DirDs,
    Warning,
    Error,
}

/// Categories of assembler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmErrorKind {
    /// Operand or line syntax the classifier cannot make sense of.
    Syntax,
    /// Addressing mode not allowed for the operand position.
    Legality,
    /// Value does not fit its encoded field.
    Range,
    /// Size suffix not allowed for the mnemonic.
    Size,
    /// Instruction or mode needs a different CPU.
    Cpu,
    Expression,
    /// Patch expression still references an undefined symbol at the end.
    Unresolved,
    Symbol,
    Directive,
    Io,
    Cli,
}

/// An assembler error with a kind and message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AsmError {
    kind: AsmErrorKind,
    message: String,
}

impl AsmError {
    pub fn new(kind: AsmErrorKind, msg: &str, param: Option<&str>) -> Self {
        Self {
            kind,
            message: format_error(msg, param),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> AsmErrorKind {
        self.kind
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

/// A diagnostic message with location and context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub(crate) line: u32,
    pub(crate) column: Option<usize>,
    pub(crate) severity: Severity,
    pub(crate) error: AsmError,
    pub(crate) file: Option<String>,
}

impl Diagnostic {
    pub fn new(line: u32, severity: Severity, error: AsmError) -> Self {
        Self {
            line,
            column: None,
            severity,
            error,
            file: None,
        }
    }

    pub fn with_column(mut self, column: Option<usize>) -> Self {
        self.column = column;
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }

    pub fn kind(&self) -> AsmErrorKind {
        self.error.kind()
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }

    pub fn format(&self) -> String {
        let sev = self.severity.label();
        format!("{}: {} - {}", self.line, sev, self.error.message())
    }

    pub fn format_with_context(&self, lines: Option<&[String]>, use_color: bool) -> String {
        let sev = self.severity.label();
        let header = match &self.file {
            Some(file) => format!("{file}:{}: {sev}", self.line),
            None => format!("{}: {sev}", self.line),
        };

        let mut out = String::new();
        out.push_str(&header);
        out.push('\n');

        let context = build_context_lines(self.line, self.column, lines, use_color);
        for line in context {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!("{sev}: {}", self.error.message()));
        out
    }
}

/// Error from a failed assembly run.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct AsmRunError {
    error: AsmError,
    diagnostics: Vec<Diagnostic>,
    source_lines: Vec<String>,
}

impl AsmRunError {
    pub fn new(error: AsmError, diagnostics: Vec<Diagnostic>, source_lines: Vec<String>) -> Self {
        Self {
            error,
            diagnostics,
            source_lines,
        }
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }

    /// Tag every diagnostic with the input file name.
    pub fn with_file(mut self, file: &str) -> Self {
        self.diagnostics = tag_file(self.diagnostics, file);
        self
    }
}

/// Report from a successful assembly run.
#[derive(Debug)]
pub struct AsmRunReport {
    diagnostics: Vec<Diagnostic>,
    source_lines: Vec<String>,
}

impl AsmRunReport {
    pub fn new(diagnostics: Vec<Diagnostic>, source_lines: Vec<String>) -> Self {
        Self {
            diagnostics,
            source_lines,
        }
    }

    pub fn with_file(mut self, file: &str) -> Self {
        self.diagnostics = tag_file(self.diagnostics, file);
        self
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }
}

fn tag_file(diagnostics: Vec<Diagnostic>, file: &str) -> Vec<Diagnostic> {
    diagnostics
        .into_iter()
        .map(|diag| diag.with_file(Some(file.to_string())))
        .collect()
}

/// Pass statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassCounts {
    pub lines: u32,
    pub errors: u32,
    pub warnings: u32,
}

impl PassCounts {
    pub fn from_diagnostics(lines: u32, diagnostics: &[Diagnostic]) -> Self {
        let errors = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count() as u32;
        Self {
            lines,
            errors,
            warnings: diagnostics.len() as u32 - errors,
        }
    }
}

/// Build context lines for error display.
pub fn build_context_lines(
    line_num: u32,
    column: Option<usize>,
    lines: Option<&[String]>,
    use_color: bool,
) -> Vec<String> {
    let mut out = Vec::new();
    let line_idx = line_num.saturating_sub(1) as usize;

    let line = match lines.and_then(|lines| lines.get(line_idx)) {
        Some(line) => line,
        None => {
            out.push(format!("{:>5} | <source unavailable>", line_num));
            return out;
        }
    };

    let display = highlight_line(line, column, use_color);
    out.push(format!("{:>5} | {}", line_num, display));

    out
}

/// Mark the character at `column` (1-based), in red when colors are enabled
/// and with a caret line otherwise.
fn highlight_line(line: &str, column: Option<usize>, use_color: bool) -> String {
    let Some(col) = column.filter(|col| *col >= 1 && *col <= line.len()) else {
        return line.to_string();
    };
    let idx = col - 1;
    if !line.is_char_boundary(idx) || !line.is_char_boundary(idx + 1) {
        return line.to_string();
    }
    if use_color {
        format!(
            "{}\x1b[31m{}\x1b[0m{}",
            &line[..idx],
            &line[idx..idx + 1],
            &line[idx + 1..]
        )
    } else {
        format!("{line}\n      | {}^", " ".repeat(idx))
    }
}

/// Format an error message with an optional parameter.
pub fn format_error(msg: &str, param: Option<&str>) -> String {
    match param {
        Some(p) => format!("{msg}: {p}"),
        None => msg.to_string(),
    }
}
