// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Listing file generation.

use std::io::Write;

use crate::core::section::SectionTable;
use crate::core::symbol_table::SymbolTable;

use super::error::{build_context_lines, Diagnostic, LineStatus, PassCounts};

/// Data for a single listing line.
pub struct ListingLine<'a> {
    /// Absolute address, `None` while the section is not placed.
    pub addr: Option<u32>,
    pub offset: u32,
    pub bytes: &'a [u8],
    pub status: LineStatus,
    pub aux: u32,
    pub line_num: u32,
    pub source: &'a str,
    pub section: Option<&'a str>,
}

/// Writer for listing file output.
pub struct ListingWriter<W: Write> {
    out: W,
}

impl<W: Write> ListingWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn header(&mut self, title: &str) -> std::io::Result<()> {
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "ADDR      BYTES                    LINE  SOURCE")?;
        writeln!(self.out, "--------  -----------------------  ----  ------")?;
        Ok(())
    }

    pub fn write_line(&mut self, line: ListingLine<'_>) -> std::io::Result<()> {
        let addr = match line.addr {
            Some(addr) => format!("{addr:08X}"),
            None => format!("+{:07X}", line.offset),
        };
        let (loc, bytes_col) = match line.status {
            LineStatus::DirEqu => (String::new(), format!("= {:08X}", line.aux)),
            LineStatus::DirDs => (addr, format!("+{:X}", line.aux)),
            _ if line.bytes.is_empty() => (String::new(), String::new()),
            _ => (addr, format_bytes(line.bytes)),
        };

        let loc = if loc.is_empty() {
            "--------".to_string()
        } else {
            loc
        };
        let section_suffix = line
            .section
            .map(|name| format!("  ; [section {name}]"))
            .unwrap_or_default();

        writeln!(
            self.out,
            "{:<8}  {:<23}  {:>4}  {}{}",
            loc, bytes_col, line.line_num, line.source, section_suffix
        )
    }

    pub fn write_diagnostic(
        &mut self,
        diag: &Diagnostic,
        source_lines: &[String],
    ) -> std::io::Result<()> {
        let context = build_context_lines(diag.line(), diag.column, Some(source_lines), false);
        for line in context {
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out, "{}: {}", diag.severity().label(), diag.message())
    }

    pub fn footer(
        &mut self,
        counts: &PassCounts,
        symbols: &SymbolTable,
        sections: &SectionTable,
    ) -> std::io::Result<()> {
        writeln!(
            self.out,
            "\nLines: {}  Errors: {}  Warnings: {}",
            counts.lines, counts.errors, counts.warnings
        )?;
        writeln!(self.out, "\nSECTIONS\n")?;
        for (_, section) in sections.iter() {
            match section.origin {
                Some(origin) => writeln!(
                    self.out,
                    "{:<16} {:08X}  {} bytes",
                    section.name,
                    origin,
                    section.len()
                )?,
                None => writeln!(self.out, "{:<16} --------  {} bytes", section.name, section.len())?,
            }
        }
        writeln!(self.out, "\nSYMBOL TABLE\n")?;
        symbols.dump(&mut self.out, sections)?;
        let total: u32 = sections.iter().map(|(_, s)| s.len()).sum();
        writeln!(self.out, "\nTotal memory is {} bytes", total)?;
        Ok(())
    }
}

/// Format bytes as hex string for listing.
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_show_address_and_bytes() {
        let mut out = Vec::new();
        let mut writer = ListingWriter::new(&mut out);
        writer
            .write_line(ListingLine {
                addr: Some(0x1000),
                offset: 0,
                bytes: &[0x4e, 0x75],
                status: LineStatus::Ok,
                aux: 0,
                line_num: 3,
                source: "    RTS",
                section: None,
            })
            .unwrap();
        writer
            .write_line(ListingLine {
                addr: None,
                offset: 0,
                bytes: &[],
                status: LineStatus::DirEqu,
                aux: 0x20,
                line_num: 4,
                source: "N EQU $20",
                section: None,
            })
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("00001000  4E 75"));
        assert!(lines[0].ends_with("   3      RTS"));
        assert!(lines[1].starts_with("--------  = 00000020"));
    }
}
