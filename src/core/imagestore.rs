// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Memory image with hex/bin output helpers.

use std::io::{self, Write};

use crate::core::section::SectionTable;

/// Contiguous run of bytes at an absolute address.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Chunk {
    addr: u32,
    bytes: Vec<u8>,
}

/// Placed output of an assembly, ordered by address.
#[derive(Debug, Default, Clone)]
pub struct ImageStore {
    chunks: Vec<Chunk>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every placed, non-empty section.
    pub fn from_sections(sections: &SectionTable) -> Self {
        let mut image = Self::new();
        for (_, section) in sections.iter() {
            if let Some(origin) = section.origin {
                image.store_slice(origin, &section.bytes);
            }
        }
        image
    }

    pub fn store_slice(&mut self, addr: u32, values: &[u8]) {
        if values.is_empty() {
            return;
        }
        let pos = self.chunks.partition_point(|chunk| chunk.addr <= addr);
        self.chunks.insert(
            pos,
            Chunk {
                addr,
                bytes: values.to_vec(),
            },
        );
    }

    pub fn num_entries(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.bytes.len()).sum()
    }

    /// Lowest and highest (inclusive) address holding data.
    pub fn output_range(&self) -> Option<(u32, u32)> {
        let min = self.chunks.first()?.addr;
        let max = self
            .chunks
            .iter()
            .map(|chunk| chunk.addr.wrapping_add(chunk.bytes.len() as u32 - 1))
            .max()?;
        Some((min, max))
    }

    /// Write Intel HEX. Addresses above 64K get extended linear address
    /// records; `start` adds a start linear address record.
    pub fn write_hex_file<W: Write>(&self, mut out: W, start: Option<u32>) -> io::Result<()> {
        const LINE_LIMIT: usize = 32;
        let mut upper: u16 = 0;

        for chunk in &self.chunks {
            let mut addr = chunk.addr;
            let mut rest = chunk.bytes.as_slice();
            while !rest.is_empty() {
                let hi = (addr >> 16) as u16;
                if hi != upper {
                    write_record(&mut out, 0, 0x04, &hi.to_be_bytes())?;
                    upper = hi;
                }
                let to_boundary = 0x1_0000 - (addr & 0xffff) as usize;
                let take = rest.len().min(LINE_LIMIT).min(to_boundary);
                write_record(&mut out, addr as u16, 0x00, &rest[..take])?;
                rest = &rest[take..];
                addr = addr.wrapping_add(take as u32);
            }
        }

        if let Some(start) = start {
            write_record(&mut out, 0, 0x05, &start.to_be_bytes())?;
        }
        writeln!(out, ":00000001FF")?;
        Ok(())
    }

    /// Write the raw image from `start` to `end` inclusive, gaps filled.
    pub fn write_bin_file<W: Write>(
        &self,
        mut out: W,
        start: u32,
        end: u32,
        fill: u8,
    ) -> io::Result<()> {
        if end < start {
            return Ok(());
        }
        let size = (end - start) as usize + 1;
        let mut mem = vec![fill; size];
        for chunk in &self.chunks {
            for (ix, byte) in chunk.bytes.iter().enumerate() {
                let addr = chunk.addr as u64 + ix as u64;
                if addr >= start as u64 && addr <= end as u64 {
                    mem[(addr - start as u64) as usize] = *byte;
                }
            }
        }
        out.write_all(&mem)
    }
}

fn write_record<W: Write>(out: &mut W, addr: u16, rec_type: u8, data: &[u8]) -> io::Result<()> {
    let mut checksum = data.len() as u8;
    checksum = checksum.wrapping_add((addr >> 8) as u8);
    checksum = checksum.wrapping_add((addr & 0xff) as u8);
    checksum = checksum.wrapping_add(rec_type);
    let mut hex_data = String::with_capacity(data.len() * 2);
    for val in data {
        hex_data.push(hex_digit(val >> 4));
        hex_data.push(hex_digit(val & 0x0f));
        checksum = checksum.wrapping_add(*val);
    }
    let checksum = (!checksum).wrapping_add(1);
    writeln!(
        out,
        ":{:02X}{:04X}{:02X}{}{:02X}",
        data.len(),
        addr,
        rec_type,
        hex_data,
        checksum
    )
}

fn hex_digit(val: u8) -> char {
    match val {
        0..=9 => (b'0' + val) as char,
        _ => (b'A' + (val - 10)) as char,
    }
}

#[cfg(test)]
mod tests {
    use super::ImageStore;

    fn parse_hex_byte(s: &str) -> u8 {
        u8::from_str_radix(s, 16).unwrap()
    }

    fn verify_checksum(line: &str) {
        assert!(line.starts_with(':'), "record must start with ':'");
        let bytes = &line[1..];
        let len = parse_hex_byte(&bytes[0..2]) as usize;
        let data_end = 8 + len * 2;
        let mut sum: u8 = 0;
        for idx in (0..data_end).step_by(2) {
            sum = sum.wrapping_add(parse_hex_byte(&bytes[idx..idx + 2]));
        }
        let checksum = parse_hex_byte(&bytes[data_end..data_end + 2]);
        assert_eq!(checksum, (!sum).wrapping_add(1), "checksum mismatch for {line}");
    }

    #[test]
    fn writes_hex_records_with_valid_checksums() {
        let mut image = ImageStore::new();
        image.store_slice(0x1000, &[0x01, 0x02, 0x03]);
        let mut out = Vec::new();
        image.write_hex_file(&mut out, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ":03100000010203E7");
        for line in &lines {
            verify_checksum(line);
        }
        assert_eq!(lines.last().copied(), Some(":00000001FF"));
    }

    #[test]
    fn high_addresses_use_extended_linear_records() {
        let mut image = ImageStore::new();
        image.store_slice(0x0001_fffe, &[1, 2, 3, 4]);
        let mut out = Vec::new();
        image.write_hex_file(&mut out, Some(0x0002_0000)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with(":020000040001"));
        assert!(lines[1].starts_with(":02FFFE00"));
        assert!(lines[2].starts_with(":020000040002"));
        assert!(lines[3].starts_with(":02000000"));
        assert!(lines[4].starts_with(":0400000500020000"));
        for line in &lines {
            verify_checksum(line);
        }
    }

    #[test]
    fn write_bin_respects_range_and_fill() {
        let mut image = ImageStore::new();
        image.store_slice(0x0012, &[0xbb]);
        image.store_slice(0x0010, &[0xaa]);
        assert_eq!(image.output_range(), Some((0x10, 0x12)));
        let mut out = Vec::new();
        image.write_bin_file(&mut out, 0x000f, 0x0013, 0xff).unwrap();
        assert_eq!(out, vec![0xff, 0xaa, 0xff, 0xbb, 0xff]);
        assert_eq!(image.num_entries(), 2);
    }
}
