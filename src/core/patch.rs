// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Deferred field writes.
//!
//! When a field's expression is not constant at encode time the encoder
//! reserves the bytes and records a [`Patch`]. The queue is drained exactly
//! once, after the last source line and section layout.

use crate::core::expr::{EvalError, Expr, SectionId};

const NO_RESERVED: (i64, i64) = (1, 0);

/// Merge a resolved value into the existing bits of a field.
///
/// Used for immediates scattered across an instruction word (RISC-V branch
/// offsets, CHIP-8 12-bit addresses, 680x0 quick data).
pub type FieldMerge = fn(existing: u32, value: i32) -> u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Shape of an encoded field.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Width in bytes: 1, 2 or 4.
    pub width: u8,
    pub endian: Endian,
    /// Inclusive range the value must fall into.
    pub low: i64,
    pub high: i64,
    pub merge: Option<FieldMerge>,
    /// Fixed bits of a merged field.
    pub base: u32,
    /// Values inside `low..=high` that the field still cannot hold, as an
    /// inclusive band. Empty when the first bound exceeds the second.
    pub reserved: (i64, i64),
}

impl Field {
    pub const fn new(width: u8, endian: Endian, low: i64, high: i64) -> Self {
        Self {
            width,
            endian,
            low,
            high,
            merge: None,
            base: 0,
            reserved: NO_RESERVED,
        }
    }

    /// Field accepting both the signed and unsigned interpretation.
    pub const fn any(width: u8, endian: Endian) -> Self {
        let bits = width as u32 * 8;
        let low = -(1i64 << (bits - 1));
        let high = (1i64 << bits) - 1;
        Self::new(width, endian, low, high)
    }

    /// Signed field.
    pub const fn signed(width: u8, endian: Endian) -> Self {
        let bits = width as u32 * 8;
        Self::new(
            width,
            endian,
            -(1i64 << (bits - 1)),
            (1i64 << (bits - 1)) - 1,
        )
    }

    /// Field whose value is merged into `base` by `merge`.
    pub const fn merged(
        width: u8,
        endian: Endian,
        base: u32,
        low: i64,
        high: i64,
        merge: FieldMerge,
    ) -> Self {
        Self {
            width,
            endian,
            low,
            high,
            merge: Some(merge),
            base,
            reserved: NO_RESERVED,
        }
    }

    /// Reject `low..=high` even though the value range admits it.
    pub const fn reserving(mut self, low: i64, high: i64) -> Self {
        self.reserved = (low, high);
        self
    }

    /// Fail for a value in the reserved band.
    pub fn check_reserved(&self, value: i32) -> Result<(), EvalError> {
        let (low, high) = self.reserved;
        let value = value as i64;
        if (low..=high).contains(&value) {
            return Err(EvalError::Reserved { value });
        }
        Ok(())
    }

    /// Encode `value` (already range checked) into bytes.
    pub fn encode(&self, existing: u32, value: i32) -> Vec<u8> {
        let raw = match self.merge {
            Some(merge) => merge(existing, value),
            None => value as u32,
        };
        to_bytes(raw, self.width, self.endian)
    }
}

pub fn to_bytes(value: u32, width: u8, endian: Endian) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut out = bytes[4 - width as usize..].to_vec();
    if endian == Endian::Little {
        out.reverse();
    }
    out
}

pub fn from_bytes(bytes: &[u8], endian: Endian) -> u32 {
    let fold = |acc: u32, b: &u8| (acc << 8) | *b as u32;
    match endian {
        Endian::Big => bytes.iter().fold(0, fold),
        Endian::Little => bytes.iter().rev().fold(0, fold),
    }
}

/// A pending write of `expr` into `(section, offset)`.
#[derive(Debug, Clone)]
pub struct Patch {
    pub section: SectionId,
    pub offset: u32,
    pub field: Field,
    pub expr: Expr,
    pub line: u32,
}

#[derive(Debug, Default)]
pub struct PatchQueue {
    patches: Vec<Patch>,
}

impl PatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, patch: Patch) {
        self.patches.push(patch);
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Take every queued patch, leaving the queue empty.
    pub fn take(&mut self) -> Vec<Patch> {
        std::mem::take(&mut self.patches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_follow_endianness() {
        assert_eq!(to_bytes(0x1234, 2, Endian::Big), vec![0x12, 0x34]);
        assert_eq!(to_bytes(0x1234, 2, Endian::Little), vec![0x34, 0x12]);
        assert_eq!(to_bytes(0xdeadbeef, 4, Endian::Big), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(to_bytes(0x1ff, 1, Endian::Big), vec![0xff]);
        assert_eq!(from_bytes(&[0x34, 0x12], Endian::Little), 0x1234);
    }

    #[test]
    fn field_ranges() {
        let f = Field::any(2, Endian::Big);
        assert_eq!((f.low, f.high), (-32768, 65535));
        let f = Field::signed(1, Endian::Big);
        assert_eq!((f.low, f.high), (-128, 127));
    }

    #[test]
    fn reserved_band_rejects_values_inside_the_range() {
        let f = Field::signed(1, Endian::Big);
        assert_eq!(f.check_reserved(0), Ok(()));
        let f = f.reserving(-1, 0);
        assert_eq!(f.check_reserved(0), Err(EvalError::Reserved { value: 0 }));
        assert_eq!(f.check_reserved(-1), Err(EvalError::Reserved { value: -1 }));
        assert_eq!(f.check_reserved(1), Ok(()));
        assert_eq!(f.check_reserved(-2), Ok(()));
    }

    #[test]
    fn merged_fields_keep_fixed_bits() {
        fn low12(existing: u32, value: i32) -> u32 {
            (existing & 0xf000) | (value as u32 & 0x0fff)
        }
        let f = Field::merged(2, Endian::Big, 0x1000, 0, 0xfff, low12);
        assert_eq!(f.encode(0x1000, 0x234), vec![0x12, 0x34]);
    }
}
