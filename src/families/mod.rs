// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CPU family backends.

pub mod chip8;
pub mod dcpu16;
pub mod m68k;
pub mod mos6502;
pub mod riscv;

#[cfg(test)]
pub(crate) mod test_support;
