// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CHIP-8 virtual machine and the SUPER-CHIP extensions.
//!
//! Every instruction is one big-endian 16-bit word. Registers go into
//! fixed nibbles and at most one immediate fills the low bits.

pub mod handler;
pub mod module;
pub mod operand;
pub mod table;

pub use handler::Chip8FamilyHandler;
pub use module::{Chip8CpuModule, Chip8FamilyModule, SchipCpuModule};

#[cfg(test)]
mod tests;
