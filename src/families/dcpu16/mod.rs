// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! DCPU-16 style 16-bit CPU.
//!
//! Every instruction is one word followed by up to two next words, one per
//! operand that needs it. Words are stored big-endian; labels are byte
//! addresses like in every other family.

pub mod handler;
pub mod module;
pub mod operand;
pub mod table;

pub use handler::Dcpu16FamilyHandler;
pub use module::{Dcpu16CpuModule, Dcpu16FamilyModule};

#[cfg(test)]
mod tests;
