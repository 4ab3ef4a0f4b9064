// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Motorola 680x0 family: 68000 through 68060, CPU32 and the 68881/68882
//! floating point coprocessor.

pub mod classifier;
pub mod encoder;
pub mod fpu;
pub mod handler;
pub mod module;
pub mod operand;
pub mod table;

pub use handler::M68kFamilyHandler;
pub use module::{cpu_modules, M68kFamilyModule};

#[cfg(test)]
mod tests;
