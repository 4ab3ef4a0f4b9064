// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! RISC-V RV32I with the optional M extension.
//!
//! Immediates scattered over the instruction word (S, B and J formats,
//! `%hi`/`%lo` pairs) are written through merge functions, so forward
//! references are patched the same way as constants are encoded.

pub mod handler;
pub mod module;
pub mod operand;
pub mod table;

pub use handler::RiscvFamilyHandler;
pub use module::{RiscvFamilyModule, Rv32iCpuModule, Rv32imCpuModule};
