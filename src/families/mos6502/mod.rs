// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! MOS 6502 CPU family: the NMOS 6502 and the CMOS 65C02.
//!
//! # Family Characteristics
//!
//! - 8-bit data bus, 16-bit little-endian addresses
//! - Registers: A (accumulator), X, Y (index)
//! - Unique addressing modes with parentheses for indirect
//!
//! # Addressing Modes (Family Common)
//!
//! | Syntax | Mode |
//! |--------|------|
//! | `#$20` | Immediate |
//! | `$20` | Zero Page |
//! | `$20,X` | Zero Page,X |
//! | `$20,Y` | Zero Page,Y |
//! | `$1234` | Absolute |
//! | `$1234,X` | Absolute,X |
//! | `$1234,Y` | Absolute,Y |
//! | `($20,X)` | Indexed Indirect |
//! | `($20),Y` | Indirect Indexed |
//!
//! The 65C02 adds `($20)` zero page indirect, `JMP ($1234,X)` and the
//! Rockwell bit instructions.

pub mod handler;
pub mod module;
pub mod operand;
pub mod table;

pub use handler::MOS6502FamilyHandler;
pub use module::{M65C02CpuModule, M6502CpuModule, MOS6502FamilyModule};
pub use operand::{is_register, AddressMode, FamilyOperand};
