// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Single-pass retargetable assembler.
//!
//! [`core`] holds the CPU-agnostic pieces (expressions, patch queue,
//! sections, symbols), [`families`] one backend per instruction-set family,
//! and [`assembler`] the line driver and command-line front end.

pub mod assembler;
pub mod core;
pub mod families;
