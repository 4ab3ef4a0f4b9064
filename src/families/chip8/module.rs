// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CHIP-8 family and CPU modules.

use crate::core::cpu::{CpuFamily, CpuType};
use crate::core::family::FamilyHandler;
use crate::core::patch::Endian;
use crate::core::registry::{CpuModule, FamilyModule};
use crate::core::tokenizer::{register_checker_from_fn, RegisterChecker};

use super::handler::Chip8FamilyHandler;
use super::operand::is_register;
use super::table::{CpuSet, CHIP8, SCHIP};

pub const FAMILY_ID: CpuFamily = CpuFamily::new("chip8");
pub const CPU_CHIP8: CpuType = CpuType::new("chip8");
pub const CPU_SCHIP: CpuType = CpuType::new("schip");

/// Table bit for a CPU of this family.
pub fn cpu_set(cpu: CpuType) -> CpuSet {
    if cpu == CPU_SCHIP {
        SCHIP
    } else {
        CHIP8
    }
}

pub struct Chip8FamilyModule;

impl FamilyModule for Chip8FamilyModule {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn endian(&self) -> Endian {
        Endian::Big
    }

    /// Programs are loaded above the interpreter area.
    fn default_origin(&self) -> Option<u32> {
        Some(0x200)
    }

    fn alignment(&self) -> u32 {
        2
    }

    fn register_checker(&self) -> RegisterChecker {
        register_checker_from_fn(is_register)
    }

    fn handler(&self) -> Box<dyn FamilyHandler> {
        Box::new(Chip8FamilyHandler)
    }
}

pub struct Chip8CpuModule;

impl CpuModule for Chip8CpuModule {
    fn cpu_id(&self) -> CpuType {
        CPU_CHIP8
    }

    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn names(&self) -> &'static [&'static str] {
        &["CHIP8", "CHIP-8"]
    }
}

pub struct SchipCpuModule;

impl CpuModule for SchipCpuModule {
    fn cpu_id(&self) -> CpuType {
        CPU_SCHIP
    }

    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn names(&self) -> &'static [&'static str] {
        &["SCHIP", "SUPERCHIP", "SUPER-CHIP"]
    }
}
