// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! MOS 6502 family module.

use crate::core::cpu::{CpuFamily, CpuType};
use crate::core::family::FamilyHandler;
use crate::core::patch::Endian;
use crate::core::registry::{CpuModule, FamilyModule};
use crate::core::tokenizer::{register_checker_from_fn, RegisterChecker};

use super::handler::MOS6502FamilyHandler;
use super::operand::is_register;
use super::table::{CpuSet, M6502, M65C02};

pub const FAMILY_ID: CpuFamily = CpuFamily::new("mos6502");
pub const CPU_6502: CpuType = CpuType::new("6502");
pub const CPU_65C02: CpuType = CpuType::new("65c02");

/// Table bit of a 6502 family CPU.
pub fn cpu_set(cpu: CpuType) -> CpuSet {
    if cpu == CPU_65C02 {
        M65C02
    } else {
        M6502
    }
}

pub struct MOS6502FamilyModule;

impl FamilyModule for MOS6502FamilyModule {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn endian(&self) -> Endian {
        Endian::Little
    }

    fn default_origin(&self) -> Option<u32> {
        Some(0)
    }

    fn alignment(&self) -> u32 {
        1
    }

    fn register_checker(&self) -> RegisterChecker {
        register_checker_from_fn(is_register)
    }

    fn handler(&self) -> Box<dyn FamilyHandler> {
        Box::new(MOS6502FamilyHandler::new())
    }
}

pub struct M6502CpuModule;

impl CpuModule for M6502CpuModule {
    fn cpu_id(&self) -> CpuType {
        CPU_6502
    }

    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn names(&self) -> &'static [&'static str] {
        &["6502", "MOS6502", "M6502"]
    }
}

pub struct M65C02CpuModule;

impl CpuModule for M65C02CpuModule {
    fn cpu_id(&self) -> CpuType {
        CPU_65C02
    }

    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn names(&self) -> &'static [&'static str] {
        &["65C02", "W65C02", "R65C02"]
    }
}
