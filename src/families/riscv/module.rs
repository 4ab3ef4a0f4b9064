// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! RISC-V family and CPU modules.

use crate::core::cpu::{CpuFamily, CpuType};
use crate::core::family::FamilyHandler;
use crate::core::patch::Endian;
use crate::core::registry::{CpuModule, FamilyModule};
use crate::core::tokenizer::{register_checker_from_fn, RegisterChecker};

use super::handler::RiscvFamilyHandler;
use super::operand::is_register;
use super::table::{Extensions, BASE, MUL};

pub const FAMILY_ID: CpuFamily = CpuFamily::new("riscv");
pub const CPU_RV32I: CpuType = CpuType::new("rv32i");
pub const CPU_RV32IM: CpuType = CpuType::new("rv32im");

/// Extensions implemented by a RISC-V CPU.
pub fn cpu_extensions(cpu: CpuType) -> Extensions {
    if cpu == CPU_RV32IM {
        BASE | MUL
    } else {
        BASE
    }
}

pub struct RiscvFamilyModule;

impl FamilyModule for RiscvFamilyModule {
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
        4
    }

    fn register_checker(&self) -> RegisterChecker {
        register_checker_from_fn(is_register)
    }

    fn handler(&self) -> Box<dyn FamilyHandler> {
        Box::new(RiscvFamilyHandler)
    }
}

pub struct Rv32iCpuModule;

impl CpuModule for Rv32iCpuModule {
    fn cpu_id(&self) -> CpuType {
        CPU_RV32I
    }

    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn names(&self) -> &'static [&'static str] {
        &["RV32I", "RISCV"]
    }
}

pub struct Rv32imCpuModule;

impl CpuModule for Rv32imCpuModule {
    fn cpu_id(&self) -> CpuType {
        CPU_RV32IM
    }

    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn names(&self) -> &'static [&'static str] {
        &["RV32IM"]
    }
}
