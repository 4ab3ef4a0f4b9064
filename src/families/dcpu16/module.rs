// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! DCPU-16 family and CPU modules.

use crate::core::cpu::{CpuFamily, CpuType};
use crate::core::family::FamilyHandler;
use crate::core::patch::Endian;
use crate::core::registry::{CpuModule, FamilyModule};
use crate::core::tokenizer::{register_checker_from_fn, RegisterChecker};

use super::handler::Dcpu16FamilyHandler;
use super::operand::is_register;

pub const FAMILY_ID: CpuFamily = CpuFamily::new("dcpu16");
pub const CPU_DCPU16: CpuType = CpuType::new("dcpu16");

pub struct Dcpu16FamilyModule;

impl FamilyModule for Dcpu16FamilyModule {
    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn endian(&self) -> Endian {
        Endian::Big
    }

    fn default_origin(&self) -> Option<u32> {
        Some(0)
    }

    fn alignment(&self) -> u32 {
        2
    }

    fn register_checker(&self) -> RegisterChecker {
        register_checker_from_fn(is_register)
    }

    fn handler(&self) -> Box<dyn FamilyHandler> {
        Box::new(Dcpu16FamilyHandler)
    }
}

pub struct Dcpu16CpuModule;

impl CpuModule for Dcpu16CpuModule {
    fn cpu_id(&self) -> CpuType {
        CPU_DCPU16
    }

    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn names(&self) -> &'static [&'static str] {
        &["DCPU16", "DCPU-16"]
    }
}
