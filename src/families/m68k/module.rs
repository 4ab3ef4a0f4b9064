// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! 680x0 family and CPU modules.

use crate::core::cpu::{CpuFamily, CpuType};
use crate::core::family::FamilyHandler;
use crate::core::patch::Endian;
use crate::core::registry::{CpuModule, FamilyModule};
use crate::core::tokenizer::{register_checker_from_fn, RegisterChecker};

use super::handler::M68kFamilyHandler;
use super::operand::is_register;
use super::table::{CpuSet, CPU32, M68000, M68010, M68020, M68030, M68040, M68060};

pub const FAMILY_ID: CpuFamily = CpuFamily::new("m68k");

pub const CPU_68000: CpuType = CpuType::new("68000");
pub const CPU_68010: CpuType = CpuType::new("68010");
pub const CPU_68020: CpuType = CpuType::new("68020");
pub const CPU_68030: CpuType = CpuType::new("68030");
pub const CPU_68040: CpuType = CpuType::new("68040");
pub const CPU_68060: CpuType = CpuType::new("68060");
pub const CPU_CPU32: CpuType = CpuType::new("cpu32");

struct Model {
    cpu: CpuType,
    features: CpuSet,
    names: &'static [&'static str],
}

const MODELS: &[Model] = &[
    Model { cpu: CPU_68000, features: M68000, names: &["68000", "MC68000", "68008", "M68K"] },
    Model { cpu: CPU_68010, features: M68010, names: &["68010", "MC68010"] },
    Model { cpu: CPU_68020, features: M68020, names: &["68020", "MC68020"] },
    Model { cpu: CPU_68030, features: M68030, names: &["68030", "MC68030"] },
    Model { cpu: CPU_68040, features: M68040, names: &["68040", "MC68040"] },
    Model { cpu: CPU_68060, features: M68060, names: &["68060", "MC68060"] },
    Model { cpu: CPU_CPU32, features: CPU32, names: &["CPU32", "68332"] },
];

/// Feature bit of a 680x0 CPU; the plain 68000 for anything else.
pub fn cpu_features(cpu: CpuType) -> CpuSet {
    MODELS
        .iter()
        .find(|model| model.cpu == cpu)
        .map_or(M68000, |model| model.features)
}

pub struct M68kFamilyModule;

impl FamilyModule for M68kFamilyModule {
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
        Box::new(M68kFamilyHandler)
    }
}

pub struct M68kCpuModule {
    model: &'static Model,
}

impl CpuModule for M68kCpuModule {
    fn cpu_id(&self) -> CpuType {
        self.model.cpu
    }

    fn family_id(&self) -> CpuFamily {
        FAMILY_ID
    }

    fn names(&self) -> &'static [&'static str] {
        self.model.names
    }
}

/// One CPU module per supported 680x0 model.
pub fn cpu_modules() -> Vec<Box<dyn CpuModule>> {
    MODELS
        .iter()
        .map(|model| Box::new(M68kCpuModule { model }) as Box<dyn CpuModule>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::m68k::table::FULL_EXT;

    #[test]
    fn models_map_to_feature_bits() {
        assert_eq!(cpu_features(CPU_68000), M68000);
        assert_ne!(cpu_features(CPU_68030) & FULL_EXT, 0);
        assert_eq!(cpu_features(CPU_CPU32) & FULL_EXT, 0);
        assert_eq!(cpu_modules().len(), MODELS.len());
    }
}
