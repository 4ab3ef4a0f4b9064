// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Module registry for CPU families and CPUs.
//!
//! Families contribute a handler plus the target properties the generic
//! driver needs (byte order, default origin, section alignment, register
//! names). CPUs are looked up by name and map to exactly one family.

use std::collections::HashMap;

use thiserror::Error;

use crate::core::cpu::{CpuFamily, CpuType};
use crate::core::family::FamilyHandler;
use crate::core::patch::Endian;
use crate::core::tokenizer::RegisterChecker;

pub trait FamilyModule: Send + Sync {
    fn family_id(&self) -> CpuFamily;
    fn endian(&self) -> Endian;
    /// Origin of the default section, if the target has a fixed load address.
    fn default_origin(&self) -> Option<u32>;
    /// Alignment applied to sections placed during layout.
    fn alignment(&self) -> u32;
    fn register_checker(&self) -> RegisterChecker;
    fn handler(&self) -> Box<dyn FamilyHandler>;
}

pub trait CpuModule: Send + Sync {
    fn cpu_id(&self) -> CpuType;
    fn family_id(&self) -> CpuFamily;
    /// Names accepted on the command line and by the `CPU` directive.
    fn names(&self) -> &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unknown CPU: {0}")]
    UnknownCpu(String),
    #[error("No family module registered for {}", .0.as_str())]
    MissingFamily(CpuFamily),
}

pub struct ResolvedPipeline<'a> {
    pub cpu: CpuType,
    pub family: &'a dyn FamilyModule,
    pub handler: Box<dyn FamilyHandler>,
}

pub struct ModuleRegistry {
    families: HashMap<CpuFamily, Box<dyn FamilyModule>>,
    cpus: Vec<Box<dyn CpuModule>>,
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            families: HashMap::new(),
            cpus: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        use crate::families::{chip8, dcpu16, m68k, mos6502, riscv};

        let mut registry = Self::new();
        registry.register_family(Box::new(m68k::module::M68kFamilyModule));
        registry.register_family(Box::new(mos6502::module::MOS6502FamilyModule));
        registry.register_family(Box::new(dcpu16::module::Dcpu16FamilyModule));
        registry.register_family(Box::new(riscv::module::RiscvFamilyModule));
        registry.register_family(Box::new(chip8::module::Chip8FamilyModule));

        for cpu in m68k::module::cpu_modules() {
            registry.register_cpu(cpu);
        }
        registry.register_cpu(Box::new(mos6502::module::M6502CpuModule));
        registry.register_cpu(Box::new(mos6502::module::M65C02CpuModule));
        registry.register_cpu(Box::new(dcpu16::module::Dcpu16CpuModule));
        registry.register_cpu(Box::new(riscv::module::Rv32iCpuModule));
        registry.register_cpu(Box::new(riscv::module::Rv32imCpuModule));
        registry.register_cpu(Box::new(chip8::module::Chip8CpuModule));
        registry.register_cpu(Box::new(chip8::module::SchipCpuModule));
        registry
    }

    pub fn register_family(&mut self, module: Box<dyn FamilyModule>) {
        self.families.insert(module.family_id(), module);
    }

    pub fn register_cpu(&mut self, module: Box<dyn CpuModule>) {
        self.cpus.push(module);
    }

    /// Find a CPU by any of its names, ignoring case.
    pub fn resolve_cpu_name(&self, name: &str) -> Option<CpuType> {
        self.cpus
            .iter()
            .find(|cpu| cpu.names().iter().any(|n| n.eq_ignore_ascii_case(name)))
            .map(|cpu| cpu.cpu_id())
    }

    pub fn family_of(&self, cpu: CpuType) -> Option<CpuFamily> {
        self.cpus
            .iter()
            .find(|module| module.cpu_id() == cpu)
            .map(|module| module.family_id())
    }

    /// Primary name of every registered CPU, in registration order.
    pub fn cpu_names(&self) -> Vec<&'static str> {
        self.cpus
            .iter()
            .filter_map(|cpu| cpu.names().first().copied())
            .collect()
    }

    pub fn resolve_pipeline(&self, cpu: CpuType) -> Result<ResolvedPipeline<'_>, RegistryError> {
        let family_id = self
            .family_of(cpu)
            .ok_or_else(|| RegistryError::UnknownCpu(cpu.as_str().to_string()))?;
        let family = self
            .families
            .get(&family_id)
            .ok_or(RegistryError::MissingFamily(family_id))?;
        Ok(ResolvedPipeline {
            cpu,
            family: family.as_ref(),
            handler: family.handler(),
        })
    }

    /// Resolve a CPU name straight to its pipeline.
    pub fn resolve_name(&self, name: &str) -> Result<ResolvedPipeline<'_>, RegistryError> {
        let cpu = self
            .resolve_cpu_name(name)
            .ok_or_else(|| RegistryError::UnknownCpu(name.to_string()))?;
        self.resolve_pipeline(cpu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_cpu_aliases_case_insensitively() {
        let registry = ModuleRegistry::with_defaults();
        let cpu = registry.resolve_cpu_name("68020").expect("68020");
        assert_eq!(registry.resolve_cpu_name("MC68020"), Some(cpu));
        assert_eq!(registry.family_of(cpu).map(|f| f.as_str()), Some("m68k"));
        assert!(registry.resolve_cpu_name("65C02").is_some());
        assert!(registry.resolve_cpu_name("z80").is_none());
    }

    #[test]
    fn pipeline_carries_family_properties() {
        let registry = ModuleRegistry::with_defaults();
        let chip8 = registry.resolve_name("chip8").expect("chip8 pipeline");
        assert_eq!(chip8.family.default_origin(), Some(0x200));
        assert_eq!(chip8.family.endian(), Endian::Big);
        let m6502 = registry.resolve_name("6502").expect("6502 pipeline");
        assert_eq!(m6502.family.endian(), Endian::Little);
        assert!(matches!(
            registry.resolve_name("pdp11"),
            Err(RegistryError::UnknownCpu(_))
        ));
    }
}
