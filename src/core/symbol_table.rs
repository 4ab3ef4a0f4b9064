// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Symbol table for labels and constants.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use crate::core::expr::{Expr, SectionId, SymbolLookup, MAX_RESOLVE_DEPTH};
use crate::core::section::SectionTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolValue {
    Constant(i32),
    /// Label inside a section; absolute once the section is placed.
    Address { section: SectionId, offset: u32 },
    /// `EQU` whose right-hand side was not constant when defined.
    Deferred(Expr),
}

#[derive(Debug, Clone)]
pub struct SymbolTableEntry {
    pub name: String,
    pub value: SymbolValue,
    pub rw: bool,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum SymbolTableResult {
    Ok,
    Duplicate,
    NotFound,
    TableFull,
}

pub const MAX_ENTRIES: usize = 66000;

/// Case-insensitive symbol table preserving definition order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolTableEntry>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a symbol. `rw` symbols (`SET`) may be redefined.
    pub fn add(&mut self, name: &str, value: SymbolValue, rw: bool, line: u32) -> SymbolTableResult {
        let key = name.to_ascii_uppercase();
        if let Some(&idx) = self.index.get(&key) {
            let entry = &mut self.entries[idx];
            if entry.rw && rw {
                entry.value = value;
                entry.line = line;
                return SymbolTableResult::Ok;
            }
            return SymbolTableResult::Duplicate;
        }
        if self.entries.len() >= MAX_ENTRIES {
            return SymbolTableResult::TableFull;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(SymbolTableEntry {
            name: name.to_string(),
            value,
            rw,
            line,
        });
        SymbolTableResult::Ok
    }

    pub fn update(&mut self, name: &str, value: SymbolValue) -> SymbolTableResult {
        match self.index.get(&name.to_ascii_uppercase()) {
            Some(&idx) => {
                self.entries[idx].value = value;
                SymbolTableResult::Ok
            }
            None => SymbolTableResult::NotFound,
        }
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&SymbolTableEntry> {
        self.index
            .get(&name.to_ascii_uppercase())
            .map(|&idx| &self.entries[idx])
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&SymbolValue> {
        self.entry(name).map(|entry| &entry.value)
    }

    pub fn entries(&self) -> impl Iterator<Item = &SymbolTableEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Numeric value of `name` given the current section placement.
    pub fn resolve_value(&self, name: &str, sections: &SectionTable) -> Option<i32> {
        SymbolResolver {
            symbols: self,
            sections,
            depth: 0,
        }
        .symbol_value(name)
    }

    /// Names on the first chain of deferred definitions reachable from
    /// `name` that leads back into itself.
    pub fn definition_cycle(&self, name: &str) -> Option<Vec<String>> {
        let mut stack = Vec::new();
        let mut done = HashSet::new();
        self.find_cycle(name, &mut stack, &mut done)
    }

    fn find_cycle<'a>(
        &'a self,
        name: &str,
        stack: &mut Vec<&'a str>,
        done: &mut HashSet<String>,
    ) -> Option<Vec<String>> {
        if let Some(pos) = stack.iter().position(|s| s.eq_ignore_ascii_case(name)) {
            return Some(stack[pos..].iter().map(|s| s.to_string()).collect());
        }
        let key = name.to_ascii_uppercase();
        if done.contains(&key) {
            return None;
        }
        let entry = self.entry(name)?;
        let SymbolValue::Deferred(expr) = &entry.value else {
            return None;
        };
        stack.push(&entry.name);
        for next in expr.symbol_names() {
            if let Some(cycle) = self.find_cycle(next, stack, done) {
                return Some(cycle);
            }
        }
        stack.pop();
        done.insert(key);
        None
    }

    pub fn dump<W: Write>(&self, mut out: W, sections: &SectionTable) -> io::Result<()> {
        for entry in &self.entries {
            match self.resolve_value(&entry.name, sections) {
                Some(val) => writeln!(
                    out,
                    "{:<16}: {:08X} ({})",
                    entry.name, val as u32, val
                )?,
                None => writeln!(out, "{:<16}: ???????? (unresolved)", entry.name)?,
            }
        }
        Ok(())
    }
}

/// [`SymbolLookup`] over the symbol and section tables.
///
/// Deferred definitions are followed recursively up to
/// [`MAX_RESOLVE_DEPTH`]; deeper chains (including cycles) stay unresolved.
/// [`SymbolTable::definition_cycle`] tells the two apart.
pub struct SymbolResolver<'a> {
    pub symbols: &'a SymbolTable,
    pub sections: &'a SectionTable,
    pub depth: usize,
}

impl SymbolLookup for SymbolResolver<'_> {
    fn symbol_value(&self, name: &str) -> Option<i32> {
        match self.symbols.lookup(name)? {
            SymbolValue::Constant(value) => Some(*value),
            SymbolValue::Address { section, offset } => {
                let base = self.sections.base(*section)?;
                Some(base.wrapping_add(*offset) as i32)
            }
            SymbolValue::Deferred(expr) => {
                if self.depth >= MAX_RESOLVE_DEPTH {
                    return None;
                }
                let nested = SymbolResolver {
                    symbols: self.symbols,
                    sections: self.sections,
                    depth: self.depth + 1,
                };
                expr.eval(&nested).ok()
            }
        }
    }

    fn section_base(&self, section: SectionId) -> Option<u32> {
        self.sections.base(section)
    }
}

#[cfg(test)]
mod tests {
    use super::{SymbolTable, SymbolTableResult, SymbolValue};
    use crate::core::expr::{BinaryOp, Expr};
    use crate::core::section::SectionTable;
    use crate::core::tokenizer::Span;

    #[test]
    fn add_and_lookup_are_case_insensitive() {
        let mut table = SymbolTable::new();
        assert_eq!(
            table.add("Foo", SymbolValue::Constant(0x10), false, 1),
            SymbolTableResult::Ok
        );
        assert_eq!(table.lookup("foo"), Some(&SymbolValue::Constant(0x10)));
        assert_eq!(table.lookup("FOO"), Some(&SymbolValue::Constant(0x10)));
    }

    #[test]
    fn duplicate_and_rw_behavior() {
        let mut table = SymbolTable::new();
        assert_eq!(
            table.add("Val", SymbolValue::Constant(1), false, 1),
            SymbolTableResult::Ok
        );
        assert_eq!(
            table.add("val", SymbolValue::Constant(2), false, 2),
            SymbolTableResult::Duplicate
        );
        assert_eq!(
            table.add("Rw", SymbolValue::Constant(3), true, 3),
            SymbolTableResult::Ok
        );
        assert_eq!(
            table.add("rw", SymbolValue::Constant(4), true, 4),
            SymbolTableResult::Ok
        );
        assert_eq!(table.lookup("RW"), Some(&SymbolValue::Constant(4)));
        assert_eq!(
            table.update("missing", SymbolValue::Constant(0)),
            SymbolTableResult::NotFound
        );
    }

    #[test]
    fn addresses_resolve_once_section_is_placed() {
        let mut sections = SectionTable::new(None);
        let mut table = SymbolTable::new();
        let _ = table.add(
            "start",
            SymbolValue::Address {
                section: 0,
                offset: 4,
            },
            false,
            1,
        );
        assert_eq!(table.resolve_value("start", &sections), None);
        sections.layout(2);
        assert_eq!(table.resolve_value("start", &sections), Some(4));
    }

    #[test]
    fn deferred_definitions_follow_chains_and_stop_on_cycles() {
        let sections = SectionTable::new(Some(0));
        let sp = Span::default();
        let mut table = SymbolTable::new();
        let plus_one = |name: &str| {
            Expr::binary(
                BinaryOp::Add,
                Expr::symbol(name, sp),
                Expr::constant(1, sp),
                sp,
            )
            .unwrap()
        };
        let _ = table.add("a", SymbolValue::Deferred(plus_one("b")), false, 1);
        let _ = table.add("b", SymbolValue::Constant(41), false, 2);
        assert_eq!(table.resolve_value("a", &sections), Some(42));

        let _ = table.add("x", SymbolValue::Deferred(plus_one("y")), false, 3);
        let _ = table.add("y", SymbolValue::Deferred(plus_one("x")), false, 4);
        assert_eq!(table.resolve_value("x", &sections), None);
    }

    #[test]
    fn definition_cycles_are_named() {
        let sp = Span::default();
        let mut table = SymbolTable::new();
        let _ = table.add("first", SymbolValue::Deferred(Expr::symbol("Second", sp)), false, 1);
        let _ = table.add("second", SymbolValue::Deferred(Expr::symbol("FIRST", sp)), false, 2);
        let _ = table.add("user", SymbolValue::Deferred(Expr::symbol("first", sp)), false, 3);
        let _ = table.add("plain", SymbolValue::Deferred(Expr::symbol("later", sp)), false, 4);
        let _ = table.add("later", SymbolValue::Constant(7), false, 5);

        assert_eq!(
            table.definition_cycle("first"),
            Some(vec!["first".to_string(), "second".to_string()])
        );
        assert_eq!(
            table.definition_cycle("USER"),
            Some(vec!["first".to_string(), "second".to_string()])
        );
        assert_eq!(table.definition_cycle("plain"), None);
        assert_eq!(table.definition_cycle("missing"), None);
    }
}
