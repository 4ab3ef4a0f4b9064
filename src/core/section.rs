// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Output sections: the byte sink encoders append to.
//!
//! A section either has a fixed origin (after `ORG`, or the family default
//! for the first section) or is placed during layout, after all source has
//! been read. Bytes are stored section-relative; patches address them by
//! `(section, offset)`.

use tracing::debug;

use crate::core::expr::SectionId;

pub const DEFAULT_SECTION: &str = "CODE";

#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub origin: Option<u32>,
    pub bytes: Vec<u8>,
}

impl Section {
    fn new(name: &str, origin: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            origin,
            bytes: Vec::new(),
        }
    }

    pub fn len(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Address one past the last byte, if placed.
    pub fn end(&self) -> Option<u32> {
        self.origin.map(|origin| origin.wrapping_add(self.len()))
    }
}

#[derive(Debug, Clone)]
pub struct SectionTable {
    sections: Vec<Section>,
    current: SectionId,
}

impl SectionTable {
    /// Create the table with the default section.
    pub fn new(default_origin: Option<u32>) -> Self {
        Self {
            sections: vec![Section::new(DEFAULT_SECTION, default_origin)],
            current: 0,
        }
    }

    pub fn current_id(&self) -> SectionId {
        self.current
    }

    pub fn current(&self) -> &Section {
        &self.sections[self.current]
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectionId, &Section)> {
        self.sections.iter().enumerate()
    }

    /// Switch to `name`, creating an unplaced section on first use.
    pub fn switch_to(&mut self, name: &str) -> SectionId {
        let id = match self
            .sections
            .iter()
            .position(|section| section.name.eq_ignore_ascii_case(name))
        {
            Some(id) => id,
            None => {
                self.sections.push(Section::new(name, None));
                self.sections.len() - 1
            }
        };
        self.current = id;
        id
    }

    /// Handle `ORG` for the current section.
    ///
    /// An empty section takes the address as its origin. A placed section
    /// with content is padded forward with `fill`; moving backwards is an
    /// error.
    pub fn set_origin(&mut self, addr: u32, fill: u8) -> Result<(), String> {
        let section = &mut self.sections[self.current];
        if section.bytes.is_empty() {
            section.origin = Some(addr);
            return Ok(());
        }
        match section.end() {
            Some(end) if addr >= end => {
                let pad = (addr - end) as usize;
                section.bytes.resize(section.bytes.len() + pad, fill);
                Ok(())
            }
            Some(end) => Err(format!(
                "ORG ${addr:X} moves backwards from ${end:X} in section {}",
                section.name
            )),
            None => Err(format!(
                "ORG after code in section {} without a fixed origin",
                section.name
            )),
        }
    }

    pub fn current_offset(&self) -> u32 {
        self.current().len()
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.sections[self.current].bytes.extend_from_slice(bytes);
    }

    /// Overwrite already emitted bytes (backpatching).
    pub fn write_at(&mut self, id: SectionId, offset: u32, bytes: &[u8]) -> bool {
        let Some(section) = self.sections.get_mut(id) else {
            return false;
        };
        let start = offset as usize;
        let Some(target) = section.bytes.get_mut(start..start + bytes.len()) else {
            return false;
        };
        target.copy_from_slice(bytes);
        true
    }

    pub fn read_at(&self, id: SectionId, offset: u32, len: usize) -> Option<&[u8]> {
        let start = offset as usize;
        self.sections.get(id)?.bytes.get(start..start + len)
    }

    pub fn base(&self, id: SectionId) -> Option<u32> {
        self.sections.get(id)?.origin
    }

    /// Place every section without an origin after the highest end address
    /// of the placed ones, aligned to `align`.
    pub fn layout(&mut self, align: u32) {
        let align = align.max(1);
        let mut next = self
            .sections
            .iter()
            .filter_map(Section::end)
            .max()
            .unwrap_or(0);
        for section in self.sections.iter_mut().filter(|s| s.origin.is_none()) {
            let rem = next % align;
            if rem != 0 {
                next = next.wrapping_add(align - rem);
            }
            debug!(section = %section.name, base = next, size = section.len(), "placing section");
            section.origin = Some(next);
            next = next.wrapping_add(section.len());
        }
    }
}
