// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CPU identifiers and the shared encoding error type.
//!
//! Families and CPUs are named by string identifiers declared in their own
//! modules and looked up through the registry.

use thiserror::Error;

use crate::core::assembler::error::AsmErrorKind;
use crate::core::tokenizer::Span;

/// Identifier for a CPU family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CpuFamily(&'static str);

impl CpuFamily {
    /// Create a new CPU family identifier.
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    /// Return the identifier string.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Identifier for a CPU type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CpuType(&'static str);

impl CpuType {
    /// Create a new CPU type identifier.
    pub const fn new(id: &'static str) -> Self {
        Self(id)
    }

    /// Return the identifier string.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Error returned by operand classification or instruction encoding.
///
/// The kind decides how the driver treats it: legality and syntax errors
/// suppress the instruction, the rest are reported next to best-effort output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EncodeError {
    pub kind: AsmErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl EncodeError {
    pub fn new(kind: AsmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(kind: AsmErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::with_span(AsmErrorKind::Syntax, message, span)
    }

    pub fn legality(message: impl Into<String>, span: Span) -> Self {
        Self::with_span(AsmErrorKind::Legality, message, span)
    }

    pub fn range(message: impl Into<String>, span: Span) -> Self {
        Self::with_span(AsmErrorKind::Range, message, span)
    }

    pub fn size(message: impl Into<String>, span: Span) -> Self {
        Self::with_span(AsmErrorKind::Size, message, span)
    }

    pub fn cpu(message: impl Into<String>, span: Span) -> Self {
        Self::with_span(AsmErrorKind::Cpu, message, span)
    }
}
