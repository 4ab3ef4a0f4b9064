// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Family handler abstraction.
//!
//! ```text
//! Line splitter → Family Handler (classify, check legality, encode) → AsmContext
//! ```
//!
//! The generic driver handles labels, directives and expressions. Everything
//! that depends on the instruction set goes through a [`FamilyHandler`]:
//! it classifies the operand tokens into the family's addressing modes,
//! looks the mnemonic up in its legality table, and commits an
//! [`Emission`](crate::core::context::Emission) to the context.

use crate::core::context::AsmContext;
use crate::core::cpu::{CpuFamily, EncodeError};
use crate::core::parser::{split_operands, tokens_span};
use crate::core::tokenizer::{Span, Token};

/// One instruction line after label and mnemonic have been split off.
#[derive(Debug, Clone)]
pub struct Instruction<'a> {
    /// Uppercased mnemonic.
    pub mnemonic: String,
    pub mnemonic_span: Span,
    /// Uppercased size suffix (`B`, `W`, `L`, `S`, ...).
    pub size: Option<String>,
    pub size_span: Option<Span>,
    /// Operand token groups, split on top-level commas.
    pub operands: Vec<&'a [Token]>,
}

impl<'a> Instruction<'a> {
    pub fn new(
        mnemonic: &str,
        mnemonic_span: Span,
        size: Option<(String, Span)>,
        operand_tokens: &'a [Token],
    ) -> Self {
        let (size, size_span) = match size {
            Some((size, span)) => (Some(size), Some(span)),
            None => (None, None),
        };
        Self {
            mnemonic: mnemonic.to_ascii_uppercase(),
            mnemonic_span,
            size,
            size_span,
            operands: split_operands(operand_tokens),
        }
    }

    /// Span of operand `idx`, or of the mnemonic when it does not exist.
    pub fn operand_span(&self, idx: usize) -> Span {
        match self.operands.get(idx) {
            Some(tokens) if !tokens.is_empty() => tokens_span(tokens),
            _ => self.mnemonic_span,
        }
    }

    /// Error unless the instruction has exactly `count` operands.
    pub fn expect_operands(&self, count: usize) -> Result<(), EncodeError> {
        if self.operands.len() == count {
            return Ok(());
        }
        let message = match count {
            0 => format!("{} takes no operands", self.mnemonic),
            1 => format!("{} takes one operand", self.mnemonic),
            n => format!("{} takes {n} operands", self.mnemonic),
        };
        Err(EncodeError::syntax(message, self.mnemonic_span))
    }

    pub fn size_char(&self) -> Option<char> {
        match self.size.as_deref() {
            Some(s) if s.len() == 1 => s.chars().next(),
            _ => None,
        }
    }
}

/// Outcome of handing an instruction to a family handler.
#[derive(Debug, Clone)]
pub enum EncodeResult<T> {
    /// Encoded and committed.
    Ok(T),
    /// Mnemonic unknown to this family.
    NotFound,
    /// Rejected; nothing was emitted.
    Error(EncodeError),
}

impl<T> From<Result<T, EncodeError>> for EncodeResult<T> {
    fn from(result: Result<T, EncodeError>) -> Self {
        match result {
            Ok(value) => EncodeResult::Ok(value),
            Err(err) => EncodeResult::Error(err),
        }
    }
}

/// Instruction-set specific part of the assembler.
pub trait FamilyHandler: Send + Sync {
    fn family_id(&self) -> CpuFamily;

    /// Check if an identifier (uppercased) is a register of this family.
    fn is_register(&self, name: &str) -> bool;

    /// Check the mnemonic against the active CPU's table, classify the
    /// operands and emit the encoding.
    ///
    /// Errors that must not produce output are returned; non-fatal problems
    /// (size or CPU warnings, field range errors) are reported on `ctx` while
    /// encoding continues.
    fn encode_instruction(
        &self,
        instr: &Instruction<'_>,
        ctx: &mut AsmContext,
    ) -> EncodeResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tokenizer::{register_checker_none, tokenize_line};

    #[test]
    fn instruction_splits_operands_and_spans() {
        let tokens = tokenize_line("1,(2,3)", 4, register_checker_none()).unwrap();
        let instr = Instruction::new(
            "foo",
            Span::default(),
            Some(("W".to_string(), Span::default())),
            &tokens[..tokens.len() - 1],
        );
        assert_eq!(instr.mnemonic, "FOO");
        assert_eq!(instr.operands.len(), 2);
        assert_eq!(instr.size_char(), Some('W'));
        assert_eq!(instr.operand_span(1).col_start, 3);
        assert!(instr.expect_operands(2).is_ok());
        assert_eq!(
            instr.expect_operands(1).unwrap_err().message,
            "FOO takes one operand"
        );
    }
}
