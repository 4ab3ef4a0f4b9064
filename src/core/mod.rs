// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CPU-agnostic assembler core.
//!
//! This module provides the infrastructure every instruction-set family
//! plugs into.
//!
//! # Components
//!
//! - [`cpu`] - CPU and family identifiers, the encoder error type
//! - [`text_utils`] - Identifier and comment helpers
//! - [`tokenizer`] - Token scanning with configurable register detection
//! - [`expr`] - Expression trees with eager folding
//! - [`parser`] - Token cursor, expression parser, line splitter
//! - [`symbol_table`] - Symbol management
//! - [`section`] - Output sections (the byte sink)
//! - [`patch`] - Field shapes and the deferred patch queue
//! - [`context`] - Per-unit assembler state shared with encoders
//! - [`family`] - Family handler trait
//! - [`registry`] - CPU and family lookup
//! - [`imagestore`] - Binary and hex output generation
//! - [`assembler`] - Diagnostics and listing output

pub mod assembler;
pub mod context;
pub mod cpu;
pub mod expr;
pub mod family;
pub mod imagestore;
pub mod parser;
pub mod patch;
pub mod registry;
pub mod section;
pub mod symbol_table;
pub mod text_utils;
pub mod tokenizer;

// Re-exports for convenience
pub use context::{AsmContext, AsmOptions, Emission, PcAnchor};
pub use cpu::{CpuFamily, CpuType, EncodeError};
pub use expr::{EvalError, Expr, SymbolLookup};
pub use family::{EncodeResult, FamilyHandler, Instruction};
pub use parser::ParseError;
pub use patch::{Endian, Field};
pub use symbol_table::SymbolTable;
pub use tokenizer::{RegisterChecker, Span, Token, TokenKind, TokenizeError, Tokenizer};
