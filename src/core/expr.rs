// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Expression trees with eager constant folding.
//!
//! Every node caches whether it is fully constant. Constructors fold as soon
//! as all inputs are known, so a tree that reaches an encoder is either a
//! single [`ExprKind::Constant`] or still references something only known
//! after the source has been read completely (forward labels, section bases
//! of sections without a fixed origin). Such trees are handed to the patch
//! queue and resolved once, after layout.
//!
//! Arithmetic is 32-bit two's complement with wrap-around; `>>` is a logical
//! shift.

use thiserror::Error;

use crate::core::tokenizer::Span;

/// Index of a section in the section table.
pub type SectionId = usize;

/// Maximum nesting when following symbols defined in terms of other symbols.
pub const MAX_RESOLVE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    BitNot,
    LogicNot,
    /// Index of the single set bit of a power of two.
    BitIndex,
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogicAnd,
    LogicOr,
}

/// Error produced while folding or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Undefined symbol: {0}")]
    Undefined(String),
    #[error("Division by zero")]
    DivideByZero,
    #[error("Value {value} out of range ({low}..{high})")]
    OutOfRange { value: i64, low: i64, high: i64 },
    #[error("Value {value} cannot be encoded in this field")]
    Reserved { value: i64 },
    #[error("Value ${0:X} is not a power of two")]
    NotPowerOfTwo(i32),
    #[error("Symbol definition is circular: {0}")]
    Circular(String),
}

/// Lookup used to resolve deferred leaves.
pub trait SymbolLookup {
    /// Value of a symbol, if it is known and constant.
    fn symbol_value(&self, name: &str) -> Option<i32>;

    /// Final base address of a section, if placed.
    fn section_base(&self, section: SectionId) -> Option<u32>;
}

/// Lookup that knows nothing; folding only.
pub struct NoSymbols;

impl SymbolLookup for NoSymbols {
    fn symbol_value(&self, _name: &str) -> Option<i32> {
        None
    }

    fn section_base(&self, _section: SectionId) -> Option<u32> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    Constant(i32),
    Symbol(String),
    /// `inner - base(section)`.
    PcRelative {
        section: SectionId,
        inner: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        inner: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Passes `inner` through, failing when its value leaves `low..=high`.
    Checked {
        low: i64,
        high: i64,
        inner: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub constant: bool,
    pub span: Span,
}

impl Expr {
    pub fn constant(value: i32, span: Span) -> Self {
        Self {
            kind: ExprKind::Constant(value),
            constant: true,
            span,
        }
    }

    pub fn symbol(name: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ExprKind::Symbol(name.into()),
            constant: false,
            span,
        }
    }

    /// Build a unary node, folding when the operand is constant.
    pub fn unary(op: UnaryOp, inner: Expr, span: Span) -> Result<Self, EvalError> {
        if let ExprKind::Constant(value) = inner.kind {
            return Ok(Self::constant(apply_unary(op, value)?, span));
        }
        Ok(Self {
            kind: ExprKind::Unary {
                op,
                inner: Box::new(inner),
            },
            constant: false,
            span,
        })
    }

    /// Build a binary node, folding when both operands are constant.
    ///
    /// Division or modulo by a constant zero fails even when the left side is
    /// not yet known.
    pub fn binary(op: BinaryOp, left: Expr, right: Expr, span: Span) -> Result<Self, EvalError> {
        if matches!(op, BinaryOp::Div | BinaryOp::Mod) && right.kind == ExprKind::Constant(0) {
            return Err(EvalError::DivideByZero);
        }
        if let (ExprKind::Constant(l), ExprKind::Constant(r)) = (&left.kind, &right.kind) {
            return Ok(Self::constant(apply_binary(op, *l, *r)?, span));
        }
        Ok(Self {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            constant: false,
            span,
        })
    }

    /// Address of `offset` within a section whose base is not known yet.
    pub fn section_address(section: SectionId, offset: u32, span: Span) -> Self {
        // base = 0 - (0 - base)
        let relative = Self {
            kind: ExprKind::PcRelative {
                section,
                inner: Box::new(Self::constant(0, span)),
            },
            constant: false,
            span,
        };
        let base = Self {
            kind: ExprKind::Unary {
                op: UnaryOp::Negate,
                inner: Box::new(relative),
            },
            constant: false,
            span,
        };
        Self {
            kind: ExprKind::Binary {
                op: BinaryOp::Add,
                left: Box::new(base),
                right: Box::new(Self::constant(offset as i32, span)),
            },
            constant: false,
            span,
        }
    }

    /// Displacement from the reference point `offset + adjustment` of
    /// `section` to the address computed by `inner`.
    ///
    /// With a fixed origin this folds to `inner - (origin + offset + adjustment)`.
    /// Otherwise the section base is subtracted when the patch is replayed.
    pub fn pc_relative(
        inner: Expr,
        section: SectionId,
        origin: Option<u32>,
        offset: u32,
        adjustment: i32,
    ) -> Result<Self, EvalError> {
        let span = inner.span;
        let anchor = (offset as i32).wrapping_add(adjustment);
        match origin {
            Some(origin) => {
                let reference = (origin as i32).wrapping_add(anchor);
                Self::binary(BinaryOp::Sub, inner, Self::constant(reference, span), span)
            }
            None => {
                let relative = Self {
                    kind: ExprKind::PcRelative {
                        section,
                        inner: Box::new(inner),
                    },
                    constant: false,
                    span,
                };
                Self::binary(
                    BinaryOp::Sub,
                    relative,
                    Self::constant(anchor, span),
                    span,
                )
            }
        }
    }

    /// Constant value, if folded.
    pub fn value(&self) -> Option<i32> {
        match self.kind {
            ExprKind::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Re-fold the whole tree. Idempotent.
    pub fn fold(self) -> Result<Self, EvalError> {
        self.resolve(&NoSymbols)
    }

    /// Substitute every leaf `lookup` knows and fold.
    pub fn resolve(self, lookup: &dyn SymbolLookup) -> Result<Self, EvalError> {
        let span = self.span;
        match self.kind {
            ExprKind::Constant(_) => Ok(self),
            ExprKind::Symbol(ref name) => match lookup.symbol_value(name) {
                Some(value) => Ok(Self::constant(value, span)),
                None => Ok(self),
            },
            ExprKind::PcRelative { section, inner } => {
                let inner = inner.resolve(lookup)?;
                match (inner.value(), lookup.section_base(section)) {
                    (Some(value), Some(base)) => {
                        Ok(Self::constant(value.wrapping_sub(base as i32), span))
                    }
                    _ => Ok(Self {
                        kind: ExprKind::PcRelative {
                            section,
                            inner: Box::new(inner),
                        },
                        constant: false,
                        span,
                    }),
                }
            }
            ExprKind::Unary { op, inner } => Self::unary(op, inner.resolve(lookup)?, span),
            ExprKind::Binary { op, left, right } => {
                Self::binary(op, left.resolve(lookup)?, right.resolve(lookup)?, span)
            }
            ExprKind::Checked { low, high, inner } => {
                inner.resolve(lookup)?.check_range(low, high)
            }
        }
    }

    /// Assert that the final value lies in `low..=high`.
    ///
    /// A constant is checked immediately; anything else is wrapped in a
    /// [`ExprKind::Checked`] node that fails when it folds.
    pub fn check_range(self, low: i64, high: i64) -> Result<Self, EvalError> {
        if let Some(value) = self.value() {
            let wide = value as i64;
            if wide < low || wide > high {
                return Err(EvalError::OutOfRange {
                    value: wide,
                    low,
                    high,
                });
            }
            return Ok(self);
        }
        let span = self.span;
        Ok(Self {
            kind: ExprKind::Checked {
                low,
                high,
                inner: Box::new(self),
            },
            constant: false,
            span,
        })
    }

    /// Resolve and require a constant result.
    pub fn eval(&self, lookup: &dyn SymbolLookup) -> Result<i32, EvalError> {
        let resolved = self.clone().resolve(lookup)?;
        match resolved.value() {
            Some(value) => Ok(value),
            None => Err(EvalError::Undefined(
                resolved
                    .first_unresolved()
                    .unwrap_or("<section base>")
                    .to_string(),
            )),
        }
    }

    /// Every symbol leaf, left to right.
    pub fn symbol_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_symbols(&mut names);
        names
    }

    fn collect_symbols<'a>(&'a self, names: &mut Vec<&'a str>) {
        match &self.kind {
            ExprKind::Constant(_) => {}
            ExprKind::Symbol(name) => names.push(name),
            ExprKind::PcRelative { inner, .. }
            | ExprKind::Unary { inner, .. }
            | ExprKind::Checked { inner, .. } => inner.collect_symbols(names),
            ExprKind::Binary { left, right, .. } => {
                left.collect_symbols(names);
                right.collect_symbols(names);
            }
        }
    }

    /// Name of the first symbol leaf still present in the tree.
    pub fn first_unresolved(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Constant(_) => None,
            ExprKind::Symbol(name) => Some(name.as_str()),
            ExprKind::PcRelative { inner, .. }
            | ExprKind::Unary { inner, .. }
            | ExprKind::Checked { inner, .. } => inner.first_unresolved(),
            ExprKind::Binary { left, right, .. } => left
                .first_unresolved()
                .or_else(|| right.first_unresolved()),
        }
    }
}

/// Apply a unary operator to a constant.
pub fn apply_unary(op: UnaryOp, value: i32) -> Result<i32, EvalError> {
    Ok(match op {
        UnaryOp::Negate => value.wrapping_neg(),
        UnaryOp::BitNot => !value,
        UnaryOp::LogicNot => (value == 0) as i32,
        UnaryOp::BitIndex => {
            let bits = value as u32;
            if !bits.is_power_of_two() {
                return Err(EvalError::NotPowerOfTwo(value));
            }
            bits.trailing_zeros() as i32
        }
        UnaryOp::Low => value & 0xff,
        UnaryOp::High => (value >> 8) & 0xff,
    })
}

/// Apply a binary operator to two constants.
pub fn apply_binary(op: BinaryOp, l: i32, r: i32) -> Result<i32, EvalError> {
    Ok(match op {
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Sub => l.wrapping_sub(r),
        BinaryOp::Mul => l.wrapping_mul(r),
        BinaryOp::Div => {
            if r == 0 {
                return Err(EvalError::DivideByZero);
            }
            l.wrapping_div(r)
        }
        BinaryOp::Mod => {
            if r == 0 {
                return Err(EvalError::DivideByZero);
            }
            l.wrapping_rem(r)
        }
        BinaryOp::And => l & r,
        BinaryOp::Or => l | r,
        BinaryOp::Xor => l ^ r,
        BinaryOp::Shl => {
            if (0..32).contains(&r) {
                l.wrapping_shl(r as u32)
            } else {
                0
            }
        }
        BinaryOp::Shr => {
            if (0..32).contains(&r) {
                ((l as u32) >> r) as i32
            } else {
                0
            }
        }
        BinaryOp::Eq => (l == r) as i32,
        BinaryOp::Ne => (l != r) as i32,
        BinaryOp::Lt => (l < r) as i32,
        BinaryOp::Le => (l <= r) as i32,
        BinaryOp::Gt => (l > r) as i32,
        BinaryOp::Ge => (l >= r) as i32,
        BinaryOp::LogicAnd => ((l != 0) && (r != 0)) as i32,
        BinaryOp::LogicOr => ((l != 0) || (r != 0)) as i32,
    })
}

/// Returns true if `value` fits a signed field of `bits` bits.
pub fn fits_signed(value: i64, bits: u32) -> bool {
    let min = -(1i64 << (bits - 1));
    let max = (1i64 << (bits - 1)) - 1;
    (min..=max).contains(&value)
}
