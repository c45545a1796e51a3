// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Affine expression trees.
//!
//! Expressions are immutable and built through smart constructors that fold
//! a handful of identities (`x * 1`, `x + 0`, `x floordiv 1`, `x % 1` and
//! constant arithmetic). Nothing beyond that is simplified: the structure a
//! caller builds is the structure that gets printed.

use crate::AffineError;
use std::fmt;
use std::ops::{Add, Mul};

/// A node in an affine expression tree.
///
/// The right-hand side of [`Scale`](AffineExpr::Scale),
/// [`FloorDiv`](AffineExpr::FloorDiv) and [`Mod`](AffineExpr::Mod) is always
/// an integer constant; products of two expressions are not representable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AffineExpr {
    /// An integer literal.
    Constant(i64),
    /// A reference to input dimension `d{index}`.
    Dim(usize),
    /// `lhs + rhs`.
    Sum(Box<AffineExpr>, Box<AffineExpr>),
    /// `expr * factor`.
    Scale(Box<AffineExpr>, i64),
    /// `expr floordiv divisor`, with `divisor > 0`.
    FloorDiv(Box<AffineExpr>, i64),
    /// `expr % divisor`, with `divisor > 0`. Always non-negative.
    Mod(Box<AffineExpr>, i64),
}

/// How tightly the surrounding operator binds; compound operands of a
/// strong operator are parenthesised.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Binding {
    Weak,
    Strong,
}

impl AffineExpr {
    /// Creates a constant expression.
    pub fn constant(value: i64) -> Self {
        AffineExpr::Constant(value)
    }

    /// Creates a reference to input dimension `index`.
    pub fn dim(index: usize) -> Self {
        AffineExpr::Dim(index)
    }

    /// Returns `self + rhs`.
    pub fn add(self, rhs: AffineExpr) -> Self {
        match (&self, &rhs) {
            (AffineExpr::Constant(a), AffineExpr::Constant(b)) => match a.checked_add(*b) {
                Some(v) => AffineExpr::Constant(v),
                None => AffineExpr::Sum(Box::new(self), Box::new(rhs)),
            },
            (_, AffineExpr::Constant(0)) => self,
            (AffineExpr::Constant(0), _) => rhs,
            _ => AffineExpr::Sum(Box::new(self), Box::new(rhs)),
        }
    }

    /// Returns `self * factor`.
    pub fn scale(self, factor: i64) -> Self {
        match (&self, factor) {
            (_, 0) => AffineExpr::Constant(0),
            (_, 1) => self,
            (AffineExpr::Constant(a), f) => match a.checked_mul(f) {
                Some(v) => AffineExpr::Constant(v),
                None => AffineExpr::Scale(Box::new(self), factor),
            },
            _ => AffineExpr::Scale(Box::new(self), factor),
        }
    }

    /// Returns `self floordiv divisor`.
    ///
    /// Fails with [`AffineError::NonPositiveDivisor`] when `divisor <= 0`.
    pub fn floor_div(self, divisor: i64) -> Result<Self, AffineError> {
        if divisor <= 0 {
            return Err(AffineError::NonPositiveDivisor {
                op: "floordiv",
                divisor,
            });
        }
        Ok(match self {
            _ if divisor == 1 => self,
            AffineExpr::Constant(a) => AffineExpr::Constant(a.div_euclid(divisor)),
            other => AffineExpr::FloorDiv(Box::new(other), divisor),
        })
    }

    /// Returns `self % divisor`.
    ///
    /// Fails with [`AffineError::NonPositiveDivisor`] when `divisor <= 0`.
    pub fn modulo(self, divisor: i64) -> Result<Self, AffineError> {
        if divisor <= 0 {
            return Err(AffineError::NonPositiveDivisor { op: "mod", divisor });
        }
        Ok(match self {
            _ if divisor == 1 => AffineExpr::Constant(0),
            AffineExpr::Constant(a) => AffineExpr::Constant(a.rem_euclid(divisor)),
            other => AffineExpr::Mod(Box::new(other), divisor),
        })
    }

    /// Returns the value if this is a constant.
    pub fn as_constant(&self) -> Option<i64> {
        match self {
            AffineExpr::Constant(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the highest dimension index referenced, if any.
    pub fn max_dim(&self) -> Option<usize> {
        match self {
            AffineExpr::Constant(_) => None,
            AffineExpr::Dim(i) => Some(*i),
            AffineExpr::Sum(lhs, rhs) => match (lhs.max_dim(), rhs.max_dim()) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            },
            AffineExpr::Scale(e, _) | AffineExpr::FloorDiv(e, _) | AffineExpr::Mod(e, _) => {
                e.max_dim()
            }
        }
    }

    /// Substitutes `replacements[i]` for every `d{i}`.
    ///
    /// The result is rebuilt through the smart constructors, so replacing
    /// every dimension with a constant yields a single constant.
    pub fn replace_dims(&self, replacements: &[AffineExpr]) -> Result<Self, AffineError> {
        match self {
            AffineExpr::Constant(v) => Ok(AffineExpr::Constant(*v)),
            AffineExpr::Dim(i) => {
                replacements
                    .get(*i)
                    .cloned()
                    .ok_or(AffineError::DimOutOfRange {
                        dim: *i,
                        num_dims: replacements.len(),
                    })
            }
            AffineExpr::Sum(lhs, rhs) => Ok(lhs
                .replace_dims(replacements)?
                .add(rhs.replace_dims(replacements)?)),
            AffineExpr::Scale(e, f) => Ok(e.replace_dims(replacements)?.scale(*f)),
            AffineExpr::FloorDiv(e, d) => e.replace_dims(replacements)?.floor_div(*d),
            AffineExpr::Mod(e, d) => e.replace_dims(replacements)?.modulo(*d),
        }
    }

    /// Evaluates the expression with `dims[i]` bound to `d{i}`.
    pub fn eval(&self, dims: &[i64]) -> Result<i64, AffineError> {
        let overflow = || AffineError::Overflow {
            expr: self.to_string(),
        };
        match self {
            AffineExpr::Constant(v) => Ok(*v),
            AffineExpr::Dim(i) => dims.get(*i).copied().ok_or(AffineError::DimOutOfRange {
                dim: *i,
                num_dims: dims.len(),
            }),
            AffineExpr::Sum(lhs, rhs) => lhs
                .eval(dims)?
                .checked_add(rhs.eval(dims)?)
                .ok_or_else(overflow),
            AffineExpr::Scale(e, f) => e.eval(dims)?.checked_mul(*f).ok_or_else(overflow),
            AffineExpr::FloorDiv(e, d) => Ok(e.eval(dims)?.div_euclid(*d)),
            AffineExpr::Mod(e, d) => Ok(e.eval(dims)?.rem_euclid(*d)),
        }
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, binding: Binding) -> fmt::Result {
        let (inner, op, rhs) = match self {
            AffineExpr::Constant(v) => return write!(f, "{v}"),
            AffineExpr::Dim(i) => return write!(f, "d{i}"),
            AffineExpr::Sum(lhs, rhs) => {
                if binding == Binding::Strong {
                    write!(f, "(")?;
                }
                lhs.write(f, Binding::Weak)?;
                write!(f, " + ")?;
                rhs.write(f, Binding::Weak)?;
                if binding == Binding::Strong {
                    write!(f, ")")?;
                }
                return Ok(());
            }
            AffineExpr::Scale(e, c) => (e, "*", c),
            AffineExpr::FloorDiv(e, c) => (e, "floordiv", c),
            AffineExpr::Mod(e, c) => (e, "%", c),
        };
        if binding == Binding::Strong {
            write!(f, "(")?;
        }
        inner.write(f, Binding::Strong)?;
        write!(f, " {op} {rhs}")?;
        if binding == Binding::Strong {
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for AffineExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, Binding::Weak)
    }
}

impl Add for AffineExpr {
    type Output = AffineExpr;

    fn add(self, rhs: AffineExpr) -> AffineExpr {
        AffineExpr::add(self, rhs)
    }
}

impl Mul<i64> for AffineExpr {
    type Output = AffineExpr;

    fn mul(self, factor: i64) -> AffineExpr {
        self.scale(factor)
    }
}

impl From<i64> for AffineExpr {
    fn from(value: i64) -> Self {
        AffineExpr::Constant(value)
    }
}
