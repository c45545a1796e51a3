// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Affine maps: ordered result expressions over a fixed set of input dims.

use crate::{AffineError, AffineExpr};
use std::fmt;

/// A multi-result affine function `(d0, .., dN-1) -> (r0, .., rM-1)`.
///
/// Maps are validated on construction and never mutated afterwards, so a
/// map that exists always satisfies the invariant that every
/// [`AffineExpr::Dim`] in its results is below [`num_dims`](Self::num_dims).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AffineMap {
    num_dims: usize,
    num_symbols: usize,
    results: Vec<AffineExpr>,
}

impl AffineMap {
    /// Creates a map over `num_dims` inputs.
    ///
    /// Fails with [`AffineError::DimOutOfRange`] if any result references a
    /// dimension `>= num_dims`.
    pub fn new(
        num_dims: usize,
        num_symbols: usize,
        results: Vec<AffineExpr>,
    ) -> Result<Self, AffineError> {
        for expr in &results {
            if let Some(dim) = expr.max_dim() {
                if dim >= num_dims {
                    return Err(AffineError::DimOutOfRange { dim, num_dims });
                }
            }
        }
        Ok(Self {
            num_dims,
            num_symbols,
            results,
        })
    }

    /// Creates the identity map `(d0, .., dN-1) -> (d0, .., dN-1)`.
    pub fn identity(num_dims: usize) -> Self {
        Self {
            num_dims,
            num_symbols: 0,
            results: (0..num_dims).map(AffineExpr::dim).collect(),
        }
    }

    /// Number of input dimensions.
    pub fn num_dims(&self) -> usize {
        self.num_dims
    }

    /// Number of symbols (always printed, never referenced by results).
    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    /// Number of result expressions.
    pub fn num_results(&self) -> usize {
        self.results.len()
    }

    /// Returns the result expressions in order.
    pub fn results(&self) -> &[AffineExpr] {
        &self.results
    }

    /// Returns result `index`, or `None` if out of bounds.
    pub fn result(&self, index: usize) -> Option<&AffineExpr> {
        self.results.get(index)
    }

    /// Evaluates every result at the point `dims`.
    pub fn eval(&self, dims: &[i64]) -> Result<Vec<i64>, AffineError> {
        if dims.len() != self.num_dims {
            return Err(AffineError::ArityMismatch {
                op: "eval",
                expected: self.num_dims,
                actual: dims.len(),
            });
        }
        self.results.iter().map(|e| e.eval(dims)).collect()
    }

    /// Returns `self ∘ inner`, i.e. `x -> self(inner(x))`.
    ///
    /// The inner map's results feed this map's dims one-to-one, so
    /// `inner.num_results()` must equal `self.num_dims()`.
    pub fn compose(&self, inner: &AffineMap) -> Result<AffineMap, AffineError> {
        if inner.num_results() != self.num_dims {
            return Err(AffineError::ArityMismatch {
                op: "compose",
                expected: self.num_dims,
                actual: inner.num_results(),
            });
        }
        let results = self
            .results
            .iter()
            .map(|e| e.replace_dims(inner.results()))
            .collect::<Result<Vec<_>, _>>()?;
        AffineMap::new(inner.num_dims, inner.num_symbols, results)
    }
}

impl fmt::Display for AffineMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for i in 0..self.num_dims {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "d{i}")?;
        }
        write!(f, ")")?;
        if self.num_symbols > 0 {
            write!(f, "[")?;
            for i in 0..self.num_symbols {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "s{i}")?;
            }
            write!(f, "]")?;
        }
        write!(f, " -> (")?;
        for (i, r) in self.results.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{r}")?;
        }
        write!(f, ")")
    }
}
