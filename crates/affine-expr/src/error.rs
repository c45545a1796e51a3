// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for affine expression construction and evaluation.

/// Errors raised while building or evaluating affine expressions and maps.
///
/// Every variant is a caller contract violation: nothing here is retried
/// or recovered internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AffineError {
    /// `floordiv` and `%` require a strictly positive divisor.
    #[error("{op} requires a positive divisor, got {divisor}")]
    NonPositiveDivisor { op: &'static str, divisor: i64 },

    /// A result expression references a dimension the map does not declare.
    #[error("dimension d{dim} out of range for map with {num_dims} input dims")]
    DimOutOfRange { dim: usize, num_dims: usize },

    /// The number of supplied values does not match the number of dims.
    #[error("arity mismatch in {op}: expected {expected} operands, got {actual}")]
    ArityMismatch {
        op: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Evaluation left the range of `i64`.
    #[error("integer overflow while evaluating {expr}")]
    Overflow { expr: String },
}
