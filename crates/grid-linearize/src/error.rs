// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for grid linearization.

use affine_expr::AffineError;
use layout_types::TypeError;

/// Coarse classification of a failure, for callers that only need to know
/// whether an input was wrong or merely not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input violates a documented contract.
    InvalidArgument,
    /// The input is well-formed but outside what the engine implements.
    Unsupported,
}

/// Errors that can occur while deriving collapse or device maps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinearizeError {
    /// Device grids need at least a row and a column dimension.
    #[error("grid must have rank >= 2, got rank {rank}")]
    GridRankTooSmall { rank: usize },

    /// The physical grid has a zero extent.
    #[error("invalid physical grid {rows}x{cols}: extents must be positive")]
    InvalidPhysicalGrid { rows: usize, cols: usize },

    /// A collapse interval is empty or falls outside the tensor rank.
    #[error("collapse interval ({lo}, {hi}) is invalid for rank {rank}: {detail}")]
    InvalidInterval {
        lo: isize,
        hi: isize,
        rank: usize,
        detail: &'static str,
    },

    /// The collapse intervals overlap or are not in ascending order.
    #[error("unsupported collapse intervals: {detail}")]
    UnsupportedIntervals { detail: String },

    /// After collapsing, the tensor rank differs from the grid rank.
    #[error("collapsed tensor rank {collapsed_rank} does not match grid rank {grid_rank}")]
    RankMismatch {
        collapsed_rank: usize,
        grid_rank: usize,
    },

    /// An extent, stride or product of extents overflows `usize` or does
    /// not fit in an affine constant.
    #[error("extent {value} overflows the addressable range")]
    ExtentOverflow { value: usize },

    #[error(transparent)]
    Affine(#[from] AffineError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl LinearizeError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LinearizeError::UnsupportedIntervals { .. } => ErrorKind::Unsupported,
            _ => ErrorKind::InvalidArgument,
        }
    }
}
