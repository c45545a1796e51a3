// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for layout value types.

/// Errors raised while constructing layout value types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// A shape was empty or contained a zero extent.
    #[error("invalid shape {dims:?}: {detail}")]
    InvalidShape { dims: Vec<usize>, detail: &'static str },

    /// A tile was given a zero height or width.
    #[error("invalid tile {height}x{width}: tile extents must be positive")]
    InvalidTile { height: usize, width: usize },
}
