// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for layout descriptors and their transforms.

use affine_expr::AffineError;
use grid_linearize::{ErrorKind, LinearizeError};
use layout_types::{DataType, TypeError};

/// Errors that can occur while building, transforming or relaying out
/// layout descriptors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// The per-core block does not split into whole tiles.
    #[error(
        "block {rows}x{cols} is not divisible into {tile_height}x{tile_width} tiles"
    )]
    UnevenTile {
        rows: usize,
        cols: usize,
        tile_height: usize,
        tile_width: usize,
    },

    /// A scalar block element type differs from the tensor's.
    #[error("block element type {element} does not match tensor element type {scalar}")]
    ElementTypeMismatch { scalar: DataType, element: DataType },

    /// Two layouts cannot be related by a data movement.
    #[error("incompatible layouts: {detail}")]
    IncompatibleLayouts { detail: String },

    /// The requested data movement is well-formed but not implemented.
    #[error("unsupported data movement: {detail}")]
    UnsupportedMovement { detail: String },

    /// Configuration could not be read, parsed or validated.
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Linearize(#[from] LinearizeError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Affine(#[from] AffineError),
}

impl LayoutError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LayoutError::Linearize(e) => e.kind(),
            LayoutError::UnsupportedMovement { .. } => ErrorKind::Unsupported,
            _ => ErrorKind::InvalidArgument,
        }
    }
}
