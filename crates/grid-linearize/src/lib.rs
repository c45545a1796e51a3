// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # grid-linearize
//!
//! Derives the affine maps that place a tensor on a multi-dimensional
//! device grid.
//!
//! Two maps come out of the engine:
//!
//! | Map | Domain | Results |
//! |---|---|---|
//! | collapse map | logical tensor coords | one coord per grid dim |
//! | device map | grid coords | `(device, row, col)` |
//!
//! The collapse map folds groups of logical dims (chosen by
//! [`CollapseIntervals`]) into the grid's rank with row-major strides. The
//! device map pads the grid to whole [`PhysicalGrid`] meshes and linearizes
//! the mesh index in mixed radix, so the same expression describes any
//! number of cores.
//!
//! # Example
//! ```
//! use grid_linearize::{CollapseIntervals, GridLinearizer};
//! use layout_types::Shape;
//!
//! let shape = Shape::new(vec![2, 3, 64, 128]).unwrap();
//! let grid = Shape::new(vec![2, 4]).unwrap();
//! let l = GridLinearizer::default()
//!     .linearize(&shape, &grid, &CollapseIntervals::default())
//!     .unwrap();
//! assert_eq!(l.linear.to_string(), "(d0, d1, d2, d3) -> (d0 * 192 + d1 * 64 + d2, d3)");
//! assert_eq!(l.block_shape.dims(), &[192, 32]);
//! ```

mod collapse;
mod engine;
mod error;
mod physical;

pub use collapse::{CollapseInterval, CollapseIntervals};
pub use engine::{block_shape, GridLinearizer, Linearization};
pub use error::{ErrorKind, LinearizeError};
pub use physical::{ceil_div, PhysicalGrid};

/// Multiplies extents, failing with the factor that overflows.
pub(crate) fn checked_product(
    values: impl IntoIterator<Item = usize>,
) -> Result<usize, LinearizeError> {
    values.into_iter().try_fold(1usize, |acc, v| {
        acc.checked_mul(v)
            .ok_or(LinearizeError::ExtentOverflow { value: v })
    })
}

/// Converts an extent to an affine constant.
pub(crate) fn to_i64(value: usize) -> Result<i64, LinearizeError> {
    i64::try_from(value).map_err(|_| LinearizeError::ExtentOverflow { value })
}
