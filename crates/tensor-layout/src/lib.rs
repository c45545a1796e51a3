// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-layout
//!
//! Immutable layout descriptors for tensors distributed over a device grid.
//!
//! A [`LayoutDescriptor`] is built once from a shape, a grid and a
//! [`LayoutConfig`]-style set of defaults, and evolves only through pure
//! transforms:
//! - [`LayoutDescriptor::tilize`] switches the block element type to a tile.
//! - [`LayoutDescriptor::parallelize`] re-places the tensor on a new grid.
//!
//! On top of that sit [`LayoutDescriptor::project_onto`], which maps tensor
//! coords straight to `(device, row, col, offset)`, and
//! [`plan_data_movement`], which turns two layouts of one tensor into
//! per-core reads.
//!
//! # Example
//! ```
//! use layout_types::{DataType, Shape, TileType};
//! use tensor_layout::LayoutDescriptor;
//!
//! let layout = LayoutDescriptor::builder(
//!     Shape::new(vec![2, 3, 64, 128]).unwrap(),
//!     Shape::matrix(2, 4).unwrap(),
//! )
//! .build()
//! .unwrap();
//! let tiled = layout.tilize(TileType::new(32, 32, DataType::BfpBFloat8).unwrap()).unwrap();
//! assert_eq!(tiled.memref_shape().dims(), &[6, 1]);
//! ```

mod config;
mod descriptor;
mod error;
mod movement;

pub use config::{LayoutConfig, LayoutContext};
pub use descriptor::{LayoutBuilder, LayoutDescriptor};
pub use error::LayoutError;
pub use grid_linearize::ErrorKind;
pub use movement::{plan_data_movement, CoreCoord, CoreReads, DataMovementPlan, Read};

pub(crate) fn to_i64(value: usize) -> Result<i64, LayoutError> {
    i64::try_from(value).map_err(|_| grid_linearize::LinearizeError::ExtentOverflow { value }.into())
}
