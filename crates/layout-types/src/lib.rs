// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # layout-types
//!
//! Value types shared by the layout engine and its consumers.
//!
//! This crate provides:
//! - [`Shape`] — a validated, non-empty list of positive extents, used both
//!   for tensor shapes and for device grids.
//! - [`DataType`] — element data types, including block-float formats that
//!   only exist inside tiles.
//! - [`TileType`] — a fixed-size 2-D block used as the element type of a
//!   tiled layout.
//! - [`ElementType`] — either a scalar [`DataType`] or a [`TileType`].
//! - [`MemorySpace`] and [`OobVal`] — where a layout lives and what padded
//!   elements read as.
//!
//! Every type is an immutable value with structural equality and a
//! canonical textual form.

mod dtype;
mod element;
mod error;
mod memory;
mod shape;
mod tile;

pub use dtype::DataType;
pub use element::ElementType;
pub use error::TypeError;
pub use memory::{MemorySpace, OobVal};
pub use shape::Shape;
pub use tile::TileType;
