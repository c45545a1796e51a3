// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # affine-expr
//!
//! A small affine algebra for describing how tensor coordinates map onto
//! device addresses.
//!
//! This crate provides:
//! - [`AffineExpr`] — an immutable expression tree over dimension
//!   references and integer constants, with `+`, scaling by a constant,
//!   `floordiv` and `%`.
//! - [`AffineMap`] — an ordered list of result expressions over a fixed
//!   number of input dimensions, printed as `(d0, d1) -> (d0 * 4 + d1)`.
//!
//! Expressions are plain values: they are built bottom-up through smart
//! constructors, compared structurally, and can be shared freely across
//! threads.
//!
//! # Example
//! ```
//! use affine_expr::{AffineExpr, AffineMap};
//!
//! let d0 = AffineExpr::dim(0);
//! let d1 = AffineExpr::dim(1);
//! let map = AffineMap::new(2, 0, vec![d0 * 64 + d1.clone(), d1.modulo(8).unwrap()]).unwrap();
//! assert_eq!(map.to_string(), "(d0, d1) -> (d0 * 64 + d1, d1 % 8)");
//! assert_eq!(map.eval(&[2, 13]).unwrap(), vec![141, 5]);
//! ```

mod error;
mod expr;
mod map;

pub use error::AffineError;
pub use expr::AffineExpr;
pub use map::AffineMap;
