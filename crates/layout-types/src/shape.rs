// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shape descriptors for tensors and device grids.

use crate::TypeError;
use std::fmt;

/// An ordered list of positive extents.
///
/// The same type describes a tensor's logical shape and a device grid; the
/// role is decided by the caller. Shapes are immutable once created and are
/// guaranteed to have rank >= 1 with every extent > 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given extents.
    ///
    /// # Examples
    /// ```
    /// use layout_types::Shape;
    /// let s = Shape::new(vec![2, 3, 4]).unwrap();
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// assert!(Shape::new(vec![2, 0]).is_err());
    /// ```
    pub fn new(dims: Vec<usize>) -> Result<Self, TypeError> {
        if dims.is_empty() {
            return Err(TypeError::InvalidShape {
                dims,
                detail: "rank must be at least 1",
            });
        }
        if dims.iter().any(|&d| d == 0) {
            return Err(TypeError::InvalidShape {
                dims,
                detail: "every extent must be positive",
            });
        }
        Ok(Self { dims })
    }

    /// Creates a 2-D shape.
    pub fn matrix(rows: usize, cols: usize) -> Result<Self, TypeError> {
        Self::new(vec![rows, cols])
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the extents as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the extent of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Returns the last two extents, or `None` for rank-1 shapes.
    pub fn last_two(&self) -> Option<(usize, usize)> {
        match self.dims.as_slice() {
            [.., a, b] => Some((*a, *b)),
            _ => None,
        }
    }

    /// Computes row-major (C-order) strides for this shape.
    ///
    /// The stride for dimension `i` is the number of elements to skip
    /// in the flat buffer to advance one step along that dimension.
    pub fn strides(&self) -> Vec<usize> {
        let rank = self.dims.len();
        let mut strides = vec![0usize; rank];
        strides[rank - 1] = 1;
        for i in (0..rank - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Returns the coordinate of the `index`-th element in row-major order.
    ///
    /// `index` must be below [`num_elements`](Self::num_elements); larger
    /// values wrap around the outermost dimension.
    pub fn coord_of(&self, index: usize) -> Vec<usize> {
        self.strides()
            .iter()
            .zip(&self.dims)
            .map(|(&stride, &extent)| (index / stride) % extent)
            .collect()
    }
}

/// Prints the canonical `x`-joined form, e.g. `2x3x64x128`.
impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, "x")?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<usize>> for Shape {
    type Error = TypeError;

    fn try_from(dims: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(dims)
    }
}

impl TryFrom<&[usize]> for Shape {
    type Error = TypeError;

    fn try_from(dims: &[usize]) -> Result<Self, Self::Error> {
        Self::new(dims.to_vec())
    }
}

impl From<Shape> for Vec<usize> {
    fn from(shape: Shape) -> Self {
        shape.dims
    }
}
