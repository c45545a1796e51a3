// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Collapse intervals: which logical tensor dims fold into one grid dim.
//!
//! # Semantics
//!
//! An interval `(lo, hi)` is half-open over the tensor's logical dims, with
//! negative bounds counted from the end. For a rank-4 tensor:
//!
//! ```text
//! [(0, -1)]  ->  {0, 1, 2} {3}       (the default)
//! [(1, -1)]  ->  {0} {1, 2} {3}
//! ```
//!
//! Dims not covered by any interval pass through as their own group. Each
//! group becomes one result of the collapse map, linearized row-major.

use crate::{checked_product, to_i64, LinearizeError};
use affine_expr::{AffineExpr, AffineMap};
use layout_types::Shape;
use std::ops::Range;

/// A half-open range of logical dims merged into a single grid dim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "(isize, isize)", into = "(isize, isize)")]
pub struct CollapseInterval {
    pub lo: isize,
    pub hi: isize,
}

impl CollapseInterval {
    pub fn new(lo: isize, hi: isize) -> Self {
        Self { lo, hi }
    }

    /// Resolves negative bounds against `rank` and checks the range.
    pub fn resolve(&self, rank: usize) -> Result<Range<usize>, LinearizeError> {
        let invalid = |detail| LinearizeError::InvalidInterval {
            lo: self.lo,
            hi: self.hi,
            rank,
            detail,
        };
        let signed_rank = isize::try_from(rank).map_err(|_| invalid("rank too large"))?;
        let normalise = |v: isize| if v < 0 { v + signed_rank } else { v };
        let (lo, hi) = (normalise(self.lo), normalise(self.hi));
        if lo < 0 || hi > signed_rank {
            return Err(invalid("bound outside tensor rank"));
        }
        if lo >= hi {
            return Err(invalid("interval is empty"));
        }
        Ok(lo as usize..hi as usize)
    }
}

impl From<(isize, isize)> for CollapseInterval {
    fn from((lo, hi): (isize, isize)) -> Self {
        Self::new(lo, hi)
    }
}

impl From<CollapseInterval> for (isize, isize) {
    fn from(interval: CollapseInterval) -> Self {
        (interval.lo, interval.hi)
    }
}

/// An ordered list of [`CollapseInterval`]s.
///
/// The default, `[(0, -1)]`, folds every dim but the last into the grid's
/// row dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CollapseIntervals(Vec<CollapseInterval>);

impl CollapseIntervals {
    pub fn new(intervals: Vec<CollapseInterval>) -> Self {
        Self(intervals)
    }

    pub fn as_slice(&self) -> &[CollapseInterval] {
        &self.0
    }

    /// Splits `0..rank` into consecutive groups, one per collapsed dim.
    ///
    /// Intervals must resolve to ascending, non-overlapping ranges;
    /// anything else is reported as unsupported.
    pub fn groups(&self, rank: usize) -> Result<Vec<Range<usize>>, LinearizeError> {
        let mut resolved: Vec<Range<usize>> = Vec::with_capacity(self.0.len());
        for interval in &self.0 {
            let range = interval.resolve(rank)?;
            if let Some(prev) = resolved.last() {
                if range.start < prev.end {
                    return Err(LinearizeError::UnsupportedIntervals {
                        detail: format!(
                            "interval {:?} overlaps or precedes {:?}",
                            range, prev
                        ),
                    });
                }
            }
            resolved.push(range);
        }

        let mut groups = Vec::with_capacity(rank);
        let mut pending = resolved.into_iter().peekable();
        let mut d = 0;
        while d < rank {
            match pending.peek() {
                Some(r) if r.start == d => {
                    d = r.end;
                    groups.extend(pending.next());
                }
                _ => {
                    groups.push(d..d + 1);
                    d += 1;
                }
            }
        }
        Ok(groups)
    }

    /// Returns the tensor shape after collapsing.
    pub fn collapsed_shape(&self, shape: &Shape) -> Result<Shape, LinearizeError> {
        let dims = shape.dims();
        let collapsed = self
            .groups(shape.rank())?
            .into_iter()
            .map(|g| checked_product(dims[g].iter().copied()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Shape::new(collapsed)?)
    }

    /// Builds the map from logical tensor coords to collapsed coords.
    ///
    /// Each group `lo..hi` yields `sum(d_k * stride_k)` with row-major
    /// strides over `shape[lo..hi]`, e.g. for `2x3x64x128` with the
    /// default intervals: `(d0, d1, d2, d3) -> (d0 * 192 + d1 * 64 + d2, d3)`.
    pub fn linear_map(&self, shape: &Shape) -> Result<AffineMap, LinearizeError> {
        let dims = shape.dims();
        let mut results = Vec::new();
        for group in self.groups(shape.rank())? {
            let mut expr = AffineExpr::constant(0);
            for k in group.clone() {
                let stride = checked_product(dims[k + 1..group.end].iter().copied())?;
                expr = expr + AffineExpr::dim(k) * to_i64(stride)?;
            }
            results.push(expr);
        }
        Ok(AffineMap::new(shape.rank(), 0, results)?)
    }
}

impl Default for CollapseIntervals {
    fn default() -> Self {
        Self(vec![CollapseInterval::new(0, -1)])
    }
}

impl From<Vec<(isize, isize)>> for CollapseIntervals {
    fn from(pairs: Vec<(isize, isize)>) -> Self {
        Self(pairs.into_iter().map(CollapseInterval::from).collect())
    }
}
