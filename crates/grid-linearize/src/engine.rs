// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The grid linearization engine.
//!
//! Given a logical grid and the physical core mesh, the engine derives the
//! device map `(g0, .., gN-1) -> (device, row, col)`:
//!
//! ```text
//! mesh   = grid[..N-2] ++ [ceil(grid[N-2] / rows), ceil(grid[N-1] / cols)]
//! device = mixed-radix index over mesh, most significant first, where the
//!          trailing two digits are g(N-2) floordiv rows and g(N-1) floordiv cols
//! row    = g(N-2) % rows      (bare g(N-2) when mesh[N-2] == 1)
//! col    = g(N-1) % cols      (bare g(N-1) when mesh[N-1] == 1)
//! ```
//!
//! When the padded grid addresses a single core the device index is the
//! constant `0`. The map always has exactly three results.

use crate::{to_i64, CollapseIntervals, LinearizeError, PhysicalGrid};
use affine_expr::{AffineExpr, AffineMap};
use layout_types::Shape;

/// Everything derived from placing one tensor shape on one grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Linearization {
    /// Logical tensor coords -> collapsed coords.
    pub linear: AffineMap,
    /// Tensor shape after collapsing; same rank as the grid.
    pub collapsed_shape: Shape,
    /// Per-core block in elements: `ceil(collapsed[i] / grid[i])`.
    pub block_shape: Shape,
    /// Grid coords -> `(device, row, col)`.
    pub device_map: AffineMap,
}

/// Derives collapse and device maps against a fixed physical mesh.
///
/// The linearizer holds no state besides the mesh, so a single instance can
/// be shared across threads and reused for any number of shapes and grids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GridLinearizer {
    physical: PhysicalGrid,
}

impl GridLinearizer {
    /// Creates a linearizer for the given core mesh.
    pub fn new(physical: PhysicalGrid) -> Self {
        Self { physical }
    }

    /// The core mesh every device map is derived against.
    pub fn physical_grid(&self) -> PhysicalGrid {
        self.physical
    }

    /// Builds the three-result device map for `grid`.
    ///
    /// # Errors
    /// - [`LinearizeError::GridRankTooSmall`] when `grid` has rank < 2.
    /// - [`LinearizeError::ExtentOverflow`] when the padded grid cannot be
    ///   addressed.
    pub fn device_map(&self, grid: &Shape) -> Result<AffineMap, LinearizeError> {
        let rank = grid.rank();
        if rank < 2 {
            return Err(LinearizeError::GridRankTooSmall { rank });
        }
        let mesh = self.physical.mesh_shape(grid)?;
        let total = self.physical.total_devices(grid)?;
        let p0 = to_i64(self.physical.rows())?;
        let p1 = to_i64(self.physical.cols())?;

        let dy = AffineExpr::dim(rank - 2);
        let dx = AffineExpr::dim(rank - 1);

        let mut dz = AffineExpr::constant(0);
        if total > 1 {
            let mut radix = mesh[rank - 1];
            dz = dy.clone().floor_div(p0)? * to_i64(radix)? + dx.clone().floor_div(p1)?;
            for d in (0..rank - 2).rev() {
                radix = radix
                    .checked_mul(mesh[d + 1])
                    .ok_or(LinearizeError::ExtentOverflow { value: mesh[d + 1] })?;
                dz = AffineExpr::dim(d) * to_i64(radix)? + dz;
            }
        }

        let row = if mesh[rank - 2] > 1 { dy.modulo(p0)? } else { dy };
        let col = if mesh[rank - 1] > 1 { dx.modulo(p1)? } else { dx };

        let padded_rows = mesh[rank - 2] > 1 && grid.dims()[rank - 2] % self.physical.rows() != 0;
        let padded_cols = mesh[rank - 1] > 1 && grid.dims()[rank - 1] % self.physical.cols() != 0;
        if padded_rows || padded_cols {
            tracing::warn!(
                "grid <{grid}> is not a multiple of the {} core mesh; padding to {total} cores",
                self.physical,
            );
        }

        let map = AffineMap::new(rank, 0, vec![dz, row, col])?;
        tracing::debug!("device map for grid <{grid}> on {} mesh: {map}", self.physical);
        Ok(map)
    }

    /// Places `shape` on `grid`, collapsing logical dims per `intervals`.
    ///
    /// # Errors
    /// - Interval errors from [`CollapseIntervals::groups`].
    /// - [`LinearizeError::RankMismatch`] when the collapsed rank differs
    ///   from the grid rank.
    /// - [`LinearizeError::GridRankTooSmall`] when the grid has rank < 2.
    pub fn linearize(
        &self,
        shape: &Shape,
        grid: &Shape,
        intervals: &CollapseIntervals,
    ) -> Result<Linearization, LinearizeError> {
        if grid.rank() < 2 {
            return Err(LinearizeError::GridRankTooSmall { rank: grid.rank() });
        }
        let collapsed_shape = intervals.collapsed_shape(shape)?;
        if collapsed_shape.rank() != grid.rank() {
            return Err(LinearizeError::RankMismatch {
                collapsed_rank: collapsed_shape.rank(),
                grid_rank: grid.rank(),
            });
        }
        let linear = intervals.linear_map(shape)?;
        let block_shape = block_shape(&collapsed_shape, grid)?;
        let device_map = self.device_map(grid)?;

        tracing::debug!(
            "linearized {shape} on <{grid}>: {linear}, block {block_shape}",
        );

        Ok(Linearization {
            linear,
            collapsed_shape,
            block_shape,
            device_map,
        })
    }
}

/// Per-core block extents: each collapsed dim divided by the grid, rounded
/// up. The two shapes must have equal rank.
pub fn block_shape(collapsed: &Shape, grid: &Shape) -> Result<Shape, LinearizeError> {
    if collapsed.rank() != grid.rank() {
        return Err(LinearizeError::RankMismatch {
            collapsed_rank: collapsed.rank(),
            grid_rank: grid.rank(),
        });
    }
    let dims = collapsed
        .dims()
        .iter()
        .zip(grid.dims())
        .map(|(&n, &g)| crate::ceil_div(n, g))
        .collect();
    Ok(Shape::new(dims)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn shape(dims: &[usize]) -> Shape {
        Shape::new(dims.to_vec()).unwrap()
    }

    fn engine() -> GridLinearizer {
        GridLinearizer::default()
    }

    #[test]
    fn test_small_grid_fits_one_mesh() {
        let m = engine().device_map(&shape(&[2, 4])).unwrap();
        assert_eq!(
            m.to_string(),
            "(d0, d1) -> (d0 floordiv 8 + d1 floordiv 8, d0, d1)"
        );
    }

    #[test]
    fn test_wrapping_grid_uses_modulo() {
        let m = engine().device_map(&shape(&[16, 16])).unwrap();
        assert_eq!(
            m.to_string(),
            "(d0, d1) -> ((d0 floordiv 8) * 2 + d1 floordiv 8, d0 % 8, d1 % 8)"
        );
    }

    #[test]
    fn test_modulo_elided_per_dimension() {
        let m = engine().device_map(&shape(&[16, 4])).unwrap();
        assert_eq!(m.result(1).unwrap().to_string(), "d0 % 8");
        assert_eq!(m.result(2).unwrap(), &AffineExpr::dim(1));

        let m = engine().device_map(&shape(&[4, 24])).unwrap();
        assert_eq!(m.result(1).unwrap(), &AffineExpr::dim(0));
        assert_eq!(m.result(2).unwrap().to_string(), "d1 % 8");
    }

    #[test]
    fn test_leading_dims_are_high_order_digits() {
        let m = engine().device_map(&shape(&[3, 16, 16])).unwrap();
        assert_eq!(
            m.result(0).unwrap().to_string(),
            "d0 * 4 + (d1 floordiv 8) * 2 + d2 floordiv 8"
        );
        // Mixed-radix over mesh [3, 2, 2]: (2, 9, 1) -> 2*4 + 1*2 + 0.
        assert_eq!(m.eval(&[2, 9, 1]).unwrap(), vec![10, 1, 1]);
    }

    #[test]
    fn test_single_device_is_constant_zero() {
        let e = GridLinearizer::new(PhysicalGrid::new(1, 1).unwrap());
        let m = e.device_map(&shape(&[1, 1])).unwrap();
        assert_eq!(m.result(0).unwrap(), &AffineExpr::constant(0));
        assert_eq!(m.to_string(), "(d0, d1) -> (0, d0, d1)");
    }

    #[test]
    fn test_always_three_results() {
        let grids: Vec<Vec<usize>> = vec![
            vec![2, 4],
            vec![1, 1],
            vec![2, 2, 4],
            vec![5, 3, 17, 9],
            vec![64, 64],
        ];
        for grid in &grids {
            let m = engine().device_map(&shape(grid)).unwrap();
            assert_eq!(m.num_results(), 3, "grid {grid:?}");
            assert_eq!(m.num_dims(), grid.len());
        }
    }

    #[test]
    fn test_deterministic() {
        let g = shape(&[3, 16, 24]);
        assert_eq!(engine().device_map(&g).unwrap(), engine().device_map(&g).unwrap());
    }

    #[test]
    fn test_device_index_is_dense_for_exact_grids() {
        // Every core of a 16x16 grid on an 8x8 mesh gets a unique
        // (device, row, col) triple.
        let m = engine().device_map(&shape(&[16, 16])).unwrap();
        let mut seen = std::collections::HashSet::new();
        for y in 0..16 {
            for x in 0..16 {
                let r = m.eval(&[y, x]).unwrap();
                assert!(r[0] < 4 && r[1] < 8 && r[2] < 8);
                assert!(seen.insert(r));
            }
        }
        assert_eq!(seen.len(), 256);
    }

    #[test]
    fn test_rank_one_grid_rejected() {
        let err = engine().device_map(&shape(&[8])).unwrap_err();
        assert_eq!(err, LinearizeError::GridRankTooSmall { rank: 1 });
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_linearize_default_collapse() {
        let l = engine()
            .linearize(
                &shape(&[2, 3, 64, 128]),
                &shape(&[2, 4]),
                &CollapseIntervals::default(),
            )
            .unwrap();
        assert_eq!(
            l.linear.to_string(),
            "(d0, d1, d2, d3) -> (d0 * 192 + d1 * 64 + d2, d3)"
        );
        assert_eq!(l.collapsed_shape.dims(), &[384, 128]);
        assert_eq!(l.block_shape.dims(), &[192, 32]);
        assert_eq!(l.device_map.num_results(), 3);
    }

    #[test]
    fn test_linearize_collapse_sensitivity() {
        let s = shape(&[2, 3, 64, 128]);
        let l = engine()
            .linearize(&s, &shape(&[2, 2, 4]), &CollapseIntervals::from(vec![(1, -1)]))
            .unwrap();
        assert_eq!(l.linear.to_string(), "(d0, d1, d2, d3) -> (d0, d1 * 64 + d2, d3)");
        assert_eq!(l.block_shape.dims(), &[1, 96, 32]);

        let default = CollapseIntervals::default().linear_map(&s).unwrap();
        assert_ne!(l.linear, default);
    }

    #[test]
    fn test_linearize_rank_mismatch() {
        let err = engine()
            .linearize(
                &shape(&[2, 3, 64, 128]),
                &shape(&[2, 2, 4]),
                &CollapseIntervals::default(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            LinearizeError::RankMismatch {
                collapsed_rank: 2,
                grid_rank: 3
            }
        );
    }

    #[test]
    fn test_huge_inputs_are_errors() {
        let err = engine()
            .linearize(
                &shape(&[1 << 40, 1 << 40, 2]),
                &shape(&[2, 2]),
                &CollapseIntervals::default(),
            )
            .unwrap_err();
        assert!(matches!(err, LinearizeError::ExtentOverflow { .. }));

        let err = engine().device_map(&shape(&[usize::MAX, 8])).unwrap_err();
        assert!(matches!(err, LinearizeError::ExtentOverflow { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_block_shape_rounds_up() {
        let b = block_shape(&shape(&[384, 128]), &shape(&[5, 3])).unwrap();
        assert_eq!(b.dims(), &[77, 43]);
    }
}
