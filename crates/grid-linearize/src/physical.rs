// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The physical core mesh and how a logical grid is padded onto it.

use crate::{checked_product, LinearizeError};
use layout_types::Shape;
use std::fmt;

/// Integer division rounding up. `d` must be non-zero.
pub fn ceil_div(n: usize, d: usize) -> usize {
    n / d + usize::from(n % d != 0)
}

/// The fixed 2-D hardware core mesh that logical grids are tiled onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "[usize; 2]", into = "[usize; 2]")]
pub struct PhysicalGrid {
    rows: usize,
    cols: usize,
}

impl PhysicalGrid {
    /// Creates a physical grid; both extents must be positive.
    pub fn new(rows: usize, cols: usize) -> Result<Self, LinearizeError> {
        if rows == 0 || cols == 0 {
            return Err(LinearizeError::InvalidPhysicalGrid { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    /// Core rows per device.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Core columns per device.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cores in the mesh.
    pub fn num_cores(&self) -> usize {
        self.rows * self.cols
    }

    /// How many physical meshes are needed along each grid dimension.
    ///
    /// Leading grid dims are kept as-is; the trailing two are divided by the
    /// mesh rows/cols, rounding up.
    pub fn mesh_shape(&self, grid: &Shape) -> Result<Vec<usize>, LinearizeError> {
        let (rows, cols) = grid
            .last_two()
            .ok_or(LinearizeError::GridRankTooSmall { rank: grid.rank() })?;
        let lead = &grid.dims()[..grid.rank() - 2];
        let mut mesh = lead.to_vec();
        mesh.push(ceil_div(rows, self.rows));
        mesh.push(ceil_div(cols, self.cols));
        Ok(mesh)
    }

    /// Total number of cores addressed by `grid` once padded to whole
    /// physical meshes.
    ///
    /// Equals `product(grid)` when the trailing grid dims are multiples of
    /// the mesh and over-counts otherwise.
    ///
    /// # Errors
    /// [`LinearizeError::ExtentOverflow`] when the padded count does not fit
    /// in a `usize`.
    pub fn total_devices(&self, grid: &Shape) -> Result<usize, LinearizeError> {
        let mut mesh = self.mesh_shape(grid)?;
        mesh.push(self.rows);
        mesh.push(self.cols);
        checked_product(mesh)
    }
}

impl Default for PhysicalGrid {
    fn default() -> Self {
        Self { rows: 8, cols: 8 }
    }
}

impl fmt::Display for PhysicalGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

impl TryFrom<[usize; 2]> for PhysicalGrid {
    type Error = LinearizeError;

    fn try_from([rows, cols]: [usize; 2]) -> Result<Self, Self::Error> {
        Self::new(rows, cols)
    }
}

impl From<PhysicalGrid> for [usize; 2] {
    fn from(grid: PhysicalGrid) -> Self {
        [grid.rows, grid.cols]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(dims: &[usize]) -> Shape {
        Shape::new(dims.to_vec()).unwrap()
    }

    #[test]
    fn test_ceil_div() {
        assert_eq!(ceil_div(8, 8), 1);
        assert_eq!(ceil_div(9, 8), 2);
        assert_eq!(ceil_div(1, 8), 1);
        assert_eq!(ceil_div(16, 8), 2);
        assert_eq!(ceil_div(usize::MAX, 8), usize::MAX / 8 + 1);
        assert_eq!(ceil_div(usize::MAX, 1), usize::MAX);
    }

    #[test]
    fn test_default_is_8x8() {
        let p = PhysicalGrid::default();
        assert_eq!((p.rows(), p.cols()), (8, 8));
        assert_eq!(p.num_cores(), 64);
        assert_eq!(p.to_string(), "8x8");
    }

    #[test]
    fn test_zero_extent_rejected() {
        assert!(PhysicalGrid::new(0, 8).is_err());
    }

    #[test]
    fn test_mesh_shape() {
        let p = PhysicalGrid::default();
        assert_eq!(p.mesh_shape(&shape(&[2, 4])).unwrap(), vec![1, 1]);
        assert_eq!(p.mesh_shape(&shape(&[3, 16, 9])).unwrap(), vec![3, 2, 2]);
        assert!(matches!(
            p.mesh_shape(&shape(&[4])),
            Err(LinearizeError::GridRankTooSmall { rank: 1 })
        ));
    }

    #[test]
    fn test_total_devices_pads_to_whole_meshes() {
        let p = PhysicalGrid::default();
        assert_eq!(p.total_devices(&shape(&[8, 8])).unwrap(), 64);
        assert_eq!(p.total_devices(&shape(&[16, 8])).unwrap(), 128);
        assert_eq!(p.total_devices(&shape(&[2, 4])).unwrap(), 64);
        assert_eq!(p.total_devices(&shape(&[3, 9, 8])).unwrap(), 3 * 16 * 8);
    }

    #[test]
    fn test_total_devices_single_core() {
        let p = PhysicalGrid::new(1, 1).unwrap();
        assert_eq!(p.total_devices(&shape(&[1, 1])).unwrap(), 1);
        assert_eq!(p.total_devices(&shape(&[2, 3])).unwrap(), 6);
    }

    #[test]
    fn test_total_devices_overflow_is_an_error() {
        let p = PhysicalGrid::default();
        let err = p.total_devices(&shape(&[usize::MAX, 8])).unwrap_err();
        assert!(matches!(err, LinearizeError::ExtentOverflow { .. }));

        let err = p.total_devices(&shape(&[1 << 40, 1 << 40, 8, 8])).unwrap_err();
        assert!(matches!(err, LinearizeError::ExtentOverflow { .. }));
    }
}
