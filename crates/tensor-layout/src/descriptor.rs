// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layout descriptors: a tensor placed on a device grid.
//!
//! A [`LayoutDescriptor`] binds a tensor shape, a memory space, a grid and
//! the affine maps derived for them. Descriptors are immutable; the only
//! ways to evolve one are the pure transforms:
//!
//! ```text
//!            tilize(tile)                      parallelize(grid, intervals)
//! layout ───────────────► tiled layout    layout ─────────────────────────► layout'
//!    same maps, tile element type             new maps, same element type
//! ```
//!
//! Both transforms return a new descriptor and leave the input untouched,
//! and the two commute.

use crate::{to_i64, LayoutError};
use affine_expr::{AffineExpr, AffineMap};
use grid_linearize::{CollapseIntervals, GridLinearizer, LinearizeError, PhysicalGrid};
use layout_types::{DataType, ElementType, MemorySpace, OobVal, Shape, TileType};
use std::fmt;

/// An immutable description of how a tensor is distributed over a grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayoutDescriptor {
    shape: Shape,
    scalar_type: DataType,
    element_type: ElementType,
    memory_space: MemorySpace,
    grid: Shape,
    oob: OobVal,
    physical: PhysicalGrid,
    linear: AffineMap,
    device_map: AffineMap,
    /// Per-core block in scalar elements, independent of tiling.
    block_shape: Shape,
    /// Per-core block in units of `element_type`.
    memref_shape: Shape,
    physical_shape: Shape,
}

impl LayoutDescriptor {
    /// Starts building a layout for `shape` on `grid` with default settings.
    pub fn builder(shape: Shape, grid: Shape) -> LayoutBuilder {
        LayoutBuilder::new(shape, grid)
    }

    /// The tensor's logical shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The tensor's scalar element type.
    pub fn scalar_type(&self) -> DataType {
        self.scalar_type
    }

    /// The element type of the per-core block: scalar or tile.
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Where the per-core blocks live.
    pub fn memory_space(&self) -> MemorySpace {
        self.memory_space
    }

    /// The logical grid the tensor is distributed over.
    pub fn grid(&self) -> &Shape {
        &self.grid
    }

    /// What padding elements read as.
    pub fn oob(&self) -> OobVal {
        self.oob
    }

    /// The core mesh of one device.
    pub fn physical_grid(&self) -> PhysicalGrid {
        self.physical
    }

    /// Logical tensor coords -> collapsed grid-rank coords.
    pub fn linear_map(&self) -> &AffineMap {
        &self.linear
    }

    /// Grid coords -> `(device, row, col)`.
    pub fn device_map(&self) -> &AffineMap {
        &self.device_map
    }

    /// Per-core block in scalar elements.
    pub fn block_shape(&self) -> &Shape {
        &self.block_shape
    }

    /// Whether the blocks are stored as tiles.
    pub fn is_tiled(&self) -> bool {
        self.element_type.is_tiled()
    }

    /// Per-core block in units of [`element_type`](Self::element_type):
    /// tiles when tiled, scalars otherwise.
    pub fn memref_shape(&self) -> &Shape {
        &self.memref_shape
    }

    /// The padded collapsed shape covered by the grid, in scalar elements.
    pub fn physical_shape(&self) -> &Shape {
        &self.physical_shape
    }

    /// Bytes of storage each core holds, or `None` when the element type
    /// has no byte size (a scalar block-float) or the size overflows.
    pub fn block_size_bytes(&self) -> Option<usize> {
        self.element_type
            .size_bytes()
            .and_then(|b| b.checked_mul(self.memref_shape.num_elements()))
    }

    /// Returns a copy whose block element type is `element_type`.
    ///
    /// Tiles require the last two block dims to divide evenly by the tile
    /// extents. A scalar element type must be the tensor's own.
    fn with_element_type(&self, element_type: ElementType) -> Result<Self, LayoutError> {
        let memref_shape = match element_type {
            ElementType::Tile(tile) => tiled_block(&self.block_shape, &tile)?,
            ElementType::Scalar(dt) if dt == self.scalar_type => self.block_shape.clone(),
            ElementType::Scalar(dt) => {
                return Err(LayoutError::ElementTypeMismatch {
                    scalar: self.scalar_type,
                    element: dt,
                })
            }
        };
        tracing::debug!("layout {} element type {} -> {element_type}", self.shape, self.element_type);
        Ok(Self {
            element_type,
            memref_shape,
            ..self.clone()
        })
    }

    /// Returns a copy whose blocks are stored as `tile`s.
    ///
    /// The maps and grid are unchanged; only the element type and the
    /// block units change.
    pub fn tilize(&self, tile: TileType) -> Result<Self, LayoutError> {
        self.with_element_type(ElementType::Tile(tile))
    }

    /// Returns a copy placed on `grid`, recomputing every map.
    ///
    /// Tensor shape, scalar type, memory space and element type (including
    /// any tiling) carry over, so re-parallelizing never requires
    /// un-tiling first.
    pub fn parallelize(
        &self,
        grid: &Shape,
        intervals: &CollapseIntervals,
    ) -> Result<Self, LayoutError> {
        let next = LayoutBuilder::new(self.shape.clone(), grid.clone())
            .data_type(self.scalar_type)
            .memory_space(self.memory_space)
            .collapse_intervals(intervals.clone())
            .oob(self.oob)
            .physical_grid(self.physical)
            .build()?;
        tracing::debug!("parallelized {} from <{}> to <{grid}>", self.shape, self.grid);
        next.with_element_type(self.element_type)
    }

    /// Projects the layout onto the physical cores.
    ///
    /// The returned map takes logical tensor coords to
    /// `(device, row, col, offset)`, where `offset` is the row-major element
    /// offset inside the core's block.
    pub fn project_onto(&self) -> Result<AffineMap, LayoutError> {
        let rank = self.grid.rank();
        let blocks = self.block_shape.dims();
        let strides = self.block_shape.strides();

        let mut grid_coords = Vec::with_capacity(rank);
        let mut offset = AffineExpr::constant(0);
        for i in 0..rank {
            let extent = to_i64(blocks[i])?;
            grid_coords.push(AffineExpr::dim(i).floor_div(extent)?);
            offset = offset + AffineExpr::dim(i).modulo(extent)? * to_i64(strides[i])?;
        }
        let to_grid = AffineMap::new(rank, 0, grid_coords)?;
        let cores = self.device_map.compose(&to_grid)?.compose(&self.linear)?;
        let offset = AffineMap::new(rank, 0, vec![offset])?.compose(&self.linear)?;

        let mut results = cores.results().to_vec();
        results.extend(offset.results().iter().cloned());
        Ok(AffineMap::new(self.shape.rank(), 0, results)?)
    }

    /// The full tensor type, e.g. `tensor<2x3x64x128xf32, #tt.layout<..>>`.
    pub fn tensor_type_string(&self) -> String {
        format!("tensor<{}x{}, {}>", self.shape, self.scalar_type, self)
    }
}

impl fmt::Display for LayoutDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#tt.layout<{}, {}, <{}>, memref<{}x{}, {}>>",
            self.linear,
            self.oob,
            self.grid,
            self.memref_shape(),
            self.element_type,
            self.memory_space,
        )
    }
}

/// Divides the last two block dims by the tile extents.
fn tiled_block(block: &Shape, tile: &TileType) -> Result<Shape, LayoutError> {
    let (rows, cols) = block.last_two().ok_or(LayoutError::UnevenTile {
        rows: 1,
        cols: block.dims()[0],
        tile_height: tile.height(),
        tile_width: tile.width(),
    })?;
    if rows % tile.height() != 0 || cols % tile.width() != 0 {
        return Err(LayoutError::UnevenTile {
            rows,
            cols,
            tile_height: tile.height(),
            tile_width: tile.width(),
        });
    }
    let mut dims = block.dims().to_vec();
    let n = dims.len();
    dims[n - 2] = rows / tile.height();
    dims[n - 1] = cols / tile.width();
    Ok(Shape::new(dims)?)
}

/// Multiplies block and grid extents, checking that the padded footprint
/// stays addressable.
fn physical_shape(block: &Shape, grid: &Shape) -> Result<Shape, LayoutError> {
    let dims = block
        .dims()
        .iter()
        .zip(grid.dims())
        .map(|(&b, &g)| b.checked_mul(g).ok_or(LinearizeError::ExtentOverflow { value: g }))
        .collect::<Result<Vec<_>, _>>()?;
    dims.iter().try_fold(1usize, |acc, &d| {
        acc.checked_mul(d)
            .ok_or(LinearizeError::ExtentOverflow { value: d })
    })?;
    Ok(Shape::new(dims)?)
}

/// Collects the inputs of a [`LayoutDescriptor`] and derives its maps.
///
/// Defaults: `f32` elements in device L1, collapse intervals `[(0, -1)]`,
/// `undef` padding and an 8x8 physical mesh.
#[derive(Debug, Clone)]
pub struct LayoutBuilder {
    shape: Shape,
    grid: Shape,
    data_type: DataType,
    memory_space: MemorySpace,
    intervals: CollapseIntervals,
    oob: OobVal,
    physical: PhysicalGrid,
}

impl LayoutBuilder {
    /// Starts a layout for `shape` on `grid` with default settings.
    pub fn new(shape: Shape, grid: Shape) -> Self {
        Self {
            shape,
            grid,
            data_type: DataType::Float32,
            memory_space: MemorySpace::DeviceL1,
            intervals: CollapseIntervals::default(),
            oob: OobVal::Undef,
            physical: PhysicalGrid::default(),
        }
    }

    /// Sets the tensor's scalar element type.
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Sets where the per-core blocks live.
    pub fn memory_space(mut self, memory_space: MemorySpace) -> Self {
        self.memory_space = memory_space;
        self
    }

    /// Sets which logical dims fold into each grid dim.
    pub fn collapse_intervals(mut self, intervals: CollapseIntervals) -> Self {
        self.intervals = intervals;
        self
    }

    /// Sets what padding elements read as.
    pub fn oob(mut self, oob: OobVal) -> Self {
        self.oob = oob;
        self
    }

    /// Sets the core mesh of one device.
    pub fn physical_grid(mut self, physical: PhysicalGrid) -> Self {
        self.physical = physical;
        self
    }

    /// Runs the grid linearization engine and produces the descriptor.
    pub fn build(self) -> Result<LayoutDescriptor, LayoutError> {
        let l = GridLinearizer::new(self.physical).linearize(
            &self.shape,
            &self.grid,
            &self.intervals,
        )?;
        let physical_shape = physical_shape(&l.block_shape, &self.grid)?;
        Ok(LayoutDescriptor {
            shape: self.shape,
            scalar_type: self.data_type,
            element_type: ElementType::Scalar(self.data_type),
            memory_space: self.memory_space,
            grid: self.grid,
            oob: self.oob,
            physical: self.physical,
            linear: l.linear,
            device_map: l.device_map,
            memref_shape: l.block_shape.clone(),
            block_shape: l.block_shape,
            physical_shape,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_linearize::ErrorKind;

    fn shape(dims: &[usize]) -> Shape {
        Shape::new(dims.to_vec()).unwrap()
    }

    fn base() -> LayoutDescriptor {
        LayoutDescriptor::builder(shape(&[2, 3, 64, 128]), shape(&[2, 4]))
            .build()
            .unwrap()
    }

    fn bfp8_tile() -> TileType {
        TileType::new(32, 32, DataType::BfpBFloat8).unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let l = base();
        assert_eq!(l.scalar_type(), DataType::Float32);
        assert_eq!(l.memory_space(), MemorySpace::DeviceL1);
        assert_eq!(l.oob(), OobVal::Undef);
        assert_eq!(l.physical_grid(), PhysicalGrid::default());
        assert!(!l.is_tiled());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            base().to_string(),
            "#tt.layout<(d0, d1, d2, d3) -> (d0 * 192 + d1 * 64 + d2, d3), undef, <2x4>, \
             memref<192x32xf32, #tt.memory_space<l1>>>"
        );
    }

    #[test]
    fn test_tilize_keeps_maps() {
        let l = base();
        let t = l.tilize(bfp8_tile()).unwrap();
        assert_eq!(t.memref_shape().dims(), &[6, 1]);
        assert_eq!(t.block_shape(), l.block_shape());
        assert_eq!(t.linear_map(), l.linear_map());
        assert_eq!(t.device_map(), l.device_map());
        assert_eq!(t.element_type(), ElementType::Tile(bfp8_tile()));
        // The input is untouched.
        assert!(!l.is_tiled());
    }

    #[test]
    fn test_tilize_uneven_rejected() {
        let l = LayoutDescriptor::builder(shape(&[48, 48]), shape(&[1, 1]))
            .build()
            .unwrap();
        let err = l.tilize(TileType::new(32, 32, DataType::Float16).unwrap()).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnevenTile {
                rows: 48,
                cols: 48,
                tile_height: 32,
                tile_width: 32
            }
        );
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_parallelize_recomputes_maps() {
        let l = base();
        let p = l.parallelize(&shape(&[3, 2]), &CollapseIntervals::default()).unwrap();
        assert_eq!(p.grid().dims(), &[3, 2]);
        assert_eq!(p.block_shape().dims(), &[128, 64]);
        assert_eq!(p.linear_map(), l.linear_map());
        assert_eq!(p.shape(), l.shape());
    }

    #[test]
    fn test_parallelize_keeps_tiling() {
        let t = base().tilize(bfp8_tile()).unwrap();
        let p = t.parallelize(&shape(&[3, 2]), &CollapseIntervals::default()).unwrap();
        assert_eq!(p.element_type(), ElementType::Tile(bfp8_tile()));
        assert_eq!(p.memref_shape().dims(), &[4, 2]);
    }

    #[test]
    fn test_parallelize_into_untileable_grid_fails() {
        let t = base().tilize(bfp8_tile()).unwrap();
        // 384 / 5 rounds up to 77 rows, not a multiple of 32.
        let err = t
            .parallelize(&shape(&[5, 4]), &CollapseIntervals::default())
            .unwrap_err();
        assert!(matches!(err, LayoutError::UnevenTile { rows: 77, .. }));
    }

    #[test]
    fn test_transforms_commute() {
        let l = base();
        let g = shape(&[3, 2]);
        let intervals = CollapseIntervals::default();
        let a = l.tilize(bfp8_tile()).unwrap().parallelize(&g, &intervals).unwrap();
        let b = l.parallelize(&g, &intervals).unwrap().tilize(bfp8_tile()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_physical_shape_includes_padding() {
        let l = LayoutDescriptor::builder(shape(&[10, 10]), shape(&[3, 4]))
            .build()
            .unwrap();
        assert_eq!(l.block_shape().dims(), &[4, 3]);
        assert_eq!(l.physical_shape().dims(), &[12, 12]);
    }

    #[test]
    fn test_scalar_element_type_cannot_drift() {
        let l = LayoutDescriptor::builder(shape(&[4, 4]), shape(&[1, 1]))
            .build()
            .unwrap();
        let err = l
            .with_element_type(ElementType::Scalar(DataType::UInt8))
            .unwrap_err();
        assert_eq!(
            err,
            LayoutError::ElementTypeMismatch {
                scalar: DataType::Float32,
                element: DataType::UInt8
            }
        );
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(l.with_element_type(ElementType::Scalar(DataType::Float32)).unwrap(), l);
    }

    #[test]
    fn test_untiled_memref_is_block() {
        let l = base();
        assert_eq!(l.memref_shape(), l.block_shape());
    }

    #[test]
    fn test_unaddressable_physical_shape_is_an_error() {
        // The last dim pads from usize::MAX up to 2^64.
        let err = LayoutDescriptor::builder(shape(&[1, usize::MAX]), shape(&[1, 2]))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Linearize(LinearizeError::ExtentOverflow { .. })
        ));
    }

    #[test]
    fn test_overflowing_tensor_is_an_error() {
        let err = LayoutDescriptor::builder(shape(&[1 << 40, 1 << 40, 2]), shape(&[2, 2]))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Linearize(LinearizeError::ExtentOverflow { .. })
        ));
    }

    #[test]
    fn test_block_size_bytes() {
        let l = base();
        assert_eq!(l.block_size_bytes(), Some(192 * 32 * 4));
        let t = l.tilize(bfp8_tile()).unwrap();
        assert_eq!(t.block_size_bytes(), Some(6 * 1088));
    }

    #[test]
    fn test_project_onto() {
        let l = LayoutDescriptor::builder(shape(&[4, 8]), shape(&[2, 2]))
            .build()
            .unwrap();
        let p = l.project_onto().unwrap();
        assert_eq!(p.num_dims(), 2);
        assert_eq!(p.num_results(), 4);
        // Block is 2x4: element (3, 5) sits on core (1, 1) at offset 1*4 + 1.
        assert_eq!(p.eval(&[3, 5]).unwrap(), vec![0, 1, 1, 5]);
        assert_eq!(p.eval(&[0, 0]).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_project_onto_wrapping_grid() {
        let l = LayoutDescriptor::builder(shape(&[16, 16]), shape(&[16, 16]))
            .build()
            .unwrap();
        let p = l.project_onto().unwrap();
        // Grid coord (9, 10) -> mesh (1, 1) -> device 3, core (1, 2).
        assert_eq!(p.eval(&[9, 10]).unwrap(), vec![3, 1, 2, 0]);
    }

    #[test]
    fn test_tensor_type_string() {
        assert_eq!(
            base().tensor_type_string(),
            "tensor<2x3x64x128xf32, #tt.layout<(d0, d1, d2, d3) -> (d0 * 192 + d1 * 64 + d2, d3), \
             undef, <2x4>, memref<192x32xf32, #tt.memory_space<l1>>>>"
        );
    }
}
