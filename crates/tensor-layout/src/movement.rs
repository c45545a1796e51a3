// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Data movement between two layouts of the same tensor.
//!
//! Relayout is expressed from the destination's point of view: every
//! destination core gets a list of [`Read`]s, each copying a contiguous byte
//! range out of one source core's block. Elements are visited in row-major
//! order and a read grows while both its source and destination ranges stay
//! contiguous, so a relayout that moves whole rows issues one read per row
//! rather than one per element.

use crate::{to_i64, LayoutDescriptor, LayoutError};
use affine_expr::AffineMap;
use std::collections::BTreeMap;
use std::fmt;

/// A core on the device mesh.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
)]
pub struct CoreCoord {
    pub device: usize,
    pub row: usize,
    pub col: usize,
}

impl CoreCoord {
    /// Creates a coordinate for core `(row, col)` of `device`.
    pub fn new(device: usize, row: usize, col: usize) -> Self {
        Self { device, row, col }
    }
}

impl fmt::Display for CoreCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:({}, {})", self.device, self.row, self.col)
    }
}

/// One contiguous copy into a destination core. Offsets and size are bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Read {
    pub src: CoreCoord,
    pub src_offset: usize,
    pub dst_offset: usize,
    pub size: usize,
}

impl Read {
    /// Whether a copy starting at the given offsets continues this read.
    fn continues(&self, src: CoreCoord, src_offset: usize, dst_offset: usize) -> bool {
        self.src == src
            && self.src_offset + self.size == src_offset
            && self.dst_offset + self.size == dst_offset
    }
}

/// The reads issued by one destination core, in issue order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CoreReads {
    pub dst: CoreCoord,
    pub reads: Vec<Read>,
}

impl CoreReads {
    /// Bytes this core receives.
    pub fn num_bytes(&self) -> usize {
        self.reads.iter().map(|r| r.size).sum()
    }
}

/// Every read needed to turn one layout into another.
///
/// Destination cores are listed in ascending `(device, row, col)` order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DataMovementPlan {
    /// Bytes per scalar element.
    pub element_size: usize,
    pub cores: Vec<CoreReads>,
}

impl DataMovementPlan {
    /// Returns the reads for destination core `dst`; empty if it receives
    /// nothing.
    pub fn reads_for(&self, dst: CoreCoord) -> &[Read] {
        self.cores
            .binary_search_by(|c| c.dst.cmp(&dst))
            .map(|i| self.cores[i].reads.as_slice())
            .unwrap_or(&[])
    }

    /// Number of cores that receive data.
    pub fn num_destinations(&self) -> usize {
        self.cores.len()
    }

    /// Number of reads across all cores.
    pub fn num_reads(&self) -> usize {
        self.cores.iter().map(|c| c.reads.len()).sum()
    }

    /// Bytes moved across all cores.
    pub fn total_bytes(&self) -> usize {
        self.cores.iter().map(CoreReads::num_bytes).sum()
    }

    /// Iterates `(dst, read)` pairs in plan order.
    pub fn iter(&self) -> impl Iterator<Item = (CoreCoord, &Read)> {
        self.cores
            .iter()
            .flat_map(|c| c.reads.iter().map(move |r| (c.dst, r)))
    }

    /// Returns a human-readable summary of the plan.
    pub fn summary(&self) -> String {
        let largest = self.iter().map(|(_, r)| r.size).max().unwrap_or(0);
        format!(
            "{} reads into {} cores, {} bytes total, largest read {} bytes",
            self.num_reads(),
            self.num_destinations(),
            self.total_bytes(),
            largest,
        )
    }
}

/// Accumulates reads per destination, coalescing contiguous ones.
struct MovementPlanBuilder {
    element_size: usize,
    cores: BTreeMap<CoreCoord, Vec<Read>>,
}

impl MovementPlanBuilder {
    fn new(element_size: usize) -> Self {
        Self {
            element_size,
            cores: BTreeMap::new(),
        }
    }

    /// Records one element moving from `src` to `dst`; offsets are in
    /// elements.
    fn add_element(&mut self, src: CoreCoord, src_elem: usize, dst: CoreCoord, dst_elem: usize) {
        let src_offset = src_elem * self.element_size;
        let dst_offset = dst_elem * self.element_size;
        let reads = self.cores.entry(dst).or_default();
        match reads.last_mut() {
            Some(last) if last.continues(src, src_offset, dst_offset) => {
                last.size += self.element_size;
            }
            _ => reads.push(Read {
                src,
                src_offset,
                dst_offset,
                size: self.element_size,
            }),
        }
    }

    fn build(self) -> DataMovementPlan {
        DataMovementPlan {
            element_size: self.element_size,
            cores: self
                .cores
                .into_iter()
                .map(|(dst, reads)| CoreReads { dst, reads })
                .collect(),
        }
    }
}

/// Plans the reads that relayout a tensor from `src` to `dst`.
///
/// Both layouts must describe the same tensor (shape and scalar type), use
/// the same block element type, live in device memory on the same core mesh,
/// hold scalar elements and cover the same physical shape.
///
/// # Errors
/// - [`LayoutError::IncompatibleLayouts`] when the layouts disagree on
///   shape, element type, core mesh or physical shape, or either is not in
///   device memory.
/// - [`LayoutError::UnsupportedMovement`] when the layouts are tiled or
///   their blocks have no byte size.
pub fn plan_data_movement(
    src: &LayoutDescriptor,
    dst: &LayoutDescriptor,
) -> Result<DataMovementPlan, LayoutError> {
    check_compatible(src, dst)?;
    let no_byte_size = || LayoutError::UnsupportedMovement {
        detail: format!("element type {} has no byte size", src.element_type()),
    };
    let element_size = src.element_type().size_bytes().ok_or_else(no_byte_size)?;
    // Every byte offset below stays inside a block, so no offset overflows.
    src.block_size_bytes().ok_or_else(no_byte_size)?;
    dst.block_size_bytes().ok_or_else(no_byte_size)?;

    let src_proj = src.project_onto()?;
    let dst_proj = dst.project_onto()?;
    tracing::debug!("relayout {} -> {}", src, dst);

    let shape = src.shape();
    let mut builder = MovementPlanBuilder::new(element_size);
    for index in 0..shape.num_elements() {
        let coord = shape
            .coord_of(index)
            .into_iter()
            .map(to_i64)
            .collect::<Result<Vec<_>, _>>()?;
        let (src_core, src_elem) = locate(&src_proj, &coord)?;
        let (dst_core, dst_elem) = locate(&dst_proj, &coord)?;
        tracing::trace!("{coord:?}: {src_core}+{src_elem} -> {dst_core}+{dst_elem}");
        builder.add_element(src_core, src_elem, dst_core, dst_elem);
    }

    let plan = builder.build();
    tracing::info!("data movement: {}", plan.summary());
    Ok(plan)
}

fn check_compatible(src: &LayoutDescriptor, dst: &LayoutDescriptor) -> Result<(), LayoutError> {
    let incompatible = |detail: String| Err(LayoutError::IncompatibleLayouts { detail });
    if src.shape() != dst.shape() {
        return incompatible(format!("shape {} vs {}", src.shape(), dst.shape()));
    }
    if src.scalar_type() != dst.scalar_type() {
        return incompatible(format!(
            "element type {} vs {}",
            src.scalar_type(),
            dst.scalar_type()
        ));
    }
    if src.element_type() != dst.element_type() {
        return incompatible(format!(
            "block element type {} vs {}",
            src.element_type(),
            dst.element_type()
        ));
    }
    if src.physical_grid() != dst.physical_grid() {
        return incompatible(format!(
            "core mesh {} vs {}",
            src.physical_grid(),
            dst.physical_grid()
        ));
    }
    for layout in [src, dst] {
        if !layout.memory_space().is_device() {
            return incompatible(format!("{} is not device memory", layout.memory_space()));
        }
        if layout.is_tiled() {
            return Err(LayoutError::UnsupportedMovement {
                detail: format!("tiled layout {layout}"),
            });
        }
    }
    if src.physical_shape() != dst.physical_shape() {
        return incompatible(format!(
            "physical shape {} vs {}",
            src.physical_shape(),
            dst.physical_shape()
        ));
    }
    Ok(())
}

/// Splits a `(device, row, col, offset)` projection result.
fn locate(projection: &AffineMap, coord: &[i64]) -> Result<(CoreCoord, usize), LayoutError> {
    let r = projection.eval(coord)?;
    let core = CoreCoord::new(to_usize(r[0])?, to_usize(r[1])?, to_usize(r[2])?);
    Ok((core, to_usize(r[3])?))
}


fn to_usize(value: i64) -> Result<usize, LayoutError> {
    usize::try_from(value).map_err(|_| LayoutError::IncompatibleLayouts {
        detail: format!("projection produced negative coordinate {value}"),
    })
}
