// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fixed-size 2-D tile encoding.

use crate::{DataType, TypeError};
use std::fmt;

/// Number of mantissas sharing one exponent byte in block-float tiles.
const BFP_BLOCK: usize = 16;

/// A `height x width` block of `data_type` elements, used as the element
/// type of a tiled layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawTile")]
pub struct TileType {
    height: usize,
    width: usize,
    data_type: DataType,
}

/// Unvalidated serde form of [`TileType`].
#[derive(serde::Deserialize)]
struct RawTile {
    height: usize,
    width: usize,
    data_type: DataType,
}

impl TryFrom<RawTile> for TileType {
    type Error = TypeError;

    fn try_from(raw: RawTile) -> Result<Self, Self::Error> {
        TileType::new(raw.height, raw.width, raw.data_type)
    }
}

impl TileType {
    /// Creates a tile; both extents must be positive.
    pub fn new(height: usize, width: usize, data_type: DataType) -> Result<Self, TypeError> {
        if height == 0 || width == 0 {
            return Err(TypeError::InvalidTile { height, width });
        }
        Ok(Self {
            height,
            width,
            data_type,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Number of elements in one tile.
    pub fn num_elements(&self) -> usize {
        self.height * self.width
    }

    /// Storage footprint of one tile in bytes.
    ///
    /// Block-float tiles add one shared exponent byte per 16 elements.
    pub fn size_bytes(&self) -> usize {
        let n = self.num_elements();
        let mantissa_bytes = n * self.data_type.bits() / 8;
        if self.data_type.is_block_float() {
            mantissa_bytes + n / BFP_BLOCK
        } else {
            mantissa_bytes
        }
    }
}

impl fmt::Display for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "!tt.tile<{} x {}, {}>",
            self.height, self.width, self.data_type
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let t = TileType::new(32, 32, DataType::BfpBFloat8).unwrap();
        assert_eq!(t.to_string(), "!tt.tile<32 x 32, bfp_bf8>");
    }

    #[test]
    fn test_zero_extent_rejected() {
        assert_eq!(
            TileType::new(0, 32, DataType::Float32),
            Err(TypeError::InvalidTile {
                height: 0,
                width: 32
            })
        );
    }

    #[test]
    fn test_size_bytes() {
        let f32_tile = TileType::new(32, 32, DataType::Float32).unwrap();
        assert_eq!(f32_tile.size_bytes(), 4096);

        let bf16_tile = TileType::new(32, 32, DataType::BFloat16).unwrap();
        assert_eq!(bf16_tile.size_bytes(), 2048);

        let bfp8 = TileType::new(32, 32, DataType::BfpBFloat8).unwrap();
        assert_eq!(bfp8.size_bytes(), 1024 + 64);

        let bfp4 = TileType::new(32, 32, DataType::BfpFloat4).unwrap();
        assert_eq!(bfp4.size_bytes(), 512 + 64);

        let bfp2 = TileType::new(32, 32, DataType::BfpBFloat2).unwrap();
        assert_eq!(bfp2.size_bytes(), 256 + 64);
    }
}
