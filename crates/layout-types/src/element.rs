// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The element type stored in a layout's per-device block.

use crate::{DataType, TileType};
use std::fmt;

/// Either a scalar element or a fixed-size tile of scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Scalar(DataType),
    Tile(TileType),
}

impl ElementType {
    /// Returns the tile encoding, if this element is a tile.
    pub fn tile(&self) -> Option<&TileType> {
        match self {
            ElementType::Tile(t) => Some(t),
            ElementType::Scalar(_) => None,
        }
    }

    pub fn is_tiled(&self) -> bool {
        matches!(self, ElementType::Tile(_))
    }

    /// The underlying scalar data type.
    pub fn data_type(&self) -> DataType {
        match self {
            ElementType::Scalar(dt) => *dt,
            ElementType::Tile(t) => t.data_type(),
        }
    }

    /// Size of one element in bytes, or `None` for a scalar block-float.
    pub fn size_bytes(&self) -> Option<usize> {
        match self {
            ElementType::Scalar(dt) => dt.size_bytes(),
            ElementType::Tile(t) => Some(t.size_bytes()),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Scalar(dt) => write!(f, "{dt}"),
            ElementType::Tile(t) => write!(f, "{t}"),
        }
    }
}

impl From<DataType> for ElementType {
    fn from(dt: DataType) -> Self {
        ElementType::Scalar(dt)
    }
}

impl From<TileType> for ElementType {
    fn from(tile: TileType) -> Self {
        ElementType::Tile(tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_and_tile() {
        let s: ElementType = DataType::Float32.into();
        assert!(!s.is_tiled());
        assert_eq!(s.size_bytes(), Some(4));
        assert_eq!(s.to_string(), "f32");

        let t: ElementType = TileType::new(32, 32, DataType::BfpBFloat8).unwrap().into();
        assert!(t.is_tiled());
        assert_eq!(t.data_type(), DataType::BfpBFloat8);
        assert_eq!(t.size_bytes(), Some(1088));
        assert_eq!(t.to_string(), "!tt.tile<32 x 32, bfp_bf8>");
    }

    #[test]
    fn test_block_float_scalar_has_no_size() {
        let s = ElementType::Scalar(DataType::BfpFloat4);
        assert_eq!(s.size_bytes(), None);
        assert!(s.tile().is_none());
    }
}
