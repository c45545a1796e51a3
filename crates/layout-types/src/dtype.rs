// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Supported element data types.

use std::fmt;

/// Enumerates the numeric formats a layout element can hold.
///
/// The block-float (`Bfp*`) formats share one exponent byte between 16
/// mantissas, so they have no standalone per-element size and are only
/// meaningful as the data type of a [`crate::TileType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    /// 32-bit IEEE 754 floating point.
    #[serde(rename = "f32")]
    Float32,
    /// 16-bit IEEE 754 floating point.
    #[serde(rename = "f16")]
    Float16,
    /// 16-bit brain floating point.
    #[serde(rename = "bf16")]
    BFloat16,
    /// Block float, 8-bit mantissa, float exponent.
    #[serde(rename = "bfp_f8")]
    BfpFloat8,
    /// Block float, 8-bit mantissa, bfloat exponent.
    #[serde(rename = "bfp_bf8")]
    BfpBFloat8,
    #[serde(rename = "bfp_f4")]
    BfpFloat4,
    #[serde(rename = "bfp_bf4")]
    BfpBFloat4,
    #[serde(rename = "bfp_f2")]
    BfpFloat2,
    #[serde(rename = "bfp_bf2")]
    BfpBFloat2,
    #[serde(rename = "u32")]
    UInt32,
    #[serde(rename = "u16")]
    UInt16,
    #[serde(rename = "u8")]
    UInt8,
}

impl DataType {
    /// Returns the number of bits stored per element, excluding any shared
    /// block exponent.
    pub fn bits(self) -> usize {
        match self {
            DataType::Float32 | DataType::UInt32 => 32,
            DataType::Float16 | DataType::BFloat16 | DataType::UInt16 => 16,
            DataType::BfpFloat8 | DataType::BfpBFloat8 | DataType::UInt8 => 8,
            DataType::BfpFloat4 | DataType::BfpBFloat4 => 4,
            DataType::BfpFloat2 | DataType::BfpBFloat2 => 2,
        }
    }

    /// Returns `true` for the shared-exponent block-float formats.
    pub fn is_block_float(self) -> bool {
        matches!(
            self,
            DataType::BfpFloat8
                | DataType::BfpBFloat8
                | DataType::BfpFloat4
                | DataType::BfpBFloat4
                | DataType::BfpFloat2
                | DataType::BfpBFloat2
        )
    }

    /// Returns the size of a single scalar element in bytes, or `None` for
    /// block-float formats.
    pub fn size_bytes(self) -> Option<usize> {
        if self.is_block_float() {
            None
        } else {
            Some(self.bits() / 8)
        }
    }

    /// Returns the canonical spelling of this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Float32 => "f32",
            DataType::Float16 => "f16",
            DataType::BFloat16 => "bf16",
            DataType::BfpFloat8 => "bfp_f8",
            DataType::BfpBFloat8 => "bfp_bf8",
            DataType::BfpFloat4 => "bfp_f4",
            DataType::BfpBFloat4 => "bfp_bf4",
            DataType::BfpFloat2 => "bfp_f2",
            DataType::BfpBFloat2 => "bfp_bf2",
            DataType::UInt32 => "u32",
            DataType::UInt16 => "u16",
            DataType::UInt8 => "u8",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
