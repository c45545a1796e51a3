// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layout defaults loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! physical_grid = [8, 8]
//! memory_space = "l1"
//! oob = "undef"
//! collapse_intervals = [[0, -1]]
//! tile_height = 32
//! tile_width = 32
//! ```
//!
//! Every key is optional; missing keys take the values shown above.

use crate::{LayoutBuilder, LayoutError};
use grid_linearize::{CollapseIntervals, PhysicalGrid};
use layout_types::{DataType, MemorySpace, OobVal, Shape, TileType};
use std::path::Path;

/// Defaults applied to every layout created through a [`LayoutContext`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LayoutConfig {
    /// Core mesh of one device, `[rows, cols]`.
    #[serde(default)]
    pub physical_grid: PhysicalGrid,
    #[serde(default = "default_memory_space")]
    pub memory_space: MemorySpace,
    #[serde(default)]
    pub oob: OobVal,
    #[serde(default)]
    pub collapse_intervals: CollapseIntervals,
    #[serde(default = "default_tile_extent")]
    pub tile_height: usize,
    #[serde(default = "default_tile_extent")]
    pub tile_width: usize,
}

fn default_memory_space() -> MemorySpace {
    MemorySpace::DeviceL1
}

fn default_tile_extent() -> usize {
    32
}

impl LayoutConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, LayoutError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LayoutError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, LayoutError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| LayoutError::ConfigError(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, LayoutError> {
        toml::to_string_pretty(self)
            .map_err(|e| LayoutError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Checks the fields serde cannot: tile extents must be positive.
    pub fn validate(&self) -> Result<(), LayoutError> {
        TileType::new(self.tile_height, self.tile_width, DataType::Float32)
            .map(|_| ())
            .map_err(|e| LayoutError::ConfigError(format!("invalid tile: {e}")))
    }

    /// The configured tile with elements of `data_type`.
    pub fn tile(&self, data_type: DataType) -> Result<TileType, LayoutError> {
        Ok(TileType::new(self.tile_height, self.tile_width, data_type)?)
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            physical_grid: PhysicalGrid::default(),
            memory_space: default_memory_space(),
            oob: OobVal::default(),
            collapse_intervals: CollapseIntervals::default(),
            tile_height: default_tile_extent(),
            tile_width: default_tile_extent(),
        }
    }
}

/// Creates layouts that share one [`LayoutConfig`].
///
/// ```
/// use layout_types::Shape;
/// use tensor_layout::LayoutContext;
///
/// let ctx = LayoutContext::default();
/// let layout = ctx
///     .layout(Shape::new(vec![64, 64]).unwrap(), Shape::matrix(2, 2).unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(layout.block_shape().dims(), &[32, 32]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayoutContext {
    config: LayoutConfig,
}

impl LayoutContext {
    /// Validates `config` and wraps it.
    pub fn new(config: LayoutConfig) -> Result<Self, LayoutError> {
        config.validate()?;
        tracing::info!(
            "layout context: {} mesh, {}, oob {}, tile {}x{}",
            config.physical_grid,
            config.memory_space,
            config.oob,
            config.tile_height,
            config.tile_width,
        );
        Ok(Self { config })
    }

    /// Loads and validates a context from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, LayoutError> {
        Self::new(LayoutConfig::from_file(path)?)
    }

    /// The defaults this context applies.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// A builder for `shape` on `grid` preset with this context's defaults.
    pub fn layout(&self, shape: Shape, grid: Shape) -> LayoutBuilder {
        LayoutBuilder::new(shape, grid)
            .memory_space(self.config.memory_space)
            .oob(self.config.oob)
            .collapse_intervals(self.config.collapse_intervals.clone())
            .physical_grid(self.config.physical_grid)
    }

    /// The default tile with elements of `data_type`.
    pub fn tile(&self, data_type: DataType) -> Result<TileType, LayoutError> {
        self.config.tile(data_type)
    }
}
