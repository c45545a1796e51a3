// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory spaces and out-of-bounds fill policies.

use std::fmt;

/// Where the storage backing a layout lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MemorySpace {
    /// Host system memory.
    #[serde(rename = "system")]
    System,
    /// Host memory mapped for device access.
    #[serde(rename = "mmio")]
    SystemMmio,
    /// Device DRAM.
    #[serde(rename = "dram")]
    DeviceDram,
    /// Per-core device L1 SRAM.
    #[serde(rename = "l1")]
    DeviceL1,
}

impl MemorySpace {
    /// Returns `true` for host-side memory.
    pub fn is_system(self) -> bool {
        matches!(self, MemorySpace::System | MemorySpace::SystemMmio)
    }

    /// Returns `true` for device-side memory.
    pub fn is_device(self) -> bool {
        !self.is_system()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemorySpace::System => "system",
            MemorySpace::SystemMmio => "mmio",
            MemorySpace::DeviceDram => "dram",
            MemorySpace::DeviceL1 => "l1",
        }
    }
}

impl fmt::Display for MemorySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#tt.memory_space<{}>", self.as_str())
    }
}

/// The value read from padding elements that fall outside the tensor when
/// a grid does not divide it evenly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum OobVal {
    #[default]
    #[serde(rename = "undef")]
    Undef,
    #[serde(rename = "zero")]
    Zero,
    #[serde(rename = "one")]
    One,
    #[serde(rename = "inf")]
    Inf,
    #[serde(rename = "neginf")]
    NegInf,
}

impl OobVal {
    pub fn as_str(self) -> &'static str {
        match self {
            OobVal::Undef => "undef",
            OobVal::Zero => "zero",
            OobVal::One => "one",
            OobVal::Inf => "inf",
            OobVal::NegInf => "neginf",
        }
    }
}

impl fmt::Display for OobVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
