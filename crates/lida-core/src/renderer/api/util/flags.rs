// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The set of pipeline stages that can see a binding.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// A set of shader stages, stored as the driver's native stage bits.
///
/// Descriptor bindings, push-constant ranges and shader modules carry one of
/// these. The bits are forwarded to the driver untranslated.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShaderStageFlags(u32);

const NAMES: [(ShaderStageFlags, &str); 6] = [
    (ShaderStageFlags::VERTEX, "VERTEX"),
    (ShaderStageFlags::TESSELLATION_CONTROL, "TESSELLATION_CONTROL"),
    (ShaderStageFlags::TESSELLATION_EVALUATION, "TESSELLATION_EVALUATION"),
    (ShaderStageFlags::GEOMETRY, "GEOMETRY"),
    (ShaderStageFlags::FRAGMENT, "FRAGMENT"),
    (ShaderStageFlags::COMPUTE, "COMPUTE"),
];

impl ShaderStageFlags {
    /// No stage.
    pub const NONE: Self = Self(0);
    /// Vertex stage.
    pub const VERTEX: Self = Self(0x01);
    /// Tessellation control stage.
    pub const TESSELLATION_CONTROL: Self = Self(0x02);
    /// Tessellation evaluation stage.
    pub const TESSELLATION_EVALUATION: Self = Self(0x04);
    /// Geometry stage.
    pub const GEOMETRY: Self = Self(0x08);
    /// Fragment stage.
    pub const FRAGMENT: Self = Self(0x10);
    /// Compute stage.
    pub const COMPUTE: Self = Self(0x20);
    /// Vertex and fragment, the stages of a plain graphics pipeline.
    pub const VERTEX_FRAGMENT: Self = Self(Self::VERTEX.0 | Self::FRAGMENT.0);
    /// Every graphics stage.
    pub const ALL_GRAPHICS: Self = Self(0x1F);

    /// Keeps only the bits that name a known stage.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & (Self::ALL_GRAPHICS.0 | Self::COMPUTE.0))
    }

    /// The raw driver bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every stage in `other` is also in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether the two sets share a stage.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether no stage is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The single-stage flags in `self`, in pipeline order.
    pub fn iter(self) -> impl Iterator<Item = ShaderStageFlags> {
        NAMES
            .into_iter()
            .map(|(flag, _)| flag)
            .filter(move |&flag| self.contains(flag))
    }
}

impl BitOr for ShaderStageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ShaderStageFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ShaderStageFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for ShaderStageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let mut sep = "";
        for (flag, name) in NAMES {
            if self.contains(flag) {
                write!(f, "{sep}{name}")?;
                sep = " | ";
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_native_stage_bits() {
        assert_eq!(ShaderStageFlags::VERTEX.bits(), 0x01);
        assert_eq!(ShaderStageFlags::FRAGMENT.bits(), 0x10);
        assert_eq!(ShaderStageFlags::COMPUTE.bits(), 0x20);
        assert_eq!(ShaderStageFlags::from_bits_truncate(0xFF).bits(), 0x3F);
    }

    #[test]
    fn set_operations() {
        let mut stages = ShaderStageFlags::VERTEX;
        stages |= ShaderStageFlags::FRAGMENT;
        assert_eq!(stages, ShaderStageFlags::VERTEX_FRAGMENT);
        assert!(ShaderStageFlags::ALL_GRAPHICS.contains(stages));
        assert!(!stages.intersects(ShaderStageFlags::COMPUTE));
        assert_eq!(
            (stages & ShaderStageFlags::FRAGMENT).iter().collect::<Vec<_>>(),
            vec![ShaderStageFlags::FRAGMENT]
        );
        assert_eq!(stages.to_string(), "VERTEX | FRAGMENT");
        assert_eq!(ShaderStageFlags::NONE.to_string(), "NONE");
    }
}
