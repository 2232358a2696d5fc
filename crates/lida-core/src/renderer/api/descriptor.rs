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

//! Defines descriptor bindings, descriptor-set layouts and push-constant ranges.
//!
//! These are the shapes recovered by shader reflection and consumed by the
//! descriptor-set-layout and pipeline-layout caches. Everything is fixed-size
//! and `Copy` so it can live inside cache slots without further allocation.

use crate::renderer::api::util::flags::ShaderStageFlags;

/// The maximum number of descriptor sets a pipeline layout can reference.
pub const MAX_DESCRIPTOR_SETS: usize = 4;
/// The maximum number of bindings inside one descriptor set.
pub const MAX_BINDINGS_PER_SET: usize = 8;
/// The maximum number of push-constant ranges a pipeline layout can carry.
pub const MAX_PUSH_CONSTANT_RANGES: usize = 1;

/// The type of resource bound at a descriptor binding.
///
/// Discriminants are the driver's native descriptor type codes.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptorType {
    /// A standalone sampler.
    #[default]
    Sampler = 0,
    /// An image and a sampler bound together.
    CombinedImageSampler = 1,
    /// An image that is read and written without a sampler.
    StorageImage = 3,
    /// A read-only uniform buffer.
    UniformBuffer = 6,
    /// A read/write storage buffer.
    StorageBuffer = 7,
    /// An attachment of the current render pass read as an input.
    InputAttachment = 10,
}

impl DescriptorType {
    /// The type with driver code `raw`, if it is one of the supported types.
    pub const fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Sampler,
            1 => Self::CombinedImageSampler,
            3 => Self::StorageImage,
            6 => Self::UniformBuffer,
            7 => Self::StorageBuffer,
            10 => Self::InputAttachment,
            _ => return None,
        })
    }
}

/// Describes a single binding in a descriptor-set layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DescriptorBinding {
    /// The binding index (`layout(binding = N)` in GLSL).
    pub binding: u32,
    /// The type of resource being bound.
    pub descriptor_type: DescriptorType,
    /// The number of descriptors in the binding (array length, 1 for scalars).
    pub count: u32,
    /// Which shader stages can access this binding.
    pub stages: ShaderStageFlags,
}

impl DescriptorBinding {
    /// Creates a binding with a single descriptor.
    pub const fn new(binding: u32, descriptor_type: DescriptorType, stages: ShaderStageFlags) -> Self {
        Self {
            binding,
            descriptor_type,
            count: 1,
            stages,
        }
    }

    /// The binding as four raw words, in declaration order.
    pub const fn to_words(&self) -> [u32; 4] {
        [
            self.binding,
            self.descriptor_type as u32,
            self.count,
            self.stages.bits(),
        ]
    }

    /// Rebuilds a binding from [`DescriptorBinding::to_words`]. Returns `None`
    /// if the type code is unknown.
    pub const fn from_words(words: [u32; 4]) -> Option<Self> {
        let Some(descriptor_type) = DescriptorType::from_raw(words[1]) else {
            return None;
        };
        Some(Self {
            binding: words[0],
            descriptor_type,
            count: words[2],
            stages: ShaderStageFlags::from_bits_truncate(words[3]),
        })
    }
}

/// An opaque handle to a descriptor-set layout.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
pub struct DescriptorSetLayoutId(pub u64);

/// A block of push-constant memory visible to a set of stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PushConstantRange {
    /// The stages that can read the range.
    pub stages: ShaderStageFlags,
    /// Start of the range, in bytes.
    pub offset: u32,
    /// Size of the range, in bytes.
    pub size: u32,
}

impl PushConstantRange {
    /// The range as three raw words, in declaration order.
    pub const fn to_words(&self) -> [u32; 3] {
        [self.stages.bits(), self.offset, self.size]
    }

    /// Rebuilds a range from [`PushConstantRange::to_words`].
    pub const fn from_words(words: [u32; 3]) -> Self {
        Self {
            stages: ShaderStageFlags::from_bits_truncate(words[0]),
            offset: words[1],
            size: words[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_words_decode_back() {
        let binding = DescriptorBinding {
            binding: 3,
            descriptor_type: DescriptorType::StorageImage,
            count: 4,
            stages: ShaderStageFlags::COMPUTE,
        };
        assert_eq!(DescriptorBinding::from_words(binding.to_words()), Some(binding));
        assert_eq!(DescriptorBinding::from_words([0, 2, 1, 0]), None);
    }

    #[test]
    fn range_words_decode_back() {
        let range = PushConstantRange {
            stages: ShaderStageFlags::VERTEX_FRAGMENT,
            offset: 16,
            size: 48,
        };
        assert_eq!(PushConstantRange::from_words(range.to_words()), range);
    }
}
