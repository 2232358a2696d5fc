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

//! Shader module descriptors and handles.

use crate::renderer::api::util::flags::ShaderStageFlags;

/// Describes a shader module to be created by the `GraphicsDevice`.
#[derive(Debug, Clone, Copy)]
pub struct ShaderModuleDescriptor<'a> {
    /// The tag the module was loaded under, for debugging.
    pub label: Option<&'a str>,
    /// The SPIR-V words of the module.
    pub code: &'a [u32],
    /// The stages reflected from the module, or `NONE` if it was not reflected.
    pub stages: ShaderStageFlags,
}

/// An opaque handle representing a compiled shader module.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShaderModuleId(pub u64);
