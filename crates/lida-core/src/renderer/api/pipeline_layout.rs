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

//! Pipeline layout descriptors.

use crate::renderer::api::descriptor::{DescriptorSetLayoutId, PushConstantRange};

/// An opaque handle to a pipeline layout.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
pub struct PipelineLayoutId(pub u64);

/// A descriptor for a [`PipelineLayoutId`].
/// Defines the set of resource bindings a pipeline can access.
#[derive(Debug, Clone, Copy)]
pub struct PipelineLayoutDescriptor<'a> {
    /// The descriptor-set layouts used by this pipeline, indexed by set number.
    pub set_layouts: &'a [DescriptorSetLayoutId],
    /// The push-constant ranges visible to the pipeline.
    pub push_constant_ranges: &'a [PushConstantRange],
}
