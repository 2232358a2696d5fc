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

//! The tagged driver handle.
//!
//! Every cached driver object is released through a single
//! [`GraphicsDevice::destroy`](crate::renderer::GraphicsDevice::destroy) entry
//! point that receives one of these variants.

use super::{DescriptorSetLayoutId, PipelineLayoutId, RenderPassId, ShaderModuleId};
use std::fmt;

/// The four kinds of driver objects managed by the caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// A render pass object.
    RenderPass,
    /// A compiled shader module.
    ShaderModule,
    /// A descriptor-set layout.
    DescriptorSetLayout,
    /// A pipeline layout.
    PipelineLayout,
}

impl ResourceKind {
    /// All kinds, in teardown order.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::PipelineLayout,
        ResourceKind::DescriptorSetLayout,
        ResourceKind::ShaderModule,
        ResourceKind::RenderPass,
    ];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::RenderPass => "render pass",
            ResourceKind::ShaderModule => "shader module",
            ResourceKind::DescriptorSetLayout => "descriptor set layout",
            ResourceKind::PipelineLayout => "pipeline layout",
        };
        f.write_str(name)
    }
}

/// An opaque driver object of any cached kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverHandle {
    /// A render pass object.
    RenderPass(RenderPassId),
    /// A compiled shader module.
    ShaderModule(ShaderModuleId),
    /// A descriptor-set layout.
    DescriptorSetLayout(DescriptorSetLayoutId),
    /// A pipeline layout.
    PipelineLayout(PipelineLayoutId),
}

impl DriverHandle {
    /// The kind of object this handle refers to.
    pub const fn kind(&self) -> ResourceKind {
        match self {
            DriverHandle::RenderPass(_) => ResourceKind::RenderPass,
            DriverHandle::ShaderModule(_) => ResourceKind::ShaderModule,
            DriverHandle::DescriptorSetLayout(_) => ResourceKind::DescriptorSetLayout,
            DriverHandle::PipelineLayout(_) => ResourceKind::PipelineLayout,
        }
    }

    /// The raw handle value, regardless of kind.
    pub const fn raw(&self) -> u64 {
        match self {
            DriverHandle::RenderPass(id) => id.0,
            DriverHandle::ShaderModule(id) => id.0,
            DriverHandle::DescriptorSetLayout(id) => id.0,
            DriverHandle::PipelineLayout(id) => id.0,
        }
    }
}

impl From<RenderPassId> for DriverHandle {
    fn from(id: RenderPassId) -> Self {
        DriverHandle::RenderPass(id)
    }
}

impl From<ShaderModuleId> for DriverHandle {
    fn from(id: ShaderModuleId) -> Self {
        DriverHandle::ShaderModule(id)
    }
}

impl From<DescriptorSetLayoutId> for DriverHandle {
    fn from(id: DescriptorSetLayoutId) -> Self {
        DriverHandle::DescriptorSetLayout(id)
    }
}

impl From<PipelineLayoutId> for DriverHandle {
    fn from(id: PipelineLayoutId) -> Self {
        DriverHandle::PipelineLayout(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_kind_and_raw() {
        let handle: DriverHandle = ShaderModuleId(7).into();
        assert_eq!(handle.kind(), ResourceKind::ShaderModule);
        assert_eq!(handle.raw(), 7);
        assert_eq!(
            format!("{}", DriverHandle::from(PipelineLayoutId(1)).kind()),
            "pipeline layout"
        );
    }
}
