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

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// The driver entry points needed by the resource caches.
///
/// Each `create_*` call is expensive and is only issued on a cache miss.
/// Implementations use interior mutability: all methods take `&self`.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a render pass from the provided descriptor.
    /// ## Arguments
    /// * `descriptor` - The attachments and subpass references of the pass.
    /// ## Returns
    /// A `Result` containing the ID of the created render pass or an error if the creation fails.
    /// ## Errors
    /// * `ResourceError` - If the render pass creation fails.
    fn create_render_pass(
        &self,
        descriptor: &RenderPassDescriptor,
    ) -> Result<RenderPassId, ResourceError>;

    /// Creates a shader module from the provided descriptor.
    /// ## Arguments
    /// * `descriptor` - A reference to a `ShaderModuleDescriptor` containing the SPIR-V words.
    /// ## Returns
    /// A `Result` containing the ID of the created shader module or an error if the creation fails.
    /// ## Errors
    /// * `ResourceError` - If the shader module creation fails.
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError>;

    /// Creates a descriptor-set layout from an ordered list of bindings.
    /// ## Arguments
    /// * `bindings` - The bindings of the set, in the order they were requested.
    /// ## Returns
    /// A `Result` containing the ID of the created layout or an error if the creation fails.
    fn create_descriptor_set_layout(
        &self,
        bindings: &[DescriptorBinding],
    ) -> Result<DescriptorSetLayoutId, ResourceError>;

    /// Creates a pipeline layout from the provided descriptor.
    /// ## Arguments
    /// * `descriptor` - A reference to a `PipelineLayoutDescriptor` containing the layout configuration.
    /// ## Returns
    /// A `Result` containing the ID of the created pipeline layout or an error if the creation fails.
    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError>;

    /// Releases a driver object of any kind.
    ///
    /// Called exactly once per object created through this trait, either on
    /// eviction or at teardown.
    fn destroy(&self, handle: DriverHandle);
}
