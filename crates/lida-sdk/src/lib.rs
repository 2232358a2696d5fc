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

//! The public-facing facade of lida.
//!
//! A [`Gfx`] owns the arena and the four resource caches for the lifetime of
//! a device. It is built from a [`GfxConfig`], a [`GraphicsDevice`], and a
//! [`ShaderLoader`], and tears every cached object down exactly once.
//!
//! [`GraphicsDevice`]: lida_core::GraphicsDevice
//! [`ShaderLoader`]: lida_core::ShaderLoader

mod config;
mod gfx;

pub use config::{BudgetConfig, GfxConfig};
pub use gfx::{Gfx, GfxStats};

pub mod prelude {
    pub use crate::{Gfx, GfxConfig};
    pub use lida_core::renderer::{
        AttachmentInfo, AttachmentOp, DescriptorBinding, DescriptorSetLayoutId, DescriptorType,
        Format, GraphicsDevice, ImageLayout, PipelineLayoutId, PushConstantRange, RenderPassId,
        ShaderError, ShaderLoader, ShaderModuleId, ShaderStageFlags,
    };
    pub use lida_data::ShaderReflection;
    pub use lida_infra::{CacheError, FsShaderLoader, HeadlessDevice, ShaderEntry};
}
