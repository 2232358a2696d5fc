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

use crate::config::GfxConfig;
use anyhow::{anyhow, Result};
use lida_core::memory::{ArenaStats, CacheStats};
use lida_core::renderer::{
    AttachmentInfo, DescriptorBinding, DescriptorSetLayoutId, GraphicsDevice, PipelineLayoutId,
    PushConstantRange, RenderPassId, ShaderLoader,
};
use lida_data::Arena;
use lida_infra::{ResourceCaches, ShaderEntry};
use std::sync::Arc;

/// Counters of the arena and every cache at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GfxStats {
    /// Arena occupancy.
    pub arena: ArenaStats,
    /// Render pass cache counters.
    pub render_passes: CacheStats,
    /// Shader cache counters.
    pub shaders: CacheStats,
    /// Descriptor-set layout cache counters.
    pub descriptor_set_layouts: CacheStats,
    /// Pipeline layout cache counters.
    pub pipeline_layouts: CacheStats,
}

/// Owns the resource caches of one device.
///
/// Every `create_or_get`-style method returns the cached object when the same
/// description was seen before and creates it on the device otherwise. The
/// caches are destroyed by [`shutdown`](Gfx::shutdown), or on drop.
#[derive(Debug)]
pub struct Gfx {
    config: GfxConfig,
    caches: Option<ResourceCaches>,
}

impl Gfx {
    /// Builds the arena and the caches described by `config`.
    pub fn init(
        config: GfxConfig,
        device: Arc<dyn GraphicsDevice>,
        loader: impl ShaderLoader + 'static,
    ) -> Result<Self> {
        config.validate()?;
        log::info!(
            "Initializing '{}' v{} on GPU {} (debug layers: {})",
            config.app_name,
            config.app_version,
            config.gpu_index,
            config.enable_debug_layers
        );
        let caches = ResourceCaches::new(
            device,
            Box::new(loader),
            Arena::new(config.arena_bytes),
            config.budgets.into(),
        )?;
        Ok(Self {
            config,
            caches: Some(caches),
        })
    }

    /// The config this instance was built from.
    pub fn config(&self) -> &GfxConfig {
        &self.config
    }

    /// Whether [`shutdown`](Gfx::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.caches.is_none()
    }

    /// The underlying caches, until shutdown.
    pub fn caches(&self) -> Option<&ResourceCaches> {
        self.caches.as_ref()
    }

    fn caches_mut(&mut self) -> Result<&mut ResourceCaches> {
        self.caches
            .as_mut()
            .ok_or_else(|| anyhow!("Gfx '{}' has been shut down", self.config.app_name))
    }

    /// The render pass for `attachments`.
    pub fn render_pass(&mut self, attachments: &[AttachmentInfo]) -> Result<RenderPassId> {
        Ok(self.caches_mut()?.render_pass(attachments)?)
    }

    /// The shader module for `tag`, with its reflection data.
    pub fn shader(&mut self, tag: &str) -> Result<ShaderEntry> {
        Ok(self.caches_mut()?.shader(tag)?)
    }

    /// The descriptor-set layout for `bindings`.
    pub fn descriptor_set_layout(
        &mut self,
        bindings: &[DescriptorBinding],
    ) -> Result<DescriptorSetLayoutId> {
        Ok(self.caches_mut()?.descriptor_set_layout(bindings)?)
    }

    /// The pipeline layout over `set_layouts`.
    pub fn pipeline_layout(
        &mut self,
        set_layouts: &[DescriptorSetLayoutId],
        push_constants: Option<PushConstantRange>,
    ) -> Result<PipelineLayoutId> {
        Ok(self
            .caches_mut()?
            .pipeline_layout(set_layouts, push_constants)?)
    }

    /// The pipeline layout shared by the shaders named by `tags`, derived from
    /// their reflection data.
    pub fn pipeline_layout_for_shaders(&mut self, tags: &[&str]) -> Result<PipelineLayoutId> {
        Ok(self.caches_mut()?.pipeline_layout_for_shaders(tags)?)
    }

    /// Current counters, until shutdown.
    pub fn stats(&self) -> Option<GfxStats> {
        self.caches.as_ref().map(|caches| GfxStats {
            arena: caches.arena_stats(),
            render_passes: caches.render_passes().stats(),
            shaders: caches.shaders().stats(),
            descriptor_set_layouts: caches.descriptor_set_layouts().stats(),
            pipeline_layouts: caches.pipeline_layouts().stats(),
        })
    }

    /// Destroys every cached object. Later calls do nothing.
    pub fn shutdown(&mut self) {
        let Some(mut caches) = self.caches.take() else {
            return;
        };
        log::info!("Shutting down '{}'...", self.config.app_name);
        caches.log_stats();
        let arena = caches.arena_stats();
        log::debug!(
            "Arena: {} of {} bytes reserved, {:.1}% peak utilization",
            arena.back_bytes,
            arena.capacity_bytes,
            arena.peak_utilization() * 100.0
        );
        caches.destroy_all();
        log::info!("Resource caches destroyed.");
    }
}

impl Drop for Gfx {
    fn drop(&mut self) {
        self.shutdown();
    }
}
