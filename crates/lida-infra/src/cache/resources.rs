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

use super::{
    CacheError, DescriptorSetLayoutCache, PipelineLayoutCache, RenderPassCache, ShaderCache,
    ShaderEntry,
};
use lida_core::memory::ArenaStats;
use lida_core::renderer::{
    AttachmentInfo, DescriptorBinding, DescriptorSetLayoutId, GraphicsDevice, PipelineLayoutId,
    PushConstantRange, RenderPassId, ShaderLoader, MAX_BINDINGS_PER_SET, MAX_DESCRIPTOR_SETS,
};
use lida_data::{Arena, ShaderReflection};
use std::fmt;
use std::sync::Arc;

/// Byte budgets of the four caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheBudgets {
    /// Render pass cache budget.
    pub render_pass: usize,
    /// Shader cache budget.
    pub shader: usize,
    /// Descriptor-set layout cache budget.
    pub descriptor_set_layout: usize,
    /// Pipeline layout cache budget.
    pub pipeline_layout: usize,
}

impl Default for CacheBudgets {
    fn default() -> Self {
        Self {
            render_pass: 1536,
            shader: 4096,
            descriptor_set_layout: 2048,
            pipeline_layout: 1536,
        }
    }
}

impl CacheBudgets {
    /// Sum of the four budgets.
    pub fn total(&self) -> usize {
        self.render_pass + self.shader + self.descriptor_set_layout + self.pipeline_layout
    }
}

/// Folds the bindings and push constants of `from` into `into`.
///
/// Bindings sharing a set and binding index merge their stage flags and keep
/// the larger count. Push-constant ranges merge their stages and keep the
/// larger size.
///
/// ## Errors
///
/// - [`CacheError::BindingConflict`] if the two declare different descriptor
///   types for one binding.
/// - [`CacheError::TooManyBindings`] if a merged set overflows.
pub fn merge_reflection(
    into: &mut ShaderReflection,
    from: &ShaderReflection,
) -> Result<(), CacheError> {
    into.stages |= from.stages;
    for (index, set) in from.sets().iter().enumerate() {
        let target = &mut into.sets[index];
        for binding in set.bindings() {
            match target.find_mut(binding.binding) {
                Some(existing) if existing.descriptor_type != binding.descriptor_type => {
                    return Err(CacheError::BindingConflict {
                        set: index as u32,
                        binding: binding.binding,
                        existing: existing.descriptor_type,
                        found: binding.descriptor_type,
                    });
                }
                Some(existing) => {
                    existing.stages |= binding.stages;
                    existing.count = existing.count.max(binding.count);
                }
                None => {
                    if !target.try_push(*binding) {
                        return Err(CacheError::TooManyBindings {
                            count: MAX_BINDINGS_PER_SET + 1,
                            max: MAX_BINDINGS_PER_SET,
                        });
                    }
                }
            }
        }
        target.sort();
    }
    into.set_count = into.set_count.max(from.set_count);
    into.push_constants = match (into.push_constants, from.push_constants) {
        (Some(a), Some(b)) => Some(PushConstantRange {
            stages: a.stages | b.stages,
            offset: 0,
            size: a.size.max(b.size),
        }),
        (a, b) => a.or(b),
    };
    Ok(())
}

/// The four resource caches, the device they create objects on, and the
/// arena their slots live in.
pub struct ResourceCaches {
    device: Arc<dyn GraphicsDevice>,
    loader: Box<dyn ShaderLoader>,
    arena: Arena,
    render_passes: RenderPassCache,
    shaders: ShaderCache,
    descriptor_set_layouts: DescriptorSetLayoutCache,
    pipeline_layouts: PipelineLayoutCache,
}

impl ResourceCaches {
    /// Builds the caches, reserving each budget on the permanent side of
    /// `arena` and keeping every slot there. What remains of the arena serves
    /// as scratch memory.
    ///
    /// ## Errors
    ///
    /// [`CacheError::Lru`] if a budget is too small for one entry or does not
    /// fit in the arena.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        loader: Box<dyn ShaderLoader>,
        mut arena: Arena,
        budgets: CacheBudgets,
    ) -> Result<Self, CacheError> {
        let render_passes =
            RenderPassCache::new(Arc::clone(&device), &mut arena, budgets.render_pass)?;
        let shaders = ShaderCache::new(Arc::clone(&device), &mut arena, budgets.shader)?;
        let descriptor_set_layouts = DescriptorSetLayoutCache::new(
            Arc::clone(&device),
            &mut arena,
            budgets.descriptor_set_layout,
        )?;
        let pipeline_layouts =
            PipelineLayoutCache::new(Arc::clone(&device), &mut arena, budgets.pipeline_layout)?;
        log::info!(
            "Resource caches ready: {} bytes reserved, {} bytes of scratch",
            budgets.total(),
            arena.available()
        );
        Ok(Self {
            device,
            loader,
            arena,
            render_passes,
            shaders,
            descriptor_set_layouts,
            pipeline_layouts,
        })
    }

    /// See [`RenderPassCache::create_or_get`].
    pub fn render_pass(
        &mut self,
        attachments: &[AttachmentInfo],
    ) -> Result<RenderPassId, CacheError> {
        self.render_passes.create_or_get(&mut self.arena, attachments)
    }

    /// See [`ShaderCache::create_or_get`].
    pub fn shader(&mut self, tag: &str) -> Result<ShaderEntry, CacheError> {
        self.shaders
            .create_or_get(&mut self.arena, tag, self.loader.as_ref())
    }

    /// See [`DescriptorSetLayoutCache::create_or_get`].
    pub fn descriptor_set_layout(
        &mut self,
        bindings: &[DescriptorBinding],
    ) -> Result<DescriptorSetLayoutId, CacheError> {
        self.descriptor_set_layouts.create_or_get(&mut self.arena, bindings)
    }

    /// See [`PipelineLayoutCache::create_or_get`].
    pub fn pipeline_layout(
        &mut self,
        set_layouts: &[DescriptorSetLayoutId],
        push_constants: Option<PushConstantRange>,
    ) -> Result<PipelineLayoutId, CacheError> {
        self.pipeline_layouts
            .create_or_get(&mut self.arena, set_layouts, push_constants)
    }

    /// Builds the pipeline layout shared by the shaders named by `tags`.
    ///
    /// Each shader goes through the shader cache. Their reflected sets and
    /// push constants are merged with [`merge_reflection`], one set layout is
    /// created or fetched per set, and the pipeline layout over those sets is
    /// created or fetched last. Unreflected shaders contribute nothing.
    pub fn pipeline_layout_for_shaders(
        &mut self,
        tags: &[&str],
    ) -> Result<PipelineLayoutId, CacheError> {
        let mut merged = ShaderReflection::default();
        for tag in tags {
            let entry = self.shader(tag)?;
            match entry.reflection {
                Some(reflection) => merge_reflection(&mut merged, &reflection)?,
                None => log::warn!("Shader '{tag}' has no reflection data and adds no bindings"),
            }
        }

        let mut set_layouts = [DescriptorSetLayoutId::default(); MAX_DESCRIPTOR_SETS];
        for (layout, set) in set_layouts.iter_mut().zip(merged.sets()) {
            *layout = self
                .descriptor_set_layouts
                .create_or_get(&mut self.arena, set.bindings())?;
        }
        self.pipeline_layouts.create_or_get(
            &mut self.arena,
            &set_layouts[..merged.set_count],
            merged.push_constants,
        )
    }

    /// Destroys every cached object, pipeline layouts first and render passes
    /// last.
    pub fn destroy_all(&mut self) {
        self.pipeline_layouts.destroy_all(&mut self.arena);
        self.descriptor_set_layouts.destroy_all(&mut self.arena);
        self.shaders.destroy_all(&mut self.arena);
        self.render_passes.destroy_all(&mut self.arena);
    }

    /// The cached entry for `tag`, without loading it and without touching
    /// recency.
    pub fn cached_shader(&self, tag: &str) -> Option<ShaderEntry> {
        self.shaders.get(&self.arena, tag)
    }

    /// The device objects are created on.
    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// The render pass cache.
    pub fn render_passes(&self) -> &RenderPassCache {
        &self.render_passes
    }

    /// The shader cache.
    pub fn shaders(&self) -> &ShaderCache {
        &self.shaders
    }

    /// The descriptor-set layout cache.
    pub fn descriptor_set_layouts(&self) -> &DescriptorSetLayoutCache {
        &self.descriptor_set_layouts
    }

    /// The pipeline layout cache.
    pub fn pipeline_layouts(&self) -> &PipelineLayoutCache {
        &self.pipeline_layouts
    }

    /// The arena holding every cache slot, for use with the caches' `entries`.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Occupancy of the arena.
    pub fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    /// Logs the counters of every cache at debug level.
    pub fn log_stats(&self) {
        self.render_passes.stats().log_summary("render pass");
        self.shaders.stats().log_summary("shader");
        self.descriptor_set_layouts
            .stats()
            .log_summary("descriptor set layout");
        self.pipeline_layouts.stats().log_summary("pipeline layout");
    }
}

impl fmt::Debug for ResourceCaches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCaches")
            .field("device", &self.device)
            .field("arena", &self.arena.stats())
            .field("render_passes", &self.render_passes)
            .field("shaders", &self.shaders)
            .field("descriptor_set_layouts", &self.descriptor_set_layouts)
            .field("pipeline_layouts", &self.pipeline_layouts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lida_core::renderer::{DescriptorType, ShaderStageFlags};
    use lida_data::spirv::DescriptorSetInfo;

    fn reflection(
        stages: ShaderStageFlags,
        bindings: &[DescriptorBinding],
        push: Option<u32>,
    ) -> ShaderReflection {
        let mut r = ShaderReflection {
            stages,
            set_count: 1,
            ..ShaderReflection::default()
        };
        r.sets[0] = DescriptorSetInfo::from_bindings(bindings).unwrap();
        r.push_constants = push.map(|size| PushConstantRange {
            stages,
            offset: 0,
            size,
        });
        r
    }

    #[test]
    fn merge_combines_stages_and_ranges() {
        let vs = ShaderStageFlags::VERTEX;
        let fs = ShaderStageFlags::FRAGMENT;
        let mut merged = reflection(
            vs,
            &[DescriptorBinding::new(0, DescriptorType::UniformBuffer, vs)],
            Some(64),
        );
        let fragment = reflection(
            fs,
            &[
                DescriptorBinding::new(1, DescriptorType::CombinedImageSampler, fs),
                DescriptorBinding::new(0, DescriptorType::UniformBuffer, fs),
            ],
            Some(80),
        );
        merge_reflection(&mut merged, &fragment).unwrap();

        let bindings = merged.sets[0].bindings();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].stages, ShaderStageFlags::VERTEX_FRAGMENT);
        assert_eq!(bindings[1].stages, fs);
        let range = merged.push_constants.unwrap();
        assert_eq!(range.size, 80);
        assert_eq!(range.stages, ShaderStageFlags::VERTEX_FRAGMENT);
        assert_eq!(merged.stages, ShaderStageFlags::VERTEX_FRAGMENT);
    }

    #[test]
    fn merge_rejects_type_conflicts() {
        let vs = ShaderStageFlags::VERTEX;
        let mut merged = reflection(
            vs,
            &[DescriptorBinding::new(0, DescriptorType::UniformBuffer, vs)],
            None,
        );
        let other = reflection(
            vs,
            &[DescriptorBinding::new(0, DescriptorType::StorageBuffer, vs)],
            None,
        );
        assert!(matches!(
            merge_reflection(&mut merged, &other),
            Err(CacheError::BindingConflict {
                set: 0,
                binding: 0,
                existing: DescriptorType::UniformBuffer,
                found: DescriptorType::StorageBuffer,
            })
        ));
    }

    #[test]
    fn default_budgets_sum() {
        assert_eq!(CacheBudgets::default().total(), 9216);
    }
}
