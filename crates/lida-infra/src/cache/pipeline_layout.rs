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

//! Pipeline layouts keyed by set layouts and push-constant range.

use super::{create_or_rollback, destroy_handle, CacheError};
use bytemuck::{Pod, Zeroable};
use lida_core::memory::CacheStats;
use lida_core::renderer::{
    DescriptorSetLayoutId, GraphicsDevice, PipelineLayoutDescriptor, PipelineLayoutId,
    PushConstantRange, ResourceKind, MAX_DESCRIPTOR_SETS,
};
use lida_data::cache::{hash_words, ContentHash};
use lida_data::{Arena, LruCache};
use std::sync::Arc;

/// The set layouts and push-constant range identifying a pipeline layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PipelineLayoutKey {
    set_layouts: [DescriptorSetLayoutId; MAX_DESCRIPTOR_SETS],
    count: u32,
    has_push_constants: u32,
    push_constants: [u32; 3],
    _pad: u32,
}

impl PipelineLayoutKey {
    /// Packs set layouts and an optional push-constant range into a key.
    ///
    /// ## Errors
    ///
    /// [`CacheError::TooManySets`] above [`MAX_DESCRIPTOR_SETS`].
    pub fn new(
        set_layouts: &[DescriptorSetLayoutId],
        push_constants: Option<PushConstantRange>,
    ) -> Result<Self, CacheError> {
        if set_layouts.len() > MAX_DESCRIPTOR_SETS {
            return Err(CacheError::TooManySets {
                count: set_layouts.len(),
                max: MAX_DESCRIPTOR_SETS,
            });
        }
        let mut key = Self::zeroed();
        key.set_layouts[..set_layouts.len()].copy_from_slice(set_layouts);
        key.count = set_layouts.len() as u32;
        if let Some(range) = push_constants {
            key.has_push_constants = 1;
            key.push_constants = range.to_words();
        }
        Ok(key)
    }

    /// The set layouts by set index.
    pub fn set_layouts(&self) -> &[DescriptorSetLayoutId] {
        &self.set_layouts[..self.count as usize]
    }

    /// The push-constant range.
    pub fn push_constants(&self) -> Option<PushConstantRange> {
        (self.has_push_constants != 0).then(|| PushConstantRange::from_words(self.push_constants))
    }
}

impl ContentHash for PipelineLayoutKey {
    fn content_hash(&self) -> u32 {
        let mut handles = [0u32; MAX_DESCRIPTOR_SETS * 2];
        for (chunk, layout) in handles.chunks_exact_mut(2).zip(self.set_layouts()) {
            chunk[0] = layout.0 as u32;
            chunk[1] = (layout.0 >> 32) as u32;
        }
        let sets = hash_words(&handles[..self.set_layouts().len() * 2]);
        let range_words = (self.has_push_constants != 0).then_some(self.push_constants);
        let ranges = hash_words(range_words.as_ref().map_or(&[][..], |w| &w[..]));
        (sets ^ ranges)
            .wrapping_add(sets << 3)
            .wrapping_add(0x0069_6969u32.wrapping_mul(ranges << 6))
    }
}

/// Deduplicates pipeline layouts.
#[derive(Debug)]
pub struct PipelineLayoutCache {
    device: Arc<dyn GraphicsDevice>,
    lru: LruCache<PipelineLayoutKey, PipelineLayoutId>,
}

impl PipelineLayoutCache {
    /// Builds the cache in a budget reserved in `arena`.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        arena: &mut Arena,
        budget: usize,
    ) -> Result<Self, CacheError> {
        let lru = LruCache::new_in(arena, "pipeline layout", budget, destroy_handle(&device))?;
        Ok(Self { device, lru })
    }

    /// Returns the pipeline layout for the given set layouts and range,
    /// creating it on first use.
    pub fn create_or_get(
        &mut self,
        arena: &mut Arena,
        set_layouts: &[DescriptorSetLayoutId],
        push_constants: Option<PushConstantRange>,
    ) -> Result<PipelineLayoutId, CacheError> {
        let key = PipelineLayoutKey::new(set_layouts, push_constants)?;
        let device = &*self.device;
        create_or_rollback(&mut self.lru, arena, key, ResourceKind::PipelineLayout, |key, _| {
            let ranges = push_constants.as_slice();
            let id = device.create_pipeline_layout(&PipelineLayoutDescriptor {
                set_layouts: key.set_layouts(),
                push_constant_ranges: ranges,
            })?;
            log::debug!(
                "Created pipeline layout {} with {} sets and {} push-constant ranges",
                id.0,
                key.set_layouts().len(),
                ranges.len()
            );
            Ok(id)
        })
    }

    /// Destroys every cached pipeline layout.
    pub fn destroy_all(&mut self, arena: &mut Arena) {
        self.lru.destroy_all(arena);
    }

    /// Cached pipeline layouts, most recently used first.
    pub fn entries<'a>(
        &self,
        arena: &'a Arena,
    ) -> impl Iterator<Item = (&'a PipelineLayoutKey, &'a PipelineLayoutId)> {
        self.lru.iter(arena)
    }

    /// Number of cached pipeline layouts.
    pub fn len(&self) -> usize {
        self.lru.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lru.is_empty()
    }

    /// Hit and miss counters.
    pub fn stats(&self) -> CacheStats {
        self.lru.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lida_core::renderer::ShaderStageFlags;

    #[test]
    fn push_constants_change_the_hash() {
        let sets = [DescriptorSetLayoutId(3), DescriptorSetLayoutId(9)];
        let bare = PipelineLayoutKey::new(&sets, None).unwrap();
        let ranged = PipelineLayoutKey::new(
            &sets,
            Some(PushConstantRange {
                stages: ShaderStageFlags::VERTEX,
                offset: 0,
                size: 64,
            }),
        )
        .unwrap();
        assert_ne!(bare, ranged);
        assert_eq!(bare.push_constants(), None);
        assert_eq!(ranged.push_constants().map(|r| r.size), Some(64));
        assert_ne!(bare.content_hash(), ranged.content_hash());
        assert_eq!(bare.content_hash(), PipelineLayoutKey::new(&sets, None).unwrap().content_hash());
    }

    #[test]
    fn too_many_sets_is_rejected() {
        let sets = [DescriptorSetLayoutId(1); MAX_DESCRIPTOR_SETS + 1];
        assert!(matches!(
            PipelineLayoutKey::new(&sets, None),
            Err(CacheError::TooManySets { count: 5, .. })
        ));
    }
}
