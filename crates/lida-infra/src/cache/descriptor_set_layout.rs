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

//! Descriptor-set layouts keyed by their binding list.

use super::{create_or_rollback, destroy_handle, CacheError};
use bytemuck::{Pod, Zeroable};
use lida_core::memory::CacheStats;
use lida_core::renderer::{
    DescriptorBinding, DescriptorSetLayoutId, GraphicsDevice, ResourceKind, MAX_BINDINGS_PER_SET,
};
use lida_data::cache::{hash_words, ContentHash};
use lida_data::{Arena, LruCache};
use std::sync::Arc;

const BINDING_WORDS: usize = 4;

/// The ordered binding list identifying a descriptor-set layout, packed as
/// the bindings' raw words.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct DescriptorSetLayoutKey {
    words: [u32; MAX_BINDINGS_PER_SET * BINDING_WORDS],
    count: u32,
}

impl DescriptorSetLayoutKey {
    /// Packs a binding list into a key.
    ///
    /// ## Errors
    ///
    /// [`CacheError::TooManyBindings`] above [`MAX_BINDINGS_PER_SET`].
    pub fn new(bindings: &[DescriptorBinding]) -> Result<Self, CacheError> {
        if bindings.len() > MAX_BINDINGS_PER_SET {
            return Err(CacheError::TooManyBindings {
                count: bindings.len(),
                max: MAX_BINDINGS_PER_SET,
            });
        }
        let mut key = Self::zeroed();
        for (chunk, binding) in key.words.chunks_exact_mut(BINDING_WORDS).zip(bindings) {
            chunk.copy_from_slice(&binding.to_words());
        }
        key.count = bindings.len() as u32;
        Ok(key)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// Whether the layout has no bindings.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The bindings in declaration order.
    pub fn bindings(&self) -> impl Iterator<Item = DescriptorBinding> + '_ {
        self.words()
            .chunks_exact(BINDING_WORDS)
            .filter_map(|c| DescriptorBinding::from_words([c[0], c[1], c[2], c[3]]))
    }

    /// The words of the live bindings.
    pub fn words(&self) -> &[u32] {
        &self.words[..self.len() * BINDING_WORDS]
    }
}

impl ContentHash for DescriptorSetLayoutKey {
    fn content_hash(&self) -> u32 {
        hash_words(self.words())
    }
}

/// Deduplicates descriptor-set layouts by binding list.
#[derive(Debug)]
pub struct DescriptorSetLayoutCache {
    device: Arc<dyn GraphicsDevice>,
    lru: LruCache<DescriptorSetLayoutKey, DescriptorSetLayoutId>,
}

impl DescriptorSetLayoutCache {
    /// Builds the cache in a budget reserved in `arena`.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        arena: &mut Arena,
        budget: usize,
    ) -> Result<Self, CacheError> {
        let lru = LruCache::new_in(arena, "descriptor set layout", budget, destroy_handle(&device))?;
        Ok(Self { device, lru })
    }

    /// Returns the layout for `bindings`, creating it on first use.
    ///
    /// Binding order is part of the identity: the same bindings in another
    /// order name another layout.
    pub fn create_or_get(
        &mut self,
        arena: &mut Arena,
        bindings: &[DescriptorBinding],
    ) -> Result<DescriptorSetLayoutId, CacheError> {
        let key = DescriptorSetLayoutKey::new(bindings)?;
        let device = &*self.device;
        create_or_rollback(
            &mut self.lru,
            arena,
            key,
            ResourceKind::DescriptorSetLayout,
            |_, _| {
                let id = device.create_descriptor_set_layout(bindings)?;
                log::debug!(
                    "Created descriptor set layout {} with {} bindings",
                    id.0,
                    bindings.len()
                );
                Ok(id)
            },
        )
    }

    /// Destroys every cached layout.
    pub fn destroy_all(&mut self, arena: &mut Arena) {
        self.lru.destroy_all(arena);
    }

    /// Cached layouts, most recently used first.
    pub fn entries<'a>(
        &self,
        arena: &'a Arena,
    ) -> impl Iterator<Item = (&'a DescriptorSetLayoutKey, &'a DescriptorSetLayoutId)> {
        self.lru.iter(arena)
    }

    /// Number of cached layouts.
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
    use lida_core::renderer::{DescriptorType, ShaderStageFlags};

    #[test]
    fn binding_order_is_part_of_the_key() {
        let (vs, fs) = (ShaderStageFlags::VERTEX, ShaderStageFlags::FRAGMENT);
        let ubo = DescriptorBinding::new(0, DescriptorType::UniformBuffer, vs);
        let tex = DescriptorBinding::new(1, DescriptorType::CombinedImageSampler, fs);
        let forward = DescriptorSetLayoutKey::new(&[ubo, tex]).unwrap();
        let reversed = DescriptorSetLayoutKey::new(&[tex, ubo]).unwrap();
        assert_ne!(forward, reversed);
        assert_eq!(forward.bindings().collect::<Vec<_>>(), vec![ubo, tex]);
        assert_eq!(forward.content_hash(), hash_words(forward.words()));
    }

    #[test]
    fn too_many_bindings_is_rejected() {
        let binding =
            DescriptorBinding::new(0, DescriptorType::Sampler, ShaderStageFlags::FRAGMENT);
        assert!(matches!(
            DescriptorSetLayoutKey::new(&[binding; MAX_BINDINGS_PER_SET + 1]),
            Err(CacheError::TooManyBindings { count: 9, .. })
        ));
        assert!(DescriptorSetLayoutKey::new(&[]).unwrap().is_empty());
    }
}
