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

//! Shader modules keyed by tag, with their reflection data.

use super::{create_or_rollback, destroy_handle, CacheError};
use bytemuck::{Pod, Zeroable};
use lida_core::memory::CacheStats;
use lida_core::renderer::{
    DescriptorBinding, DriverHandle, GraphicsDevice, PushConstantRange, ResourceKind, ShaderError,
    ShaderLoader, ShaderModuleDescriptor, ShaderModuleId, ShaderStageFlags, MAX_BINDINGS_PER_SET,
    MAX_DESCRIPTOR_SETS,
};
use lida_data::cache::{hash_string, ContentHash};
use lida_data::spirv::reflect_with;
use lida_data::{Arena, LruCache, ShaderReflection};
use std::fmt;
use std::sync::Arc;

/// Longest shader tag a key can hold, in bytes.
pub const MAX_SHADER_TAG_LEN: usize = 64;

/// A shader tag stored inline.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct ShaderKey {
    bytes: [u8; MAX_SHADER_TAG_LEN],
    len: u8,
}

impl ShaderKey {
    /// Packs `tag` into a key.
    ///
    /// ## Errors
    ///
    /// [`CacheError::TagTooLong`] above [`MAX_SHADER_TAG_LEN`] bytes.
    pub fn new(tag: &str) -> Result<Self, CacheError> {
        if tag.len() > MAX_SHADER_TAG_LEN {
            return Err(CacheError::TagTooLong {
                tag: tag.to_string(),
                max: MAX_SHADER_TAG_LEN,
            });
        }
        let mut key = Self::zeroed();
        key.bytes[..tag.len()].copy_from_slice(tag.as_bytes());
        key.len = tag.len() as u8;
        Ok(key)
    }

    /// The tag.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

impl fmt::Debug for ShaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShaderKey").field(&self.as_str()).finish()
    }
}

impl ContentHash for ShaderKey {
    fn content_hash(&self) -> u32 {
        hash_string(self.as_str())
    }
}

/// A cached shader module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShaderEntry {
    /// The driver module.
    pub module: ShaderModuleId,
    /// Reflection data, `None` when the bytecode was not SPIR-V.
    pub reflection: Option<ShaderReflection>,
}

impl ShaderEntry {
    /// Stages reported by reflection, empty for unreflected modules.
    pub fn stages(&self) -> ShaderStageFlags {
        self.reflection.map(|r| r.stages).unwrap_or_default()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SetRecord {
    count: u32,
    bindings: [[u32; 4]; MAX_BINDINGS_PER_SET],
}

/// A [`ShaderEntry`] flattened to plain words for storage in a cache slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ShaderRecord {
    module: ShaderModuleId,
    reflected: u32,
    stages: u32,
    local_size: [u32; 3],
    set_count: u32,
    has_push_constants: u32,
    push_constants: [u32; 3],
    sets: [SetRecord; MAX_DESCRIPTOR_SETS],
}

impl From<&ShaderEntry> for ShaderRecord {
    fn from(entry: &ShaderEntry) -> Self {
        let mut record = Self::zeroed();
        record.module = entry.module;
        let Some(reflection) = &entry.reflection else {
            return record;
        };
        record.reflected = 1;
        record.stages = reflection.stages.bits();
        record.local_size = reflection.local_size;
        record.set_count = reflection.set_count as u32;
        if let Some(range) = reflection.push_constants {
            record.has_push_constants = 1;
            record.push_constants = range.to_words();
        }
        for (target, set) in record.sets.iter_mut().zip(&reflection.sets) {
            target.count = set.len() as u32;
            for (words, binding) in target.bindings.iter_mut().zip(set.bindings()) {
                *words = binding.to_words();
            }
        }
        record
    }
}

impl From<&ShaderRecord> for ShaderEntry {
    fn from(record: &ShaderRecord) -> Self {
        let reflection = (record.reflected != 0).then(|| {
            let mut reflection = ShaderReflection {
                stages: ShaderStageFlags::from_bits_truncate(record.stages),
                local_size: record.local_size,
                set_count: record.set_count as usize,
                push_constants: (record.has_push_constants != 0)
                    .then(|| PushConstantRange::from_words(record.push_constants)),
                ..ShaderReflection::default()
            };
            for (set, stored) in reflection.sets.iter_mut().zip(&record.sets) {
                let live = &stored.bindings[..stored.count as usize];
                for binding in live.iter().filter_map(|w| DescriptorBinding::from_words(*w)) {
                    set.try_push(binding);
                }
            }
            reflection
        });
        ShaderEntry {
            module: record.module,
            reflection,
        }
    }
}

impl From<ShaderRecord> for DriverHandle {
    fn from(record: ShaderRecord) -> Self {
        DriverHandle::ShaderModule(record.module)
    }
}

/// Copies the bytecode into scratch words, reflects it, and creates the module.
fn compile(
    device: &dyn GraphicsDevice,
    arena: &mut Arena,
    tag: &str,
    bytes: &[u8],
) -> Result<ShaderEntry, CacheError> {
    if bytes.len() % 4 != 0 {
        return Err(ShaderError::UnalignedBytecode {
            tag: tag.to_string(),
            len: bytes.len(),
        }
        .into());
    }

    let mut scratch = arena.scratch();
    let code = scratch.alloc::<u32>(bytes.len() / 4)?;
    for (word, chunk) in code.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    let reflection = match reflect_with(code, &mut scratch) {
        Ok(reflection) => Some(reflection),
        Err(err) if err.is_soft() => {
            log::warn!("Shader '{tag}' is not valid SPIR-V ({err}); caching it unreflected");
            None
        }
        Err(source) => {
            log::error!("Shader '{tag}' failed reflection: {source}");
            return Err(CacheError::Reflect {
                tag: tag.to_string(),
                source,
            });
        }
    };

    let module = device.create_shader_module(&ShaderModuleDescriptor {
        label: Some(tag),
        code,
        stages: reflection.map(|r| r.stages).unwrap_or_default(),
    })?;
    log::debug!("Created shader module {} for '{}'", module.0, tag);
    Ok(ShaderEntry { module, reflection })
}

/// Deduplicates shader modules by tag.
#[derive(Debug)]
pub struct ShaderCache {
    device: Arc<dyn GraphicsDevice>,
    lru: LruCache<ShaderKey, ShaderRecord>,
}

impl ShaderCache {
    /// Builds the cache in a budget reserved in `arena`.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        arena: &mut Arena,
        budget: usize,
    ) -> Result<Self, CacheError> {
        let lru = LruCache::new_in(arena, "shader", budget, destroy_handle(&device))?;
        Ok(Self { device, lru })
    }

    /// Returns the module for `tag`, loading and reflecting it on first use.
    ///
    /// On a miss `loader.load` and `loader.release` are each called once. The
    /// bytecode is copied into scratch memory from `arena` for reflection.
    /// Bytecode without the SPIR-V magic number is still handed to the driver
    /// and cached with no reflection data.
    ///
    /// ## Errors
    ///
    /// Load, reflection and driver failures. Nothing is cached on error.
    pub fn create_or_get(
        &mut self,
        arena: &mut Arena,
        tag: &str,
        loader: &dyn ShaderLoader,
    ) -> Result<ShaderEntry, CacheError> {
        let key = ShaderKey::new(tag)?;
        let device = &*self.device;
        let record = create_or_rollback(
            &mut self.lru,
            arena,
            key,
            ResourceKind::ShaderModule,
            |_, arena| {
                let bytes = loader.load(tag)?;
                let result = compile(device, arena, tag, &bytes);
                loader.release(tag, bytes);
                result.map(|entry| ShaderRecord::from(&entry))
            },
        )?;
        Ok(ShaderEntry::from(&record))
    }

    /// The cached entry for `tag`, without touching recency.
    pub fn get(&self, arena: &Arena, tag: &str) -> Option<ShaderEntry> {
        let key = ShaderKey::new(tag).ok()?;
        self.lru.search(arena, &key).map(ShaderEntry::from)
    }

    /// Destroys every cached module.
    pub fn destroy_all(&mut self, arena: &mut Arena) {
        self.lru.destroy_all(arena);
    }

    /// Cached modules, most recently used first.
    pub fn entries<'a>(
        &self,
        arena: &'a Arena,
    ) -> impl Iterator<Item = (&'a ShaderKey, ShaderEntry)> {
        self.lru
            .iter(arena)
            .map(|(key, record)| (key, ShaderEntry::from(record)))
    }

    /// Number of cached modules.
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

    #[test]
    fn key_round_trips_the_tag() {
        let key = ShaderKey::new("shaders/quad.vert").unwrap();
        assert_eq!(key.as_str(), "shaders/quad.vert");
        assert_eq!(key.content_hash(), hash_string("shaders/quad.vert"));
        assert_eq!(format!("{key:?}"), "ShaderKey(\"shaders/quad.vert\")");
    }

    #[test]
    fn record_keeps_the_reflection() {
        let vs = ShaderStageFlags::VERTEX;
        let mut reflection = ShaderReflection {
            stages: vs,
            set_count: 2,
            push_constants: Some(PushConstantRange {
                stages: vs,
                offset: 0,
                size: 64,
            }),
            ..ShaderReflection::default()
        };
        reflection.sets[1].try_push(DescriptorBinding::new(
            2,
            lida_core::renderer::DescriptorType::UniformBuffer,
            vs,
        ));
        let entry = ShaderEntry {
            module: ShaderModuleId(5),
            reflection: Some(reflection),
        };
        assert_eq!(ShaderEntry::from(&ShaderRecord::from(&entry)), entry);

        let bare = ShaderEntry {
            module: ShaderModuleId(6),
            reflection: None,
        };
        let record = ShaderRecord::from(&bare);
        assert_eq!(ShaderEntry::from(&record), bare);
        assert_eq!(DriverHandle::from(record), DriverHandle::ShaderModule(ShaderModuleId(6)));
    }

    #[test]
    fn overlong_tag_is_rejected() {
        let tag = "x".repeat(MAX_SHADER_TAG_LEN + 1);
        assert!(matches!(
            ShaderKey::new(&tag),
            Err(CacheError::TagTooLong { max: MAX_SHADER_TAG_LEN, .. })
        ));
        assert!(ShaderKey::new(&tag[1..]).is_ok());
    }
}
