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

//! Content-addressed caches of driver objects.
//!
//! Each cache pairs a fixed-size plain-data key with an [`LruCache`] whose
//! slots live in a budget reserved from the arena at construction, so every
//! lookup takes that arena. A lookup that misses builds the driver object and
//! stores its handle; a failed build leaves no entry behind.

mod descriptor_set_layout;
mod error;
mod pipeline_layout;
mod render_pass;
mod resources;
mod shader;

pub use descriptor_set_layout::{DescriptorSetLayoutCache, DescriptorSetLayoutKey};
pub use error::CacheError;
pub use pipeline_layout::{PipelineLayoutCache, PipelineLayoutKey};
pub use render_pass::{RenderPassCache, RenderPassKey};
pub use resources::{merge_reflection, CacheBudgets, ResourceCaches};
pub use shader::{ShaderCache, ShaderEntry, ShaderKey, MAX_SHADER_TAG_LEN};

use bytemuck::Pod;
use lida_core::renderer::{DriverHandle, GraphicsDevice, ResourceKind};
use lida_data::cache::{ContentHash, DestroyFn};
use lida_data::{Arena, LruCache};
use std::sync::Arc;

/// A destroy callback that releases the payload's handle through `device`.
fn destroy_handle<K, V>(device: &Arc<dyn GraphicsDevice>) -> DestroyFn<K, V>
where
    V: Copy + Into<DriverHandle>,
{
    let device = Arc::clone(device);
    Box::new(move |_: &K, value: &mut V| device.destroy((*value).into()))
}

/// Looks `key` up and runs `create` on a miss, removing the fresh entry again
/// if `create` fails. `create` may use the arena for scratch memory.
fn create_or_rollback<K, V, F>(
    lru: &mut LruCache<K, V>,
    arena: &mut Arena,
    key: K,
    kind: ResourceKind,
    create: F,
) -> Result<V, CacheError>
where
    K: ContentHash + Eq + Pod,
    V: Pod,
    F: FnOnce(&K, &mut Arena) -> Result<V, CacheError>,
{
    let slot = {
        let lookup = lru.get(arena, key);
        if !lookup.created {
            return Ok(*lookup.value);
        }
        lookup.slot
    };
    match create(&key, arena) {
        Ok(value) => {
            if let Some(stored) = lru.value_mut(arena, slot) {
                *stored = value;
            }
            Ok(value)
        }
        Err(err) => {
            lru.remove_slot(arena, slot);
            log::error!("Failed to create {kind}, dropped cache slot {slot}: {err}");
            Err(err)
        }
    }
}
