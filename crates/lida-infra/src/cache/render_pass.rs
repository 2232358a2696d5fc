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

//! Render passes keyed by their attachment list.

use super::{create_or_rollback, destroy_handle, CacheError};
use bytemuck::{Pod, Zeroable};
use lida_core::memory::CacheStats;
use lida_core::renderer::{
    AttachmentDescription, AttachmentInfo, AttachmentOp, AttachmentReference, Format,
    GraphicsDevice, ImageLayout, LoadOp, RenderPassDescriptor, RenderPassId, ResourceKind,
    StoreOp, MAX_ATTACHMENTS, MAX_COLOR_ATTACHMENTS,
};
use lida_data::cache::{hash_words, ContentHash};
use lida_data::{Arena, LruCache};
use std::sync::Arc;

const ATTACHMENT_WORDS: usize = 6;

/// The ordered attachment list identifying a render pass, packed as the
/// attachments' raw words.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct RenderPassKey {
    words: [u32; MAX_ATTACHMENTS * ATTACHMENT_WORDS],
    count: u32,
}

impl RenderPassKey {
    /// Validates an attachment list and packs it into a key.
    ///
    /// ## Errors
    ///
    /// - [`CacheError::TooManyAttachments`] above [`MAX_ATTACHMENTS`].
    /// - [`CacheError::MultipleDepthAttachments`] if two attachments work in a
    ///   depth layout.
    /// - [`CacheError::TooManyColorAttachments`] above [`MAX_COLOR_ATTACHMENTS`].
    pub fn new(attachments: &[AttachmentInfo]) -> Result<Self, CacheError> {
        if attachments.len() > MAX_ATTACHMENTS {
            return Err(CacheError::TooManyAttachments {
                count: attachments.len(),
                max: MAX_ATTACHMENTS,
            });
        }
        let depth = attachments
            .iter()
            .filter(|a| a.work_layout.is_depth_attachment())
            .count();
        if depth > 1 {
            return Err(CacheError::MultipleDepthAttachments);
        }
        let color = attachments.len() - depth;
        if color > MAX_COLOR_ATTACHMENTS {
            return Err(CacheError::TooManyColorAttachments {
                count: color,
                max: MAX_COLOR_ATTACHMENTS,
            });
        }

        let mut key = Self::zeroed();
        for (chunk, attachment) in key.words.chunks_exact_mut(ATTACHMENT_WORDS).zip(attachments) {
            chunk.copy_from_slice(&attachment.to_words());
        }
        key.count = attachments.len() as u32;
        Ok(key)
    }

    /// Number of attachments.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// Whether the pass has no attachments.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The words of the live attachments, in declaration order.
    pub fn words(&self) -> &[u32] {
        &self.words[..self.len() * ATTACHMENT_WORDS]
    }
}

impl ContentHash for RenderPassKey {
    fn content_hash(&self) -> u32 {
        hash_words(self.words())
    }
}

fn load_op(op: AttachmentOp) -> LoadOp {
    match op {
        AttachmentOp::Clear => LoadOp::Clear,
        AttachmentOp::Load => LoadOp::Load,
        _ => LoadOp::DontCare,
    }
}

fn store_op(op: AttachmentOp) -> StoreOp {
    match op {
        AttachmentOp::Store => StoreOp::Store,
        _ => StoreOp::DontCare,
    }
}

const NO_DESCRIPTION: AttachmentDescription = AttachmentDescription {
    format: Format::Undefined,
    load_op: LoadOp::DontCare,
    store_op: StoreOp::DontCare,
    initial_layout: ImageLayout::Undefined,
    final_layout: ImageLayout::Undefined,
};

const NO_REFERENCE: AttachmentReference = AttachmentReference {
    attachment: 0,
    layout: ImageLayout::Undefined,
};

/// Translates an attachment list into driver descriptions and creates the
/// render pass.
fn create(
    device: &dyn GraphicsDevice,
    attachments: &[AttachmentInfo],
) -> Result<RenderPassId, CacheError> {
    let mut descriptions = [NO_DESCRIPTION; MAX_ATTACHMENTS];
    let mut colors = [NO_REFERENCE; MAX_COLOR_ATTACHMENTS];
    let mut color_count = 0;
    let mut depth_reference = None;

    for (index, info) in attachments.iter().enumerate() {
        descriptions[index] = AttachmentDescription {
            format: info.format,
            load_op: load_op(info.load_op),
            store_op: store_op(info.store_op),
            initial_layout: info.initial_layout,
            final_layout: info.final_layout,
        };
        let reference = AttachmentReference {
            attachment: index as u32,
            layout: info.work_layout,
        };
        if info.work_layout.is_depth_attachment() {
            depth_reference = Some(reference);
        } else {
            colors[color_count] = reference;
            color_count += 1;
        }
    }

    let descriptor = RenderPassDescriptor {
        attachments: &descriptions[..attachments.len()],
        color_references: &colors[..color_count],
        depth_reference,
    };
    let id = device.create_render_pass(&descriptor)?;
    log::debug!(
        "Created render pass {} ({} color, depth: {})",
        id.0,
        color_count,
        depth_reference.is_some()
    );
    Ok(id)
}

/// Deduplicates render passes by attachment list.
#[derive(Debug)]
pub struct RenderPassCache {
    device: Arc<dyn GraphicsDevice>,
    lru: LruCache<RenderPassKey, RenderPassId>,
}

impl RenderPassCache {
    /// Builds the cache in a budget reserved in `arena`.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        arena: &mut Arena,
        budget: usize,
    ) -> Result<Self, CacheError> {
        let lru = LruCache::new_in(arena, "render pass", budget, destroy_handle(&device))?;
        Ok(Self { device, lru })
    }

    /// Returns the render pass for `attachments`, creating it on first use.
    ///
    /// Load ops other than `Clear` and `Load` become "don't care", as do store
    /// ops other than `Store`. The attachment working in a depth layout becomes
    /// the depth reference and every other attachment a color reference.
    ///
    /// ## Errors
    ///
    /// Key validation errors from [`RenderPassKey::new`], or
    /// [`CacheError::Resource`] if the driver fails, in which case nothing is
    /// cached.
    pub fn create_or_get(
        &mut self,
        arena: &mut Arena,
        attachments: &[AttachmentInfo],
    ) -> Result<RenderPassId, CacheError> {
        let key = RenderPassKey::new(attachments)?;
        let device = &*self.device;
        create_or_rollback(&mut self.lru, arena, key, ResourceKind::RenderPass, |_, _| {
            create(device, attachments)
        })
    }

    /// Destroys every cached render pass.
    pub fn destroy_all(&mut self, arena: &mut Arena) {
        self.lru.destroy_all(arena);
    }

    /// Cached render passes, most recently used first.
    pub fn entries<'a>(
        &self,
        arena: &'a Arena,
    ) -> impl Iterator<Item = (&'a RenderPassKey, &'a RenderPassId)> {
        self.lru.iter(arena)
    }

    /// Number of cached render passes.
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
    use lida_core::renderer::Format;

    #[test]
    fn key_rejects_bad_attachment_lists() {
        let depth = AttachmentInfo::transient_depth(Format::D32Sfloat);
        let color = AttachmentInfo::present(Format::Bgra8Srgb);
        assert!(matches!(
            RenderPassKey::new(&[color; 5]),
            Err(CacheError::TooManyAttachments { count: 5, .. })
        ));
        assert!(matches!(
            RenderPassKey::new(&[depth, color, depth]),
            Err(CacheError::MultipleDepthAttachments)
        ));
        assert!(matches!(
            RenderPassKey::new(&[color; 4]),
            Err(CacheError::TooManyColorAttachments { count: 4, .. })
        ));
        assert!(RenderPassKey::new(&[color, color, color, depth]).is_ok());
    }

    #[test]
    fn key_hash_covers_only_live_attachments() {
        let color = AttachmentInfo::present(Format::Bgra8Srgb);
        let key = RenderPassKey::new(&[color]).unwrap();
        assert_eq!(key.len(), 1);
        assert_eq!(key.words(), &color.to_words());
        assert_eq!(key.content_hash(), hash_words(&color.to_words()));
        assert_ne!(
            key.content_hash(),
            RenderPassKey::new(&[]).unwrap().content_hash()
        );
    }

    #[test]
    fn ops_translate_to_driver_ops() {
        assert_eq!(load_op(AttachmentOp::Clear), LoadOp::Clear);
        assert_eq!(load_op(AttachmentOp::Load), LoadOp::Load);
        assert_eq!(load_op(AttachmentOp::Store), LoadOp::DontCare);
        assert_eq!(load_op(AttachmentOp::None), LoadOp::DontCare);
        assert_eq!(store_op(AttachmentOp::Store), StoreOp::Store);
        assert_eq!(store_op(AttachmentOp::Clear), StoreOp::DontCare);
        assert_eq!(store_op(AttachmentOp::None), StoreOp::DontCare);
    }
}
