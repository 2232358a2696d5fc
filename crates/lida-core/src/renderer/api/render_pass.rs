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

//! Attachment descriptions and render pass descriptors.
//!
//! [`AttachmentInfo`] is what callers hand to the render pass cache; it is a
//! compact, hashable description. The cache translates it into the
//! driver-facing [`RenderPassDescriptor`] only when it actually needs to
//! create a new render pass.

use super::format::Format;

/// The maximum number of attachments a single render pass can describe.
pub const MAX_ATTACHMENTS: usize = 4;
/// The maximum number of color attachments (one slot is reserved for depth).
pub const MAX_COLOR_ATTACHMENTS: usize = MAX_ATTACHMENTS - 1;

/// What to do with an attachment's contents, as requested by the caller.
///
/// One enum covers both ends of the pass; the cache maps it onto the
/// separate [`LoadOp`] and [`StoreOp`] the driver expects.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttachmentOp {
    /// Contents are irrelevant.
    #[default]
    None = 0,
    /// Preserve the previous contents when the pass begins.
    Load = 1,
    /// Clear the attachment when the pass begins.
    Clear = 2,
    /// Keep the rendered contents when the pass ends.
    Store = 3,
}

/// The layout an image is in while it is used by a render pass.
///
/// Discriminants are the driver's native layout codes.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageLayout {
    /// The contents are undefined.
    #[default]
    Undefined = 0,
    /// Supports all types of access.
    General = 1,
    /// Optimal for use as a color attachment.
    ColorAttachmentOptimal = 2,
    /// Optimal for use as a depth/stencil attachment.
    DepthStencilAttachmentOptimal = 3,
    /// Optimal for read-only depth/stencil access.
    DepthStencilReadOnlyOptimal = 4,
    /// Optimal for sampling from shaders.
    ShaderReadOnlyOptimal = 5,
    /// Optimal as the source of a transfer.
    TransferSrcOptimal = 6,
    /// Optimal as the destination of a transfer.
    TransferDstOptimal = 7,
    /// Host-written contents, not yet transitioned.
    Preinitialized = 8,
    /// Read-only depth with a writable stencil aspect.
    DepthReadOnlyStencilAttachmentOptimal = 1_000_117_000,
    /// Writable depth with a read-only stencil aspect.
    DepthAttachmentStencilReadOnlyOptimal = 1_000_117_001,
    /// Optimal for use as a depth-only attachment.
    DepthAttachmentOptimal = 1_000_241_000,
    /// Optimal for read-only depth-only access.
    DepthReadOnlyOptimal = 1_000_241_001,
    /// Optimal for use as a stencil-only attachment.
    StencilAttachmentOptimal = 1_000_241_002,
    /// Optimal for read-only stencil-only access.
    StencilReadOnlyOptimal = 1_000_241_003,
    /// Optimal for any read-only access.
    ReadOnlyOptimal = 1_000_314_000,
    /// Optimal for any attachment access.
    AttachmentOptimal = 1_000_314_001,
    /// Ready to be presented to a surface.
    PresentSrc = 1_000_001_002,
}

impl ImageLayout {
    /// Whether attachments used in this layout are bound as the depth/stencil target.
    pub const fn is_depth_attachment(self) -> bool {
        matches!(
            self,
            ImageLayout::DepthStencilAttachmentOptimal
                | ImageLayout::DepthAttachmentStencilReadOnlyOptimal
                | ImageLayout::DepthReadOnlyStencilAttachmentOptimal
                | ImageLayout::DepthAttachmentOptimal
        )
    }
}

/// A caller-side description of one render pass attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttachmentInfo {
    /// The pixel format of the attachment.
    pub format: Format,
    /// What happens to the contents when the pass begins.
    pub load_op: AttachmentOp,
    /// What happens to the contents when the pass ends.
    pub store_op: AttachmentOp,
    /// The layout the image is in before the pass.
    pub initial_layout: ImageLayout,
    /// The layout the image is transitioned to after the pass.
    pub final_layout: ImageLayout,
    /// The layout the image is in during the subpass.
    pub work_layout: ImageLayout,
}

impl AttachmentInfo {
    /// A color attachment that is cleared, stored, and handed to presentation.
    pub const fn present(format: Format) -> Self {
        Self {
            format,
            load_op: AttachmentOp::Clear,
            store_op: AttachmentOp::Store,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::PresentSrc,
            work_layout: ImageLayout::ColorAttachmentOptimal,
        }
    }

    /// A depth attachment that is cleared and discarded after the pass.
    pub const fn transient_depth(format: Format) -> Self {
        Self {
            format,
            load_op: AttachmentOp::Clear,
            store_op: AttachmentOp::None,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::DepthStencilAttachmentOptimal,
            work_layout: ImageLayout::DepthStencilAttachmentOptimal,
        }
    }

    /// The attachment as six raw words, in declaration order.
    pub const fn to_words(&self) -> [u32; 6] {
        [
            self.format as u32,
            self.load_op as u32,
            self.store_op as u32,
            self.initial_layout as u32,
            self.final_layout as u32,
            self.work_layout as u32,
        ]
    }
}

/// How the driver treats an attachment's contents when a pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadOp {
    /// Preserve the previous contents.
    Load,
    /// Clear to a clear value.
    Clear,
    /// The previous contents may be discarded.
    DontCare,
}

/// How the driver treats an attachment's contents when a pass ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// Write the rendered contents back to memory.
    Store,
    /// The rendered contents may be discarded.
    DontCare,
}

/// A driver-facing attachment description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentDescription {
    /// The pixel format of the attachment.
    pub format: Format,
    /// Load behavior at the start of the pass.
    pub load_op: LoadOp,
    /// Store behavior at the end of the pass.
    pub store_op: StoreOp,
    /// Layout before the pass.
    pub initial_layout: ImageLayout,
    /// Layout after the pass.
    pub final_layout: ImageLayout,
}

/// A reference from the subpass to one of the pass attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentReference {
    /// Index into [`RenderPassDescriptor::attachments`].
    pub attachment: u32,
    /// Layout of the attachment during the subpass.
    pub layout: ImageLayout,
}

/// Describes a single-subpass render pass to be created by the `GraphicsDevice`.
#[derive(Debug, Clone, Copy)]
pub struct RenderPassDescriptor<'a> {
    /// All attachments of the pass.
    pub attachments: &'a [AttachmentDescription],
    /// The color targets of the subpass, in order.
    pub color_references: &'a [AttachmentReference],
    /// The depth/stencil target of the subpass, if any.
    pub depth_reference: Option<AttachmentReference>,
}

/// An opaque handle representing a driver render pass object.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderPassId(pub u64);
