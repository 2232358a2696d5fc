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

use lida_core::renderer::{DescriptorType, ResourceError, ShaderError};
use lida_data::{ArenaError, LruError, ReflectError};
use thiserror::Error;

/// Errors raised by the resource caches.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A render pass declares more attachments than a key holds.
    #[error("render pass with {count} attachments exceeds the limit of {max}")]
    TooManyAttachments {
        /// Attachments requested.
        count: usize,
        /// The limit.
        max: usize,
    },
    /// A render pass declares more color attachments than supported.
    #[error("render pass with {count} color attachments exceeds the limit of {max}")]
    TooManyColorAttachments {
        /// Color attachments requested.
        count: usize,
        /// The limit.
        max: usize,
    },
    /// A render pass declares two depth attachments.
    #[error("render pass declares more than one depth attachment")]
    MultipleDepthAttachments,
    /// A descriptor-set layout declares more bindings than a key holds.
    #[error("descriptor set layout with {count} bindings exceeds the limit of {max}")]
    TooManyBindings {
        /// Bindings requested.
        count: usize,
        /// The limit.
        max: usize,
    },
    /// A pipeline layout declares more set layouts than a key holds.
    #[error("pipeline layout with {count} set layouts exceeds the limit of {max}")]
    TooManySets {
        /// Set layouts requested.
        count: usize,
        /// The limit.
        max: usize,
    },
    /// A shader tag is longer than a key holds.
    #[error("shader tag '{tag}' is longer than {max} bytes")]
    TagTooLong {
        /// The tag.
        tag: String,
        /// The limit.
        max: usize,
    },
    /// Two shaders declare the same binding with different descriptor types.
    #[error("set {set} binding {binding} is {existing:?} in one stage and {found:?} in another")]
    BindingConflict {
        /// The set index.
        set: u32,
        /// The binding index.
        binding: u32,
        /// The type seen first.
        existing: DescriptorType,
        /// The conflicting type.
        found: DescriptorType,
    },
    /// A shader could not be loaded.
    #[error(transparent)]
    Shader(#[from] ShaderError),
    /// The driver failed to create an object.
    #[error(transparent)]
    Resource(#[from] ResourceError),
    /// A shader's bytecode could not be reflected.
    #[error("reflection of shader '{tag}' failed: {source}")]
    Reflect {
        /// The shader tag.
        tag: String,
        /// The reflection error.
        source: ReflectError,
    },
    /// A cache could not be built.
    #[error(transparent)]
    Lru(#[from] LruError),
    /// The arena ran out of memory.
    #[error(transparent)]
    Arena(#[from] ArenaError),
}
