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

//! # Lida Infra
//!
//! The concrete layer: the four resource caches that deduplicate driver
//! objects, a headless [`GraphicsDevice`](lida_core::GraphicsDevice) that
//! simulates a driver in software, and a filesystem
//! [`ShaderLoader`](lida_core::ShaderLoader).

#![warn(missing_docs)]

pub mod cache;
pub mod graphics;
pub mod loader;

pub use cache::{
    CacheBudgets, CacheError, DescriptorSetLayoutCache, PipelineLayoutCache, RenderPassCache,
    ResourceCaches, ShaderCache, ShaderEntry,
};
pub use graphics::headless::HeadlessDevice;
pub use loader::FsShaderLoader;
