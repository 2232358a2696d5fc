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

//! # Lida Data
//!
//! Data layouts and allocators that run without touching the heap after
//! initialization:
//!
//! - [`allocators`]: the two-sided [`Arena`] every budget is carved from.
//! - [`cache`]: the intrusive [`LruCache`] and the content hashes its keys use.
//! - [`spirv`]: the SPIR-V reflection engine, which builds its symbol table in
//!   arena scratch memory.

#![warn(missing_docs)]

pub mod allocators;
pub mod cache;
pub mod spirv;

pub use allocators::{Arena, ArenaError, ArenaPtr, Scratch};
pub use cache::{ContentHash, Lookup, LruCache, LruError};
pub use spirv::{reflect, ReflectError, ShaderReflection};
