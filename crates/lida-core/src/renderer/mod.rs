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

//! Provides the public, driver-agnostic contracts for the caching layer.
//!
//! This module defines the "common language" between the caches and whatever
//! graphics driver sits underneath them: plain data types describing render
//! passes, descriptor bindings and pipeline layouts, opaque handle newtypes,
//! and the [`GraphicsDevice`] / [`ShaderLoader`] traits that a host
//! application implements.
//!
//! The caches in `lida-infra` only ever talk to the driver through these
//! traits, so the same code runs on a real backend or on the headless device
//! used in tests.

pub mod api;
pub mod error;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::{ResourceError, ShaderError};
pub use self::traits::{GraphicsDevice, ShaderLoader};
