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

//! Driver-agnostic data API.
//!
//! Organized into several logical sub-modules:
//!
//! - **[`format`]**: Pixel formats understood by attachments.
//! - **[`render_pass`]**: Attachment descriptions and render pass descriptors.
//! - **[`descriptor`]**: Descriptor bindings, set layouts and push-constant ranges.
//! - **[`shader`]**: Shader module descriptors and handles.
//! - **[`pipeline_layout`]**: Pipeline layout descriptors and handles.
//! - **[`handle`]**: The tagged driver handle used for destruction.
//! - **[`util`]**: Shader stages and stage flags.

pub mod descriptor;
pub mod format;
pub mod handle;
pub mod pipeline_layout;
pub mod render_pass;
pub mod shader;
pub mod util;

pub use self::descriptor::*;
pub use self::format::*;
pub use self::handle::*;
pub use self::pipeline_layout::*;
pub use self::render_pass::*;
pub use self::shader::*;
pub use self::util::*;
