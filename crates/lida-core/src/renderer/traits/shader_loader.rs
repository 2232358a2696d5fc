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

use crate::renderer::error::ShaderError;

/// Produces SPIR-V bytecode for a shader tag.
///
/// The shader cache calls [`load`](ShaderLoader::load) exactly once per cache
/// miss and hands the buffer back through [`release`](ShaderLoader::release)
/// exactly once when it is done with it, whether or not the module was
/// created successfully.
pub trait ShaderLoader {
    /// Loads the bytecode for `tag`.
    fn load(&self, tag: &str) -> Result<Vec<u8>, ShaderError>;

    /// Returns a buffer produced by [`load`](ShaderLoader::load).
    fn release(&self, tag: &str, bytes: Vec<u8>) {
        let _ = tag;
        drop(bytes);
    }
}

impl<F> ShaderLoader for F
where
    F: Fn(&str) -> Result<Vec<u8>, ShaderError>,
{
    fn load(&self, tag: &str) -> Result<Vec<u8>, ShaderError> {
        self(tag)
    }
}
