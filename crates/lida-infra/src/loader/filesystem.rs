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

use lida_core::renderer::{ShaderError, ShaderLoader};
use std::path::{Path, PathBuf};

/// Loads compiled shaders from `<root>/<tag>.<extension>`.
#[derive(Debug, Clone)]
pub struct FsShaderLoader {
    root: PathBuf,
    extension: String,
}

impl FsShaderLoader {
    /// A loader reading `.spv` files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: "spv".to_string(),
        }
    }

    /// Uses `extension` instead of `spv`.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// The directory shaders are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file a tag resolves to.
    pub fn path_for(&self, tag: &str) -> PathBuf {
        let mut path = self.root.join(tag);
        let file_name = match path.file_name() {
            Some(name) => format!("{}.{}", name.to_string_lossy(), self.extension),
            None => format!("{tag}.{}", self.extension),
        };
        path.set_file_name(file_name);
        path
    }
}

impl ShaderLoader for FsShaderLoader {
    fn load(&self, tag: &str) -> Result<Vec<u8>, ShaderError> {
        let path = self.path_for(tag);
        log::debug!("FsShaderLoader: Reading '{}'", path.display());
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ShaderError::NotFound {
                tag: tag.to_string(),
            },
            _ => ShaderError::Io {
                tag: tag.to_string(),
                reason: format!("{}: {e}", path.display()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_map_to_spv_files() {
        let loader = FsShaderLoader::new("assets/shaders");
        assert_eq!(
            loader.path_for("deferred/gbuffer.frag"),
            Path::new("assets/shaders/deferred/gbuffer.frag.spv")
        );
        let loader = loader.with_extension("bin");
        assert_eq!(
            loader.path_for("quad.vert"),
            Path::new("assets/shaders/quad.vert.bin")
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FsShaderLoader::new(dir.path());
        let err = loader.load("missing.vert").unwrap_err();
        assert_eq!(
            err,
            ShaderError::NotFound {
                tag: "missing.vert".to_string()
            }
        );
    }

    #[test]
    fn reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tri.vert.spv"), [3u8, 2, 35, 7]).unwrap();
        let loader = FsShaderLoader::new(dir.path());
        assert_eq!(loader.load("tri.vert").unwrap(), vec![3, 2, 35, 7]);
    }
}
