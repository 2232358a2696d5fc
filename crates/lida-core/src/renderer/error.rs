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

//! Errors reported by the host loader and the driver collaborator.

use crate::renderer::api::handle::ResourceKind;
use std::fmt;

/// A shader could not be turned into bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The loader knows no shader under this tag.
    NotFound {
        /// The requested tag.
        tag: String,
    },
    /// The loader found the shader but failed to read it.
    Io {
        /// The requested tag.
        tag: String,
        /// What went wrong, as reported by the loader.
        reason: String,
    },
    /// The bytecode is not a whole number of 32-bit words.
    UnalignedBytecode {
        /// The requested tag.
        tag: String,
        /// Byte length received.
        len: usize,
    },
}

impl ShaderError {
    /// The tag the error is about.
    pub fn tag(&self) -> &str {
        match self {
            ShaderError::NotFound { tag }
            | ShaderError::Io { tag, .. }
            | ShaderError::UnalignedBytecode { tag, .. } => tag,
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::NotFound { tag } => write!(f, "No shader named '{tag}'"),
            ShaderError::Io { tag, reason } => write!(f, "Could not read shader '{tag}': {reason}"),
            ShaderError::UnalignedBytecode { tag, len } => {
                write!(f, "Shader '{tag}' is {len} bytes long, not a whole number of words")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// A driver object could not be created.
#[derive(Debug)]
pub enum ResourceError {
    /// The shader feeding a module was unusable.
    Shader(ShaderError),
    /// The driver refused to create an object.
    CreationFailed {
        /// What was being created.
        kind: ResourceKind,
        /// The driver's explanation.
        details: String,
    },
    /// The device itself is in a broken state.
    Backend(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Unusable shader: {err}"),
            ResourceError::CreationFailed { kind, details } => {
                write!(f, "Failed to create {kind}: {details}")
            }
            ResourceError::Backend(msg) => write!(f, "Device error: {msg}"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}
