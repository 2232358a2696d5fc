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

//! Errors raised while reflecting a SPIR-V module.

use crate::allocators::ArenaError;
use thiserror::Error;

/// An error raised while reflecting a SPIR-V module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReflectError {
    /// The first word is not the SPIR-V magic number.
    #[error("not a SPIR-V module (first word {found:#010x})")]
    BadMagic {
        /// The word found in place of the magic number.
        found: u32,
    },
    /// The instruction stream is structurally invalid.
    #[error("malformed SPIR-V at word {offset}: {reason}")]
    Malformed {
        /// Word offset of the offending instruction.
        offset: usize,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// An instruction refers to an id outside the module's id bound.
    #[error("SPIR-V id {id} is outside the id bound {bound}")]
    IdOutOfBounds {
        /// The offending id.
        id: u32,
        /// The module's id bound.
        bound: u32,
    },
    /// An entry point uses an execution model with no graphics or compute
    /// stage bit, such as `Kernel`. Vertex, tessellation control and
    /// evaluation, geometry, fragment and compute are supported.
    #[error("unsupported SPIR-V execution model {0}")]
    UnsupportedExecutionModel(u32),
    /// A resource or push-constant type has a shape the engine cannot describe.
    #[error("unsupported SPIR-V type %{id} (opcode {opcode}): {context}")]
    UnsupportedType {
        /// The type id.
        id: u32,
        /// The opcode that defined it, 0 if undefined.
        opcode: u32,
        /// What was being resolved.
        context: &'static str,
    },
    /// A type's size or nesting depth exceeds what the engine can compute.
    #[error("SPIR-V type %{id} is too large or too deeply nested")]
    LayoutOverflow {
        /// The type id.
        id: u32,
    },
    /// A resource uses a descriptor set index beyond the supported range.
    #[error("descriptor set {set} exceeds the supported set count")]
    TooManySets {
        /// The set index.
        set: u32,
    },
    /// A set has too many bindings, or a binding index beyond the supported range.
    #[error("descriptor set {set} cannot hold binding {binding}")]
    TooManyBindings {
        /// The set index.
        set: u32,
        /// The binding index.
        binding: u32,
    },
    /// The module declares more than one push-constant block.
    #[error("more than one push-constant range")]
    TooManyPushConstantRanges,
    /// The symbol table did not fit in arena scratch memory.
    #[error(transparent)]
    Arena(#[from] ArenaError),
}

impl ReflectError {
    /// Whether the bytecode is usable as-is without reflection data.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::BadMagic { .. })
    }
}
