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

//! SPIR-V reflection.
//!
//! Reflection is two passes over the module. The first scans every
//! instruction once and builds a symbol table indexed by result id, placed in
//! arena scratch memory. The second walks the variables in id order and
//! resolves their descriptor bindings and push-constant sizes against the
//! table.

#[cfg(any(test, feature = "assembler"))]
pub mod assembler;
mod error;
mod layout;
pub mod opcodes;
mod reflect;
mod symbols;

pub use error::ReflectError;
pub use reflect::{reflect, reflect_with, DescriptorSetInfo, ShaderReflection};
