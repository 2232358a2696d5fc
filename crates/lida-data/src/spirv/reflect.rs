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

//! The reflection result and the second pass that produces it.

use super::error::ReflectError;
use super::layout::{round_up, std140};
use super::opcodes::{decoration, op, storage_class, ID_BOUND_WORD, HEADER_WORDS, MAGIC};
use super::symbols::{parse, Symbol, SymbolTable};
use crate::allocators::{Arena, Scratch};
use lida_core::renderer::{
    DescriptorBinding, DescriptorType, PushConstantRange, ShaderStageFlags,
    MAX_BINDINGS_PER_SET, MAX_DESCRIPTOR_SETS,
};

/// The bindings of one descriptor set, sorted by binding index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DescriptorSetInfo {
    bindings: [DescriptorBinding; MAX_BINDINGS_PER_SET],
    count: usize,
}

impl DescriptorSetInfo {
    /// Builds a set from a list of bindings. Returns `None` if there are more
    /// than [`MAX_BINDINGS_PER_SET`].
    pub fn from_bindings(bindings: &[DescriptorBinding]) -> Option<Self> {
        let mut set = Self::default();
        for binding in bindings {
            if !set.try_push(*binding) {
                return None;
            }
        }
        Some(set)
    }

    /// The live bindings.
    pub fn bindings(&self) -> &[DescriptorBinding] {
        &self.bindings[..self.count]
    }

    /// The binding with index `binding`, mutably.
    pub fn find_mut(&mut self, binding: u32) -> Option<&mut DescriptorBinding> {
        self.bindings[..self.count]
            .iter_mut()
            .find(|b| b.binding == binding)
    }

    /// Appends a binding. Returns `false` if the set is full.
    pub fn try_push(&mut self, binding: DescriptorBinding) -> bool {
        if self.count == MAX_BINDINGS_PER_SET {
            return false;
        }
        self.bindings[self.count] = binding;
        self.count += 1;
        true
    }

    /// Orders the bindings by binding index.
    pub fn sort(&mut self) {
        self.bindings[..self.count].sort_unstable_by_key(|b| b.binding);
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the set has no bindings.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Resource-binding and data-layout metadata recovered from a SPIR-V module.
///
/// The structure is fixed-size, so reflecting the same module twice yields
/// values that compare equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ShaderReflection {
    /// Stages of every entry point, combined.
    pub stages: ShaderStageFlags,
    /// Compute workgroup size, zero when the module declares none.
    pub local_size: [u32; 3],
    /// Descriptor sets by set index.
    pub sets: [DescriptorSetInfo; MAX_DESCRIPTOR_SETS],
    /// One past the highest set index in use.
    pub set_count: usize,
    /// The push-constant block, if any.
    pub push_constants: Option<PushConstantRange>,
}

impl ShaderReflection {
    /// The sets in use, including empty sets below the highest index.
    pub fn sets(&self) -> &[DescriptorSetInfo] {
        &self.sets[..self.set_count]
    }

    /// The set at `index`, if it is in use.
    pub fn set(&self, index: usize) -> Option<&DescriptorSetInfo> {
        self.sets().get(index)
    }
}

/// Reflects `code` using scratch memory from `arena`.
///
/// ## Errors
///
/// See [`ReflectError`]. [`ReflectError::BadMagic`] is the only error for which
/// the bytecode may still be handed to a driver.
pub fn reflect(code: &[u32], arena: &mut Arena) -> Result<ShaderReflection, ReflectError> {
    let mut scratch = arena.scratch();
    reflect_with(code, &mut scratch)
}

/// Reflects `code`, placing the symbol table in a scope nested in `scratch`.
///
/// The symbol table is released before this returns.
pub fn reflect_with(
    code: &[u32],
    scratch: &mut Scratch<'_>,
) -> Result<ShaderReflection, ReflectError> {
    let Some(&magic) = code.first() else {
        return Err(ReflectError::Malformed {
            offset: 0,
            reason: "empty module",
        });
    };
    if magic != MAGIC {
        return Err(ReflectError::BadMagic { found: magic });
    }
    if code.len() < HEADER_WORDS {
        return Err(ReflectError::Malformed {
            offset: 0,
            reason: "module shorter than its header",
        });
    }

    let mut scope = scratch.nested();
    let symbols = scope.alloc::<Symbol>(code[ID_BOUND_WORD] as usize)?;
    let info = parse(code, symbols)?;
    let table = SymbolTable { code, symbols };

    let mut reflection = ShaderReflection {
        stages: info.stages,
        local_size: info.local_size,
        ..ShaderReflection::default()
    };

    for (id, symbol) in table.symbols.iter().enumerate() {
        if symbol.opcode != op::VARIABLE {
            continue;
        }
        let id = id as u32;
        match symbol.operand {
            storage_class::UNIFORM | storage_class::UNIFORM_CONSTANT | storage_class::STORAGE_BUFFER => {
                let binding = resolve_binding(&table, id, symbol, info.stages)?;
                insert_binding(&mut reflection, symbol.set, binding)?;
            }
            storage_class::PUSH_CONSTANT => {
                let pointee = pointee(&table, symbol)?;
                let layout = std140(&table, pointee)?;
                let size = round_up(layout.size, 4).ok_or(ReflectError::LayoutOverflow { id })?;
                if reflection.push_constants.is_some() {
                    return Err(ReflectError::TooManyPushConstantRanges);
                }
                reflection.push_constants = Some(PushConstantRange {
                    stages: info.stages,
                    offset: 0,
                    size,
                });
            }
            _ => {}
        }
    }

    for set in &mut reflection.sets[..reflection.set_count] {
        set.sort();
    }
    log::trace!(
        "Reflected {} words: {} sets, push constants {:?}",
        code.len(),
        reflection.set_count,
        reflection.push_constants.map(|r| r.size)
    );
    Ok(reflection)
}

fn pointee(table: &SymbolTable<'_>, variable: &Symbol) -> Result<u32, ReflectError> {
    let pointer = table.get(variable.type_id)?;
    if pointer.opcode != op::TYPE_POINTER {
        return Err(ReflectError::UnsupportedType {
            id: variable.type_id,
            opcode: pointer.opcode,
            context: "variable type is not a pointer",
        });
    }
    Ok(pointer.type_id)
}

fn resolve_binding(
    table: &SymbolTable<'_>,
    id: u32,
    variable: &Symbol,
    stages: ShaderStageFlags,
) -> Result<DescriptorBinding, ReflectError> {
    let mut type_id = pointee(table, variable)?;
    let mut resource = *table.get(type_id)?;
    let mut count = 1;
    if resource.opcode == op::TYPE_ARRAY {
        count = table.constant(resource.operand, "descriptor array length is not a constant")?;
        type_id = resource.type_id;
        resource = *table.get(type_id)?;
    }

    let unsupported = |context| ReflectError::UnsupportedType {
        id: type_id,
        opcode: resource.opcode,
        context,
    };
    let descriptor_type = match resource.opcode {
        op::TYPE_STRUCT => match resource.block {
            decoration::BLOCK if variable.operand == storage_class::STORAGE_BUFFER => {
                DescriptorType::StorageBuffer
            }
            decoration::BLOCK => DescriptorType::UniformBuffer,
            decoration::BUFFER_BLOCK => DescriptorType::StorageBuffer,
            _ => return Err(unsupported("buffer struct is neither Block nor BufferBlock")),
        },
        op::TYPE_IMAGE if variable.input_attachment != 0 => DescriptorType::InputAttachment,
        op::TYPE_IMAGE => DescriptorType::StorageImage,
        op::TYPE_SAMPLER => DescriptorType::Sampler,
        op::TYPE_SAMPLED_IMAGE => DescriptorType::CombinedImageSampler,
        _ => return Err(unsupported("resource variable has no descriptor type")),
    };

    log::trace!(
        "Variable %{} -> set {} binding {} {:?} x{}",
        id,
        variable.set,
        variable.binding,
        descriptor_type,
        count
    );
    Ok(DescriptorBinding {
        binding: variable.binding,
        descriptor_type,
        count,
        stages,
    })
}

fn insert_binding(
    reflection: &mut ShaderReflection,
    set: u32,
    binding: DescriptorBinding,
) -> Result<(), ReflectError> {
    let index = set as usize;
    if index >= MAX_DESCRIPTOR_SETS {
        return Err(ReflectError::TooManySets { set });
    }
    let too_many = ReflectError::TooManyBindings {
        set,
        binding: binding.binding,
    };
    if binding.binding as usize >= MAX_BINDINGS_PER_SET {
        return Err(too_many);
    }
    if !reflection.sets[index].try_push(binding) {
        return Err(too_many);
    }
    reflection.set_count = reflection.set_count.max(index + 1);
    Ok(())
}
