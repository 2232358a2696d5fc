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

//! The per-id symbol table built by the first pass over a module.

use super::error::ReflectError;
use super::opcodes::{decoration, execution_mode, execution_model, op, HEADER_WORDS};
use bytemuck::{Pod, Zeroable};
use lida_core::renderer::ShaderStageFlags;

/// Everything the first pass records about one result id.
///
/// The meaning of `type_id`, `operand` and `extra` depends on `opcode`:
///
/// | opcode         | `type_id`        | `operand`          | `extra`            |
/// |----------------|------------------|--------------------|--------------------|
/// | int            |                  | bit width          | signedness         |
/// | float          |                  | bit width          |                    |
/// | vector         | component type   | component count    |                    |
/// | matrix         | column type      | column count       |                    |
/// | array          | element type     | length constant id |                    |
/// | runtime array  | element type     |                    |                    |
/// | struct         |                  |                    | member list offset |
/// | pointer        | pointee type     | storage class      |                    |
/// | variable       | pointer type     | storage class      |                    |
/// | constant       | result type      | low value word     |                    |
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub(crate) struct Symbol {
    pub opcode: u32,
    pub type_id: u32,
    pub operand: u32,
    pub extra: u32,
    pub member_count: u32,
    /// Bit `i` set when member `i` is decorated `RowMajor`.
    pub row_major: u32,
    /// `Block`, `BufferBlock`, or 0.
    pub block: u32,
    pub set: u32,
    pub binding: u32,
    /// Input attachment index plus one, 0 when undecorated.
    pub input_attachment: u32,
}

/// Module-wide facts collected by the first pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ModuleInfo {
    pub stages: ShaderStageFlags,
    pub local_size: [u32; 3],
}

/// The symbol table together with the code it indexes into.
pub(crate) struct SymbolTable<'a> {
    pub code: &'a [u32],
    pub symbols: &'a [Symbol],
}

impl SymbolTable<'_> {
    pub fn bound(&self) -> u32 {
        self.symbols.len() as u32
    }

    pub fn get(&self, id: u32) -> Result<&Symbol, ReflectError> {
        self.symbols
            .get(id as usize)
            .ok_or(ReflectError::IdOutOfBounds {
                id,
                bound: self.bound(),
            })
    }

    /// The member type ids of a struct symbol.
    pub fn members(&self, symbol: &Symbol) -> &[u32] {
        let start = symbol.extra as usize;
        &self.code[start..start + symbol.member_count as usize]
    }

    /// The value of an integer constant.
    pub fn constant(&self, id: u32, context: &'static str) -> Result<u32, ReflectError> {
        let symbol = self.get(id)?;
        if symbol.opcode != op::CONSTANT {
            return Err(ReflectError::UnsupportedType {
                id,
                opcode: symbol.opcode,
                context,
            });
        }
        Ok(symbol.operand)
    }
}

fn require(ins: &[u32], words: usize, offset: usize, reason: &'static str) -> Result<(), ReflectError> {
    if ins.len() < words {
        return Err(ReflectError::Malformed { offset, reason });
    }
    Ok(())
}

fn lookup(symbols: &mut [Symbol], id: u32) -> Result<&mut Symbol, ReflectError> {
    let bound = symbols.len() as u32;
    symbols
        .get_mut(id as usize)
        .ok_or(ReflectError::IdOutOfBounds { id, bound })
}

fn define(
    symbols: &mut [Symbol],
    id: u32,
    opcode: u32,
    offset: usize,
) -> Result<&mut Symbol, ReflectError> {
    let symbol = lookup(symbols, id)?;
    if symbol.opcode != 0 {
        return Err(ReflectError::Malformed {
            offset,
            reason: "result id defined twice",
        });
    }
    symbol.opcode = opcode;
    Ok(symbol)
}

fn stage_for(model: u32) -> Result<ShaderStageFlags, ReflectError> {
    match model {
        execution_model::VERTEX => Ok(ShaderStageFlags::VERTEX),
        execution_model::TESSELLATION_CONTROL => Ok(ShaderStageFlags::TESSELLATION_CONTROL),
        execution_model::TESSELLATION_EVALUATION => Ok(ShaderStageFlags::TESSELLATION_EVALUATION),
        execution_model::GEOMETRY => Ok(ShaderStageFlags::GEOMETRY),
        execution_model::FRAGMENT => Ok(ShaderStageFlags::FRAGMENT),
        execution_model::GL_COMPUTE => Ok(ShaderStageFlags::COMPUTE),
        other => Err(ReflectError::UnsupportedExecutionModel(other)),
    }
}

/// Scans every instruction once and fills `symbols`, which must be zeroed and
/// hold one entry per id below the module's id bound.
pub(crate) fn parse(code: &[u32], symbols: &mut [Symbol]) -> Result<ModuleInfo, ReflectError> {
    let mut info = ModuleInfo::default();
    let mut offset = HEADER_WORDS;

    while offset < code.len() {
        let word = code[offset];
        let opcode = word & 0xffff;
        let count = (word >> 16) as usize;
        if count == 0 {
            return Err(ReflectError::Malformed {
                offset,
                reason: "instruction with a word count of zero",
            });
        }
        if count > code.len() - offset {
            return Err(ReflectError::Malformed {
                offset,
                reason: "instruction runs past the end of the module",
            });
        }
        let ins = &code[offset..offset + count];

        match opcode {
            op::ENTRY_POINT => {
                require(ins, 3, offset, "truncated OpEntryPoint")?;
                info.stages |= stage_for(ins[1])?;
            }
            op::EXECUTION_MODE => {
                require(ins, 3, offset, "truncated OpExecutionMode")?;
                if ins[2] == execution_mode::LOCAL_SIZE {
                    require(ins, 6, offset, "truncated LocalSize execution mode")?;
                    info.local_size = [ins[3], ins[4], ins[5]];
                }
            }
            op::DECORATE => {
                require(ins, 3, offset, "truncated OpDecorate")?;
                let target = lookup(symbols, ins[1])?;
                match ins[2] {
                    decoration::DESCRIPTOR_SET => {
                        require(ins, 4, offset, "DescriptorSet without a literal")?;
                        target.set = ins[3];
                    }
                    decoration::BINDING => {
                        require(ins, 4, offset, "Binding without a literal")?;
                        target.binding = ins[3];
                    }
                    decoration::INPUT_ATTACHMENT_INDEX => {
                        require(ins, 4, offset, "InputAttachmentIndex without a literal")?;
                        target.input_attachment = ins[3].saturating_add(1);
                    }
                    decoration::BLOCK | decoration::BUFFER_BLOCK => target.block = ins[2],
                    _ => {}
                }
            }
            op::MEMBER_DECORATE => {
                require(ins, 4, offset, "truncated OpMemberDecorate")?;
                let target = lookup(symbols, ins[1])?;
                if ins[3] == decoration::ROW_MAJOR && ins[2] < u32::BITS {
                    target.row_major |= 1 << ins[2];
                }
            }
            op::TYPE_VOID | op::TYPE_SAMPLER => {
                require(ins, 2, offset, "truncated type declaration")?;
                define(symbols, ins[1], opcode, offset)?;
            }
            op::TYPE_IMAGE | op::TYPE_SAMPLED_IMAGE => {
                require(ins, 3, offset, "truncated image type")?;
                define(symbols, ins[1], opcode, offset)?.type_id = ins[2];
            }
            op::TYPE_INT => {
                require(ins, 4, offset, "truncated OpTypeInt")?;
                let symbol = define(symbols, ins[1], opcode, offset)?;
                symbol.operand = ins[2];
                symbol.extra = ins[3];
            }
            op::TYPE_FLOAT => {
                require(ins, 3, offset, "truncated OpTypeFloat")?;
                define(symbols, ins[1], opcode, offset)?.operand = ins[2];
            }
            op::TYPE_VECTOR | op::TYPE_MATRIX | op::TYPE_ARRAY => {
                require(ins, 4, offset, "truncated composite type")?;
                let symbol = define(symbols, ins[1], opcode, offset)?;
                symbol.type_id = ins[2];
                symbol.operand = ins[3];
            }
            op::TYPE_RUNTIME_ARRAY => {
                require(ins, 3, offset, "truncated OpTypeRuntimeArray")?;
                define(symbols, ins[1], opcode, offset)?.type_id = ins[2];
            }
            op::TYPE_STRUCT => {
                require(ins, 2, offset, "truncated OpTypeStruct")?;
                let symbol = define(symbols, ins[1], opcode, offset)?;
                symbol.extra = (offset + 2) as u32;
                symbol.member_count = (count - 2) as u32;
            }
            op::TYPE_POINTER => {
                require(ins, 4, offset, "truncated OpTypePointer")?;
                let symbol = define(symbols, ins[1], opcode, offset)?;
                symbol.operand = ins[2];
                symbol.type_id = ins[3];
            }
            op::VARIABLE => {
                require(ins, 4, offset, "truncated OpVariable")?;
                let symbol = define(symbols, ins[2], opcode, offset)?;
                symbol.type_id = ins[1];
                symbol.operand = ins[3];
            }
            op::CONSTANT => {
                require(ins, 4, offset, "truncated OpConstant")?;
                let symbol = define(symbols, ins[2], opcode, offset)?;
                symbol.type_id = ins[1];
                symbol.operand = ins[3];
            }
            _ => {}
        }

        offset += count;
    }

    Ok(info)
}
