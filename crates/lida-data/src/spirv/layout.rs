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

//! std140 size and alignment of SPIR-V data types.

use super::error::ReflectError;
use super::opcodes::op;
use super::symbols::{Symbol, SymbolTable};

/// Nesting depth past which a type is rejected.
const MAX_TYPE_DEPTH: u32 = 32;

/// Base alignment of arrays and structs is rounded up to this many bytes.
const AGGREGATE_ALIGN: u32 = 16;

/// Size and base alignment of a type, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub size: u32,
    pub align: u32,
}

/// Rounds `value` up to a multiple of `align`. `align` of zero leaves it as is.
pub(crate) fn round_up(value: u32, align: u32) -> Option<u32> {
    if align <= 1 {
        return Some(value);
    }
    value.checked_add(align - 1).map(|v| v / align * align)
}

struct Solver<'t, 'a> {
    table: &'t SymbolTable<'a>,
}

impl Solver<'_, '_> {
    fn overflow(id: u32) -> ReflectError {
        ReflectError::LayoutOverflow { id }
    }

    fn unsupported(&self, id: u32, context: &'static str) -> ReflectError {
        let opcode = self.table.get(id).map(|s| s.opcode).unwrap_or(0);
        ReflectError::UnsupportedType {
            id,
            opcode,
            context,
        }
    }

    fn scalar(&self, id: u32) -> Result<u32, ReflectError> {
        let symbol = self.table.get(id)?;
        match symbol.opcode {
            op::TYPE_INT | op::TYPE_FLOAT if symbol.operand % 8 == 0 && symbol.operand > 0 => {
                Ok(symbol.operand / 8)
            }
            _ => Err(self.unsupported(id, "vector component is not a scalar")),
        }
    }

    fn vector(&self, id: u32, component: u32, count: u32) -> Result<Layout, ReflectError> {
        let size = component.checked_mul(count).ok_or(Self::overflow(id))?;
        let align = match count {
            1 => component,
            2 => component * 2,
            3 | 4 => component * 4,
            _ => return Err(self.unsupported(id, "vector with more than four components")),
        };
        Ok(Layout { size, align })
    }

    fn array_of(&self, id: u32, element: Layout, len: u32) -> Result<Layout, ReflectError> {
        let align = round_up(element.align, AGGREGATE_ALIGN).ok_or(Self::overflow(id))?;
        let stride = round_up(element.size, align).ok_or(Self::overflow(id))?;
        let size = stride.checked_mul(len).ok_or(Self::overflow(id))?;
        Ok(Layout { size, align })
    }

    fn layout(&self, id: u32, row_major: bool, depth: u32) -> Result<Layout, ReflectError> {
        if depth > MAX_TYPE_DEPTH {
            return Err(Self::overflow(id));
        }
        let symbol = *self.table.get(id)?;
        match symbol.opcode {
            op::TYPE_INT | op::TYPE_FLOAT => {
                let size = self.scalar(id)?;
                Ok(Layout { size, align: size })
            }
            op::TYPE_VECTOR => {
                let component = self.scalar(symbol.type_id)?;
                self.vector(id, component, symbol.operand)
            }
            op::TYPE_MATRIX => {
                let column = *self.table.get(symbol.type_id)?;
                if column.opcode != op::TYPE_VECTOR {
                    return Err(self.unsupported(symbol.type_id, "matrix column is not a vector"));
                }
                let component = self.scalar(column.type_id)?;
                let (rows, columns) = (column.operand, symbol.operand);
                // Row-major matrices are stored as an array of row vectors.
                let (vector_len, count) = if row_major {
                    (columns, rows)
                } else {
                    (rows, columns)
                };
                let vector = self.vector(id, component, vector_len)?;
                self.array_of(id, vector, count)
            }
            op::TYPE_ARRAY => {
                let len = self.table.constant(symbol.operand, "array length is not a constant")?;
                let element = self.layout(symbol.type_id, row_major, depth + 1)?;
                self.array_of(id, element, len)
            }
            op::TYPE_STRUCT => self.structure(id, &symbol, depth),
            _ => Err(self.unsupported(id, "type has no std140 layout")),
        }
    }

    fn structure(
        &self,
        id: u32,
        symbol: &Symbol,
        depth: u32,
    ) -> Result<Layout, ReflectError> {
        let mut offset = 0u32;
        let mut max_align = 1u32;
        let mut after_struct: Option<u32> = None;

        for (index, &member) in self.table.members(symbol).iter().enumerate() {
            let row_major = index < u32::BITS as usize && symbol.row_major & (1 << index) != 0;
            let layout = self.layout(member, row_major, depth + 1)?;
            let align = after_struct.map_or(layout.align, |a| a.max(layout.align));
            offset = round_up(offset, align)
                .and_then(|o| o.checked_add(layout.size))
                .ok_or(Self::overflow(id))?;
            max_align = max_align.max(layout.align);
            let is_struct = self.table.get(member)?.opcode == op::TYPE_STRUCT;
            after_struct = is_struct.then_some(layout.align);
        }

        let align = round_up(max_align, AGGREGATE_ALIGN).ok_or(Self::overflow(id))?;
        Ok(Layout {
            size: offset,
            align,
        })
    }
}

/// The std140 layout of type `id`.
pub(crate) fn std140(table: &SymbolTable<'_>, id: u32) -> Result<Layout, ReflectError> {
    Solver { table }.layout(id, false, 0)
}
