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

//! A minimal SPIR-V assembler for building modules in memory.
//!
//! Only emits the declarations the reflection engine reads; function bodies
//! are never generated.

use super::opcodes::{decoration, execution_mode, op, storage_class, MAGIC};

const VERSION_1_0: u32 = 0x0001_0000;
const OP_TYPE_FUNCTION: u32 = 33;

/// Builds a SPIR-V module instruction by instruction.
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    next_id: u32,
    words: Vec<u32>,
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleBuilder {
    /// An empty module.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            words: Vec::new(),
        }
    }

    /// Allocates a fresh result id.
    pub fn id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Appends an instruction with the given operands.
    pub fn instruction(&mut self, opcode: u32, operands: &[u32]) -> &mut Self {
        let count = (operands.len() + 1) as u32;
        self.words.push((count << 16) | opcode);
        self.words.extend_from_slice(operands);
        self
    }

    /// Declares an entry point with the given execution model. Returns the
    /// function id it names.
    pub fn entry_point(&mut self, model: u32, name: &str) -> u32 {
        let function = self.id();
        let mut operands = vec![model, function];
        operands.extend(encode_string(name));
        self.instruction(op::ENTRY_POINT, &operands);
        function
    }

    /// Declares the compute workgroup size of `entry`.
    pub fn local_size(&mut self, entry: u32, size: [u32; 3]) -> &mut Self {
        self.instruction(
            op::EXECUTION_MODE,
            &[entry, execution_mode::LOCAL_SIZE, size[0], size[1], size[2]],
        )
    }

    /// Decorates `target`.
    pub fn decorate(&mut self, target: u32, decoration: u32, literals: &[u32]) -> &mut Self {
        let mut operands = vec![target, decoration];
        operands.extend_from_slice(literals);
        self.instruction(op::DECORATE, &operands)
    }

    /// Decorates member `member` of struct `target`.
    pub fn member_decorate(
        &mut self,
        target: u32,
        member: u32,
        decoration: u32,
        literals: &[u32],
    ) -> &mut Self {
        let mut operands = vec![target, member, decoration];
        operands.extend_from_slice(literals);
        self.instruction(op::MEMBER_DECORATE, &operands)
    }

    /// Decorates a resource variable with its set and binding.
    pub fn bind(&mut self, variable: u32, set: u32, binding: u32) -> &mut Self {
        self.decorate(variable, decoration::DESCRIPTOR_SET, &[set])
            .decorate(variable, decoration::BINDING, &[binding])
    }

    fn declare(&mut self, opcode: u32, operands: &[u32]) -> u32 {
        let id = self.id();
        let mut all = vec![id];
        all.extend_from_slice(operands);
        self.instruction(opcode, &all);
        id
    }

    /// `OpTypeVoid`.
    pub fn type_void(&mut self) -> u32 {
        self.declare(op::TYPE_VOID, &[])
    }

    /// `OpTypeFunction` returning `ret` with no parameters.
    pub fn type_function(&mut self, ret: u32) -> u32 {
        self.declare(OP_TYPE_FUNCTION, &[ret])
    }

    /// `OpTypeInt`.
    pub fn type_int(&mut self, width: u32, signed: bool) -> u32 {
        self.declare(op::TYPE_INT, &[width, u32::from(signed)])
    }

    /// `OpTypeFloat`.
    pub fn type_float(&mut self, width: u32) -> u32 {
        self.declare(op::TYPE_FLOAT, &[width])
    }

    /// `OpTypeVector`.
    pub fn type_vector(&mut self, component: u32, count: u32) -> u32 {
        self.declare(op::TYPE_VECTOR, &[component, count])
    }

    /// `OpTypeMatrix` of `columns` columns of type `column`.
    pub fn type_matrix(&mut self, column: u32, columns: u32) -> u32 {
        self.declare(op::TYPE_MATRIX, &[column, columns])
    }

    /// `OpTypeArray` whose length is the constant `length`.
    pub fn type_array(&mut self, element: u32, length: u32) -> u32 {
        self.declare(op::TYPE_ARRAY, &[element, length])
    }

    /// `OpTypeRuntimeArray`.
    pub fn type_runtime_array(&mut self, element: u32) -> u32 {
        self.declare(op::TYPE_RUNTIME_ARRAY, &[element])
    }

    /// `OpTypeStruct`.
    pub fn type_struct(&mut self, members: &[u32]) -> u32 {
        self.declare(op::TYPE_STRUCT, members)
    }

    /// A 2D, single-sampled `OpTypeImage` sampled as `sampled_type`.
    pub fn type_image(&mut self, sampled_type: u32) -> u32 {
        // dim 2D, depth 0, arrayed 0, ms 0, sampled 1, format unknown
        self.declare(op::TYPE_IMAGE, &[sampled_type, 1, 0, 0, 0, 1, 0])
    }

    /// `OpTypeSampler`.
    pub fn type_sampler(&mut self) -> u32 {
        self.declare(op::TYPE_SAMPLER, &[])
    }

    /// `OpTypeSampledImage`.
    pub fn type_sampled_image(&mut self, image: u32) -> u32 {
        self.declare(op::TYPE_SAMPLED_IMAGE, &[image])
    }

    /// `OpTypePointer`.
    pub fn type_pointer(&mut self, storage: u32, pointee: u32) -> u32 {
        self.declare(op::TYPE_POINTER, &[storage, pointee])
    }

    /// A 32-bit `OpConstant` of type `ty`.
    pub fn constant(&mut self, ty: u32, value: u32) -> u32 {
        let id = self.id();
        self.instruction(op::CONSTANT, &[ty, id, value]);
        id
    }

    /// `OpVariable` of pointer type `pointer`.
    pub fn variable(&mut self, pointer: u32, storage: u32) -> u32 {
        let id = self.id();
        self.instruction(op::VARIABLE, &[pointer, id, storage]);
        id
    }

    /// A `Block` struct of `members` wrapped in a uniform variable at
    /// `set`/`binding`. Returns the variable id.
    pub fn uniform_block(&mut self, members: &[u32], set: u32, binding: u32) -> u32 {
        let block = self.type_struct(members);
        self.decorate(block, decoration::BLOCK, &[]);
        let pointer = self.type_pointer(storage_class::UNIFORM, block);
        let variable = self.variable(pointer, storage_class::UNIFORM);
        self.bind(variable, set, binding);
        variable
    }

    /// A `Block` struct of `members` wrapped in a push-constant variable.
    /// Returns the struct id.
    pub fn push_constant_block(&mut self, members: &[u32]) -> u32 {
        let block = self.type_struct(members);
        self.decorate(block, decoration::BLOCK, &[]);
        let pointer = self.type_pointer(storage_class::PUSH_CONSTANT, block);
        self.variable(pointer, storage_class::PUSH_CONSTANT);
        block
    }

    /// The module words, header included.
    pub fn build(&self) -> Vec<u32> {
        let mut module = vec![MAGIC, VERSION_1_0, 0, self.next_id, 0];
        module.extend_from_slice(&self.words);
        module
    }

    /// The module as little-endian bytes, as read from a `.spv` file.
    pub fn build_bytes(&self) -> Vec<u8> {
        self.build().iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}

/// A nul-terminated string literal packed into little-endian words.
pub fn encode_string(s: &str) -> Vec<u32> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
