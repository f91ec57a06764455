//! The SLASM instruction vocabulary
//!
//! A closed sum type over every operation the stack machine understands.
//! Each variant carries exactly the operands its kind requires; emitters
//! handle the set with an exhaustive match, so adding a variant is a compile
//! error in every backend until it gets a lowering.
//!
//! Execution model: an implicit word-sized operand stack per activation.
//! `Load*` push, `Store*` pop and write, binary operations pop the
//! second-pushed operand first (right-hand side), apply the
//! `DataType`-selected operation, and push one word-aligned result.

use serde::{Deserialize, Serialize};
use slasm_common::{DataType, Endianness, Word};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "opcode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instruction {
    Noop,

    /// Push a constant word.
    LoadConst { value: Word },
    /// Push the word stored in local slot `idx`.
    LoadLocal { idx: u64 },
    /// Push the word stored in parameter slot `idx`.
    LoadParam { idx: u64 },
    /// Push the word stored in the named global.
    LoadGlobal { name: String },
    /// Pop an address, push the word at `address + offset`.
    LoadMem { offset: i64 },
    /// Push the address of the named function.
    LoadFuncAddr { name: String },

    /// Discard the top of the stack.
    Pop,
    /// Pop a word into local slot `idx`.
    StoreLocal { idx: u64 },
    /// Pop a word into parameter slot `idx`.
    StoreParam { idx: u64 },
    /// Pop a word into the named global.
    StoreGlobal { name: String },
    /// Pop an address, then pop the word to store at `address + offset`.
    StoreMem { offset: i64 },

    Add { data_type: DataType },
    Sub { data_type: DataType },
    Mul { data_type: DataType },
    Div { data_type: DataType },
    Mod { data_type: DataType },
    Inc { data_type: DataType },
    Dec { data_type: DataType },
    Eq { data_type: DataType },
    Neq { data_type: DataType },
    Gt { data_type: DataType },
    Lt { data_type: DataType },
    #[serde(rename = "GTEQ")]
    GtEq { data_type: DataType },
    #[serde(rename = "LTEQ")]
    LtEq { data_type: DataType },
    Neg { data_type: DataType },

    Or,
    And,
    Xor,
    Not,
    Shl { amount: u8 },
    Shr { amount: u8 },

    /// Pop one value of type `from`, push its conversion to type `to`.
    Convert { from: DataType, to: DataType },

    /// Unconditional transfer to the named block.
    Jump { target: String },
    /// Pop a discriminant; transfer to `true_target` if nonzero, else
    /// `false_target`. Two-way and exhaustive, never falls through.
    CondJump {
        true_target: String,
        false_target: String,
    },
    /// Call a function in the program's function table.
    Call { target: String },
    /// Pop a callable address, then behave as a call.
    IndirectCall,
    /// Call an externally linked function described by an ABI descriptor.
    NativeCall {
        target: String,
        num_params: usize,
        returns_value: bool,
    },
    Ret,
}

impl Instruction {
    /// Whether this instruction ends a basic block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Jump { .. } | Instruction::CondJump { .. } | Instruction::Ret
        )
    }

    /// The canonical opcode spelling, shared by the serializers, emitted
    /// assembly comments, and error messages.
    pub fn opcode(&self) -> &'static str {
        match self {
            Instruction::Noop => "NOOP",
            Instruction::LoadConst { .. } => "LOAD_CONST",
            Instruction::LoadLocal { .. } => "LOAD_LOCAL",
            Instruction::LoadParam { .. } => "LOAD_PARAM",
            Instruction::LoadGlobal { .. } => "LOAD_GLOBAL",
            Instruction::LoadMem { .. } => "LOAD_MEM",
            Instruction::LoadFuncAddr { .. } => "LOAD_FUNC_ADDR",
            Instruction::Pop => "POP",
            Instruction::StoreLocal { .. } => "STORE_LOCAL",
            Instruction::StoreParam { .. } => "STORE_PARAM",
            Instruction::StoreGlobal { .. } => "STORE_GLOBAL",
            Instruction::StoreMem { .. } => "STORE_MEM",
            Instruction::Add { .. } => "ADD",
            Instruction::Sub { .. } => "SUB",
            Instruction::Mul { .. } => "MUL",
            Instruction::Div { .. } => "DIV",
            Instruction::Mod { .. } => "MOD",
            Instruction::Inc { .. } => "INC",
            Instruction::Dec { .. } => "DEC",
            Instruction::Eq { .. } => "EQ",
            Instruction::Neq { .. } => "NEQ",
            Instruction::Gt { .. } => "GT",
            Instruction::Lt { .. } => "LT",
            Instruction::GtEq { .. } => "GTEQ",
            Instruction::LtEq { .. } => "LTEQ",
            Instruction::Neg { .. } => "NEG",
            Instruction::Or => "OR",
            Instruction::And => "AND",
            Instruction::Xor => "XOR",
            Instruction::Not => "NOT",
            Instruction::Shl { .. } => "SHL",
            Instruction::Shr { .. } => "SHR",
            Instruction::Convert { .. } => "CONVERT",
            Instruction::Jump { .. } => "JUMP",
            Instruction::CondJump { .. } => "COND_JUMP",
            Instruction::Call { .. } => "CALL",
            Instruction::IndirectCall => "INDIRECT_CALL",
            Instruction::NativeCall { .. } => "NATIVE_CALL",
            Instruction::Ret => "RET",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LoadConst { value } => {
                write!(f, "LOAD_CONST {}", value.as_hex(Endianness::Little))
            }
            Instruction::LoadLocal { idx } => write!(f, "LOAD_LOCAL {}", idx),
            Instruction::LoadParam { idx } => write!(f, "LOAD_PARAM {}", idx),
            Instruction::LoadGlobal { name } => write!(f, "LOAD_GLOBAL {}", name),
            Instruction::LoadMem { offset } => write!(f, "LOAD_MEM {}", offset),
            Instruction::LoadFuncAddr { name } => write!(f, "LOAD_FUNC_ADDR {}", name),
            Instruction::StoreLocal { idx } => write!(f, "STORE_LOCAL {}", idx),
            Instruction::StoreParam { idx } => write!(f, "STORE_PARAM {}", idx),
            Instruction::StoreGlobal { name } => write!(f, "STORE_GLOBAL {}", name),
            Instruction::StoreMem { offset } => write!(f, "STORE_MEM {}", offset),
            Instruction::Add { data_type }
            | Instruction::Sub { data_type }
            | Instruction::Mul { data_type }
            | Instruction::Div { data_type }
            | Instruction::Mod { data_type }
            | Instruction::Inc { data_type }
            | Instruction::Dec { data_type }
            | Instruction::Eq { data_type }
            | Instruction::Neq { data_type }
            | Instruction::Gt { data_type }
            | Instruction::Lt { data_type }
            | Instruction::GtEq { data_type }
            | Instruction::LtEq { data_type }
            | Instruction::Neg { data_type } => write!(f, "{} {}", self.opcode(), data_type),
            Instruction::Shl { amount } => write!(f, "SHL {}", amount),
            Instruction::Shr { amount } => write!(f, "SHR {}", amount),
            Instruction::Convert { from, to } => write!(f, "CONVERT {} {}", from, to),
            Instruction::Jump { target } => write!(f, "JUMP {}", target),
            Instruction::CondJump {
                true_target,
                false_target,
            } => write!(f, "COND_JUMP {} {}", true_target, false_target),
            Instruction::Call { target } => write!(f, "CALL {}", target),
            Instruction::NativeCall {
                target,
                num_params,
                returns_value,
            } => write!(f, "NATIVE_CALL {} {} {}", target, num_params, returns_value),
            _ => write!(f, "{}", self.opcode()),
        }
    }
}
