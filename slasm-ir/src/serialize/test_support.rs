//! Builders shared by the serializer tests.

use crate::basic_block::BasicBlock;
use crate::function::Function;
use crate::instruction::Instruction;
use crate::program::Program;
use slasm_common::{DataType, Word};

/// Every instruction variant, terminators last. Keeping the list in one
/// place lets the serializer tests assert they cover the whole vocabulary.
pub(crate) fn every_instruction() -> Vec<Instruction> {
    vec![
        Instruction::Noop,
        Instruction::LoadConst {
            value: Word::from_i64(7),
        },
        Instruction::LoadLocal { idx: 0 },
        Instruction::LoadParam { idx: 0 },
        Instruction::LoadGlobal {
            name: "counter".to_string(),
        },
        Instruction::LoadMem { offset: 8 },
        Instruction::LoadFuncAddr {
            name: "main".to_string(),
        },
        Instruction::Pop,
        Instruction::StoreLocal { idx: 0 },
        Instruction::StoreParam { idx: 0 },
        Instruction::StoreGlobal {
            name: "counter".to_string(),
        },
        Instruction::StoreMem { offset: -8 },
        Instruction::Add {
            data_type: DataType::I64,
        },
        Instruction::Sub {
            data_type: DataType::I32,
        },
        Instruction::Mul {
            data_type: DataType::UI16,
        },
        Instruction::Div {
            data_type: DataType::F64,
        },
        Instruction::Mod {
            data_type: DataType::UI8,
        },
        Instruction::Inc {
            data_type: DataType::I8,
        },
        Instruction::Dec {
            data_type: DataType::UI64,
        },
        Instruction::Eq {
            data_type: DataType::I64,
        },
        Instruction::Neq {
            data_type: DataType::F32,
        },
        Instruction::Gt {
            data_type: DataType::I16,
        },
        Instruction::Lt {
            data_type: DataType::UI32,
        },
        Instruction::GtEq {
            data_type: DataType::I64,
        },
        Instruction::LtEq {
            data_type: DataType::F64,
        },
        Instruction::Neg {
            data_type: DataType::I32,
        },
        Instruction::Or,
        Instruction::And,
        Instruction::Xor,
        Instruction::Not,
        Instruction::Shl { amount: 3 },
        Instruction::Shr { amount: 1 },
        Instruction::Convert {
            from: DataType::I32,
            to: DataType::F64,
        },
        Instruction::Call {
            target: "main".to_string(),
        },
        Instruction::IndirectCall,
        Instruction::NativeCall {
            target: "print".to_string(),
            num_params: 1,
            returns_value: false,
        },
        Instruction::Jump {
            target: "b1".to_string(),
        },
        Instruction::CondJump {
            true_target: "b0".to_string(),
            false_target: "b2".to_string(),
        },
        Instruction::Ret,
    ]
}

/// A program whose blocks hold `every_instruction()` in order; terminators
/// each close their own block.
pub(crate) fn every_instruction_program() -> Program {
    let mut blocks: Vec<(String, BasicBlock)> = Vec::new();
    let mut current = BasicBlock::new();

    for instr in every_instruction() {
        let terminates = instr.is_terminator();
        current.append(instr).unwrap();
        if terminates {
            let label = format!("b{}", blocks.len());
            blocks.push((label, std::mem::take(&mut current)));
        }
    }
    assert!(current.is_empty(), "trailing instructions without a terminator");

    let mut func = Function::new(
        "main",
        vec!["a".to_string()],
        vec!["tmp".to_string()],
        false,
    )
    .unwrap();
    let entry = blocks[0].0.clone();
    for (label, bb) in blocks {
        func.add_basic_block(label, bb).unwrap();
    }
    func.set_entry(entry).unwrap();

    let mut program = Program::new("x86-64-linux-nasm");
    program.add_global("counter").unwrap();
    program.add_function(func).unwrap();
    program.set_entry("main").unwrap();
    program
}
