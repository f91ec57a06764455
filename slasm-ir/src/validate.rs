//! Structural validation
//!
//! A pure pass over a finished program, run by every emitter before any
//! output is produced: all blocks terminated, entries set and resolving,
//! branch targets resolving within their function, local/parameter indices
//! in range, and global references declared. Call targets are checked by
//! the backends, which also know about native descriptors.

use crate::function::Function;
use crate::instruction::Instruction;
use crate::program::Program;
use log::debug;
use slasm_common::{SlasmError, StructuralError};

/// Validate every structural invariant of a program.
pub fn validate_program(program: &Program) -> Result<(), SlasmError> {
    debug!("validating program for target '{}'", program.target());

    let entry = program.entry()?;
    // set_entry already guarantees resolution, but entries can also arrive
    // through deserialization
    if program.get_function(entry).is_none() {
        return Err(SlasmError::Entry(
            slasm_common::EntryError::UnknownProgramEntry {
                name: entry.to_string(),
            },
        ));
    }

    for function in program.functions() {
        validate_function(program, function)?;
    }

    Ok(())
}

fn validate_function(program: &Program, function: &Function) -> Result<(), SlasmError> {
    let entry = function.entry()?;
    if function.get_basic_block(entry).is_none() {
        return Err(SlasmError::Entry(
            slasm_common::EntryError::UnknownFunctionEntry {
                function: function.name().to_string(),
                label: entry.to_string(),
            },
        ));
    }

    for (label, bb) in function.basic_blocks() {
        if !bb.is_terminated() {
            return Err(StructuralError::NonTerminatedBlock {
                function: function.name().to_string(),
                label: label.to_string(),
            }
            .into());
        }

        for instr in bb {
            validate_instruction(program, function, instr)?;
        }
    }

    Ok(())
}

fn validate_instruction(
    program: &Program,
    function: &Function,
    instr: &Instruction,
) -> Result<(), SlasmError> {
    match instr {
        Instruction::LoadLocal { idx } | Instruction::StoreLocal { idx } => {
            check_local(function, *idx)
        }
        Instruction::LoadParam { idx } | Instruction::StoreParam { idx } => {
            check_param(function, *idx)
        }
        Instruction::LoadGlobal { name } | Instruction::StoreGlobal { name } => {
            if !program.globals().contains(name) {
                return Err(StructuralError::UndefinedGlobal { name: name.clone() }.into());
            }
            Ok(())
        }
        Instruction::Jump { target } => check_label(function, target),
        Instruction::CondJump {
            true_target,
            false_target,
        } => {
            check_label(function, true_target)?;
            check_label(function, false_target)
        }
        _ => Ok(()),
    }
}

fn check_label(function: &Function, label: &str) -> Result<(), SlasmError> {
    if function.get_basic_block(label).is_none() {
        return Err(StructuralError::UndefinedLabel {
            function: function.name().to_string(),
            label: label.to_string(),
        }
        .into());
    }
    Ok(())
}

fn check_local(function: &Function, idx: u64) -> Result<(), SlasmError> {
    if idx as usize >= function.num_locals() {
        return Err(StructuralError::UndefinedLocal {
            function: function.name().to_string(),
            index: idx,
            count: function.num_locals(),
        }
        .into());
    }
    Ok(())
}

fn check_param(function: &Function, idx: u64) -> Result<(), SlasmError> {
    if idx as usize >= function.num_params() {
        return Err(StructuralError::UndefinedParam {
            function: function.name().to_string(),
            index: idx,
            count: function.num_params(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_block::BasicBlock;
    use slasm_common::Word;

    fn program_with(function: Function) -> Program {
        let mut program = Program::new("x86-64-linux-nasm");
        let name = function.name().to_string();
        program.add_function(function).unwrap();
        program.set_entry(name).unwrap();
        program
    }

    #[test]
    fn test_jump_chain_is_valid() {
        let mut entry = BasicBlock::new();
        entry
            .append(Instruction::Jump {
                target: "done".to_string(),
            })
            .unwrap();

        let mut done = BasicBlock::new();
        done.append(Instruction::LoadConst {
            value: Word::from_i64(0),
        })
        .unwrap();
        done.append(Instruction::Ret).unwrap();

        let mut func = Function::new("main", vec![], vec![], true).unwrap();
        func.add_basic_block("entry", entry).unwrap();
        func.add_basic_block("done", done).unwrap();
        func.set_entry("entry").unwrap();

        assert!(validate_program(&program_with(func)).is_ok());
    }

    #[test]
    fn test_nonterminated_block_is_invalid() {
        let mut entry = BasicBlock::new();
        entry
            .append(Instruction::LoadConst {
                value: Word::from_i64(0),
            })
            .unwrap();

        let mut func = Function::new("main", vec![], vec![], true).unwrap();
        func.add_basic_block("entry", entry).unwrap();
        func.set_entry("entry").unwrap();

        let err = validate_program(&program_with(func)).unwrap_err();
        assert!(matches!(
            err,
            SlasmError::Structural(StructuralError::NonTerminatedBlock { .. })
        ));
    }

    #[test]
    fn test_undefined_jump_target() {
        let mut entry = BasicBlock::new();
        entry
            .append(Instruction::Jump {
                target: "missing".to_string(),
            })
            .unwrap();

        let mut func = Function::new("main", vec![], vec![], false).unwrap();
        func.add_basic_block("entry", entry).unwrap();
        func.set_entry("entry").unwrap();

        let err = validate_program(&program_with(func)).unwrap_err();
        assert!(matches!(
            err,
            SlasmError::Structural(StructuralError::UndefinedLabel { .. })
        ));
    }

    #[test]
    fn test_local_index_out_of_range() {
        let mut entry = BasicBlock::new();
        entry.append(Instruction::LoadLocal { idx: 2 }).unwrap();
        entry.append(Instruction::Ret).unwrap();

        let mut func =
            Function::new("main", vec![], vec!["a".to_string(), "b".to_string()], false).unwrap();
        func.add_basic_block("entry", entry).unwrap();
        func.set_entry("entry").unwrap();

        let err = validate_program(&program_with(func)).unwrap_err();
        assert!(matches!(
            err,
            SlasmError::Structural(StructuralError::UndefinedLocal { index: 2, .. })
        ));
    }

    #[test]
    fn test_undeclared_global() {
        let mut entry = BasicBlock::new();
        entry
            .append(Instruction::StoreGlobal {
                name: "counter".to_string(),
            })
            .unwrap();
        entry.append(Instruction::Ret).unwrap();

        let mut func = Function::new("main", vec![], vec![], false).unwrap();
        func.add_basic_block("entry", entry).unwrap();
        func.set_entry("entry").unwrap();

        let err = validate_program(&program_with(func)).unwrap_err();
        assert!(matches!(
            err,
            SlasmError::Structural(StructuralError::UndefinedGlobal { .. })
        ));
    }
}
