//! Basic blocks
//!
//! An ordered, append-only instruction sequence. A block starts open and
//! becomes terminated once its last instruction is a control transfer
//! (JUMP, COND_JUMP, or RET); appending past that point is a structural
//! error, and there is no transition back.

use crate::instruction::Instruction;
use serde::{Deserialize, Serialize};
use slasm_common::StructuralError;
use std::ops::Index;
use std::slice::Iter;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasicBlock {
    instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new() -> BasicBlock {
        BasicBlock {
            instructions: Vec::new(),
        }
    }

    /// Append an instruction. Fails once the block is terminated.
    pub fn append(&mut self, instr: Instruction) -> Result<(), StructuralError> {
        if self.is_terminated() {
            return Err(StructuralError::AppendToTerminated);
        }

        self.instructions.push(instr);
        Ok(())
    }

    pub fn is_terminated(&self) -> bool {
        self.instructions
            .last()
            .is_some_and(|instr| instr.is_terminator())
    }

    pub fn iter(&self) -> Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl Index<usize> for BasicBlock {
    type Output = Instruction;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.instructions[idx]
    }
}

impl<'a> IntoIterator for &'a BasicBlock {
    type Item = &'a Instruction;
    type IntoIter = Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use slasm_common::Word;

    #[test]
    fn test_fresh_block_is_open() {
        let block = BasicBlock::new();
        assert!(!block.is_terminated());
        assert!(block.is_empty());
    }

    #[test]
    fn test_termination_transition() {
        let mut block = BasicBlock::new();
        block
            .append(Instruction::LoadConst {
                value: Word::from_i64(1),
            })
            .unwrap();
        assert!(!block.is_terminated());

        block.append(Instruction::Ret).unwrap();
        assert!(block.is_terminated());
    }

    #[test]
    fn test_append_after_terminator_fails() {
        let mut block = BasicBlock::new();
        block
            .append(Instruction::Jump {
                target: "done".to_string(),
            })
            .unwrap();

        let err = block.append(Instruction::Pop).unwrap_err();
        assert_eq!(err, StructuralError::AppendToTerminated);
        assert_eq!(block.len(), 1);
    }
}
