//! SLASM Compiler Toolchain - Intermediate Representation
//!
//! This crate defines the stack-machine IR that sits between a source
//! language front end and the code generation backends: typed word values
//! flow through a closed instruction vocabulary organized into basic blocks,
//! functions, and a top-level program.
//!
//! Entities are built once, bottom-up (instructions into blocks, blocks into
//! functions, functions into a program), validated, then handed immutably to
//! an emitter.

pub mod basic_block;
pub mod function;
pub mod instruction;
pub mod program;
pub mod serialize;
pub mod validate;

pub use basic_block::BasicBlock;
pub use function::Function;
pub use instruction::Instruction;
pub use program::Program;
pub use serialize::SerializeError;
pub use validate::validate_program;

pub use slasm_common::{DataType, Endianness, SlasmError, Word, WORD_SIZE};
