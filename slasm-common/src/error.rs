//! Error handling for the SLASM toolchain
//!
//! Four error classes cover the pipeline: structural defects in the IR,
//! unresolved entry points, ABI mismatches at call sites, and lowering gaps
//! in a backend. All are fatal for the current pipeline stage; none are
//! retried. Every variant carries enough context (entity name, opcode, data
//! type) to locate the defect.

use crate::types::DataType;
use thiserror::Error;

/// Malformed IR structure: duplicate names, appends past a terminator, or
/// references that do not resolve.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("program already contains a function named '{name}'")]
    DuplicateFunction { name: String },

    #[error("function '{function}' already contains a basic block labelled '{label}'")]
    DuplicateBlock { function: String, label: String },

    #[error("program already contains a global named '{name}'")]
    DuplicateGlobal { name: String },

    #[error("program already contains data labelled '{label}'")]
    DuplicateData { label: String },

    #[error("function '{function}' declares parameter '{name}' more than once")]
    DuplicateParam { function: String, name: String },

    #[error("function '{function}' declares local '{name}' more than once")]
    DuplicateLocal { function: String, name: String },

    #[error("cannot append an instruction to a terminated basic block")]
    AppendToTerminated,

    #[error("basic block '{label}' in function '{function}' is not terminated")]
    NonTerminatedBlock { function: String, label: String },

    #[error("function '{function}' does not contain a basic block labelled '{label}'")]
    UndefinedLabel { function: String, label: String },

    #[error("function '{function}' has no local with index {index} (it declares {count})")]
    UndefinedLocal {
        function: String,
        index: u64,
        count: usize,
    },

    #[error("function '{function}' has no parameter with index {index} (it declares {count})")]
    UndefinedParam {
        function: String,
        index: u64,
        count: usize,
    },

    #[error("program does not declare a global named '{name}'")]
    UndefinedGlobal { name: String },

    #[error("no function or native descriptor declared for '{name}'")]
    UndefinedFunction { name: String },

    #[error("operand stack underflow while lowering {opcode} in function '{function}'")]
    OperandStackUnderflow { function: String, opcode: String },
}

/// An entry designation that is missing or does not resolve.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("program does not have a set entry function")]
    ProgramEntryNotSet,

    #[error("program does not contain a function named '{name}'")]
    UnknownProgramEntry { name: String },

    #[error("function '{function}' does not have a set entry block")]
    FunctionEntryNotSet { function: String },

    #[error("function '{function}' does not contain a basic block labelled '{label}'")]
    UnknownFunctionEntry { function: String, label: String },
}

/// A call site that disagrees with the callee's declared ABI descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error(
        "NATIVE_CALL to '{callee}' passes {actual} parameter(s) but its \
         descriptor declares {declared}"
    )]
    ArityMismatch {
        callee: String,
        declared: usize,
        actual: usize,
    },

    #[error(
        "NATIVE_CALL to '{callee}' says returns_value = {actual} but its \
         descriptor declares returns_value = {declared}"
    )]
    ReturnMismatch {
        callee: String,
        declared: bool,
        actual: bool,
    },
}

/// An `(opcode, DataType)` combination the active emitter has no lowering
/// for. Never retried or defaulted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoweringError {
    #[error("{emitter} backend cannot lower {opcode} for data type {data_type}")]
    UnsupportedDataType {
        emitter: &'static str,
        opcode: String,
        data_type: DataType,
    },

    #[error("{emitter} backend cannot lower CONVERT from {from} to {to}")]
    UnsupportedConversion {
        emitter: &'static str,
        from: DataType,
        to: DataType,
    },

    #[error("{emitter} backend has no lowering for {opcode}")]
    UnsupportedInstruction {
        emitter: &'static str,
        opcode: String,
    },
}

/// Umbrella error for any pipeline stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlasmError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error(transparent)]
    Lowering(#[from] LoweringError),
}
