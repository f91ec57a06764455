//! SLASM Compiler Toolchain - Common Types and Errors
//!
//! This crate contains the leaf types shared by the IR and both code
//! generation backends: the word-sized value container, the data type
//! enumeration, and the error taxonomy.

pub mod error;
pub mod types;
pub mod word;

pub use error::{AbiError, EntryError, LoweringError, SlasmError, StructuralError};
pub use types::{DataType, WORD_SIZE};
pub use word::{Endianness, Word};

/// SLASM intermediate representation version, propagated into emitted output.
pub const VERSION: &str = "1.0.0";
