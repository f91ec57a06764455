//! Programs
//!
//! The top-level compilation unit: an opaque target identifier, word-sized
//! global storage slots, named byte blobs (padded to word multiples), the
//! function table, and a set-once entry function. Functions are stored in
//! insertion order and looked up by name.

use crate::function::Function;
use slasm_common::{EntryError, StructuralError, WORD_SIZE};

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    target: String,
    globals: Vec<String>,
    data: Vec<(String, Vec<u8>)>,
    functions: Vec<Function>,
    entry: Option<String>,
}

impl Program {
    pub fn new(target: impl Into<String>) -> Program {
        Program {
            target: target.into(),
            globals: Vec::new(),
            data: Vec::new(),
            functions: Vec::new(),
            entry: None,
        }
    }

    pub fn add_function(&mut self, function: Function) -> Result<(), StructuralError> {
        if self.get_function(function.name()).is_some() {
            return Err(StructuralError::DuplicateFunction {
                name: function.name().to_string(),
            });
        }

        self.functions.push(function);
        Ok(())
    }

    pub fn add_global(&mut self, name: impl Into<String>) -> Result<(), StructuralError> {
        let name = name.into();

        if self.globals.contains(&name) {
            return Err(StructuralError::DuplicateGlobal { name });
        }

        self.globals.push(name);
        Ok(())
    }

    /// Add a named byte blob, padded with zeroes to a word-size multiple.
    pub fn add_data(
        &mut self,
        label: impl Into<String>,
        mut data: Vec<u8>,
    ) -> Result<(), StructuralError> {
        let label = label.into();

        if self.data.iter().any(|(name, _)| *name == label) {
            return Err(StructuralError::DuplicateData { label });
        }

        let padding = (WORD_SIZE - data.len() % WORD_SIZE) % WORD_SIZE;
        data.extend(std::iter::repeat(0).take(padding));

        self.data.push((label, data));
        Ok(())
    }

    /// Pure validity query across every owned function.
    pub fn contains_nonterminated_basic_block(&self) -> bool {
        self.functions
            .iter()
            .any(|f| f.contains_nonterminated_basic_block())
    }

    pub fn set_entry(&mut self, func_name: impl Into<String>) -> Result<(), EntryError> {
        let func_name = func_name.into();

        if self.get_function(&func_name).is_none() {
            return Err(EntryError::UnknownProgramEntry { name: func_name });
        }

        self.entry = Some(func_name);
        Ok(())
    }

    pub fn entry(&self) -> Result<&str, EntryError> {
        self.entry.as_deref().ok_or(EntryError::ProgramEntryNotSet)
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name() == name)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Global names in declaration order.
    pub fn globals(&self) -> &[String] {
        &self.globals
    }

    /// Data blobs in declaration order.
    pub fn data(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.data
            .iter()
            .map(|(label, bytes)| (label.as_str(), bytes.as_slice()))
    }

    /// Functions in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }
}
