//! Functions
//!
//! A function owns its basic blocks, looked up by label rather than by
//! pointer, so the structure stays acyclic. Parameter and local names are
//! ordered and unique; instructions address them by index. The entry label
//! is set once and must name an existing block.

use crate::basic_block::BasicBlock;
use slasm_common::{EntryError, StructuralError};

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    name: String,
    params: Vec<String>,
    locals: Vec<String>,
    returns_value: bool,
    basic_blocks: Vec<(String, BasicBlock)>,
    entry: Option<String>,
}

impl Function {
    /// Create an empty function. Rejects duplicate parameter or local names.
    pub fn new(
        name: impl Into<String>,
        params: Vec<String>,
        locals: Vec<String>,
        returns_value: bool,
    ) -> Result<Function, StructuralError> {
        let name = name.into();

        for (i, param) in params.iter().enumerate() {
            if params[..i].contains(param) {
                return Err(StructuralError::DuplicateParam {
                    function: name,
                    name: param.clone(),
                });
            }
        }

        for (i, local) in locals.iter().enumerate() {
            if locals[..i].contains(local) {
                return Err(StructuralError::DuplicateLocal {
                    function: name,
                    name: local.clone(),
                });
            }
        }

        Ok(Function {
            name,
            params,
            locals,
            returns_value,
            basic_blocks: Vec::new(),
            entry: None,
        })
    }

    pub fn add_basic_block(
        &mut self,
        label: impl Into<String>,
        basic_block: BasicBlock,
    ) -> Result<(), StructuralError> {
        let label = label.into();

        if self.get_basic_block(&label).is_some() {
            return Err(StructuralError::DuplicateBlock {
                function: self.name.clone(),
                label,
            });
        }

        self.basic_blocks.push((label, basic_block));
        Ok(())
    }

    pub fn get_basic_block(&self, label: &str) -> Option<&BasicBlock> {
        self.basic_blocks
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, bb)| bb)
    }

    /// Pure validity query: does any owned block still accept appends?
    pub fn contains_nonterminated_basic_block(&self) -> bool {
        !self.basic_blocks.iter().all(|(_, bb)| bb.is_terminated())
    }

    pub fn set_entry(&mut self, label: impl Into<String>) -> Result<(), EntryError> {
        let label = label.into();

        if self.get_basic_block(&label).is_none() {
            return Err(EntryError::UnknownFunctionEntry {
                function: self.name.clone(),
                label,
            });
        }

        self.entry = Some(label);
        Ok(())
    }

    pub fn entry(&self) -> Result<&str, EntryError> {
        self.entry
            .as_deref()
            .ok_or_else(|| EntryError::FunctionEntryNotSet {
                function: self.name.clone(),
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter names in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Local names in declaration order.
    pub fn locals(&self) -> &[String] {
        &self.locals
    }

    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    pub fn num_locals(&self) -> usize {
        self.locals.len()
    }

    pub fn returns_value(&self) -> bool {
        self.returns_value
    }

    /// Blocks in insertion order.
    pub fn basic_blocks(&self) -> impl Iterator<Item = (&str, &BasicBlock)> {
        self.basic_blocks
            .iter()
            .map(|(label, bb)| (label.as_str(), bb))
    }
}
