//! Callable descriptors shared by both emitters
//!
//! Every call site in a program resolves through a [`GlobalContext`]: a map
//! from callable name to its declared signature, built once per emission from
//! the program's own functions plus a caller-supplied table of natives.
//! Descriptors are forward-declared before any body is lowered, so mutual
//! and forward references resolve regardless of declaration order.

use log::debug;
use slasm_common::{AbiError, SlasmError, StructuralError};
use slasm_ir::{Instruction, Program};

/// The signature a call site is checked against. Native functions declare no
/// locals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDef {
    pub params: Vec<String>,
    pub locals: Vec<String>,
    pub returns_value: bool,
}

impl FuncDef {
    /// Descriptor for an externally linked function.
    pub fn native(params: Vec<String>, returns_value: bool) -> FuncDef {
        FuncDef {
            params,
            locals: Vec::new(),
            returns_value,
        }
    }

    pub fn num_params(&self) -> usize {
        self.params.len()
    }
}

/// Name-to-descriptor table covering every callable an emission may reach.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    func_defs: Vec<(String, FuncDef)>,
    num_natives: usize,
}

impl GlobalContext {
    /// Build the table from a program and its native descriptors. A program
    /// function sharing a name with a native is a structural defect.
    pub fn build(
        program: &Program,
        native_funcs: Vec<(String, FuncDef)>,
    ) -> Result<GlobalContext, StructuralError> {
        let mut func_defs = Vec::with_capacity(native_funcs.len());

        for (name, def) in native_funcs {
            if func_defs.iter().any(|(n, _)| *n == name) {
                return Err(StructuralError::DuplicateFunction { name });
            }
            func_defs.push((name, def));
        }

        let num_natives = func_defs.len();

        for function in program.functions() {
            if func_defs.iter().any(|(n, _)| n == function.name()) {
                return Err(StructuralError::DuplicateFunction {
                    name: function.name().to_string(),
                });
            }
            func_defs.push((
                function.name().to_string(),
                FuncDef {
                    params: function.params().to_vec(),
                    locals: function.locals().to_vec(),
                    returns_value: function.returns_value(),
                },
            ));
        }

        debug!(
            "global context holds {} callable(s) ({} native)",
            func_defs.len(),
            num_natives
        );

        Ok(GlobalContext {
            func_defs,
            num_natives,
        })
    }

    pub fn get_function(&self, name: &str) -> Result<&FuncDef, StructuralError> {
        self.func_defs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, def)| def)
            .ok_or_else(|| StructuralError::UndefinedFunction {
                name: name.to_string(),
            })
    }

    /// Native descriptors in declaration order.
    pub fn natives(&self) -> impl Iterator<Item = (&str, &FuncDef)> {
        self.func_defs[..self.num_natives]
            .iter()
            .map(|(name, def)| (name.as_str(), def))
    }

    /// Check every call site in the program against this table: `CALL` and
    /// `LOAD_FUNC_ADDR` targets must be declared, and `NATIVE_CALL` operands
    /// must agree with the callee's descriptor.
    pub fn check_call_sites(&self, program: &Program) -> Result<(), SlasmError> {
        for function in program.functions() {
            for (_, bb) in function.basic_blocks() {
                for instr in bb {
                    match instr {
                        Instruction::Call { target }
                        | Instruction::LoadFuncAddr { name: target } => {
                            self.get_function(target)?;
                        }
                        Instruction::NativeCall {
                            target,
                            num_params,
                            returns_value,
                        } => {
                            let def = self.get_function(target)?;
                            if def.num_params() != *num_params {
                                return Err(AbiError::ArityMismatch {
                                    callee: target.clone(),
                                    declared: def.num_params(),
                                    actual: *num_params,
                                }
                                .into());
                            }
                            if def.returns_value != *returns_value {
                                return Err(AbiError::ReturnMismatch {
                                    callee: target.clone(),
                                    declared: def.returns_value,
                                    actual: *returns_value,
                                }
                                .into());
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }
}
