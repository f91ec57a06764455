//! Whole-module NASM emission
//!
//! Emits the fixed module shell around the lowered functions: version and
//! target header comments, the exported `_main` trampoline, one `extern` per
//! native descriptor, the data and bss sections, and the text section. The
//! program is validated and its call sites checked before any text is built,
//! so a failing program produces no partial output.

use crate::abi::{FuncDef, GlobalContext};
use crate::nasm::function::emit_function;
use log::info;
use slasm_common::{SlasmError, VERSION, WORD_SIZE};
use slasm_ir::{validate_program, Program};

/// Lower a validated program to a complete NASM module. Emission is
/// deterministic: the same program and natives produce identical text.
pub fn emit_program(
    program: &Program,
    native_funcs: Vec<(String, FuncDef)>,
) -> Result<String, SlasmError> {
    validate_program(program)?;

    let global_ctx = GlobalContext::build(program, native_funcs)?;
    global_ctx.check_call_sites(program)?;

    info!(
        "emitting NASM module for target '{}' ({} function(s))",
        program.target(),
        program.functions().count()
    );

    let mut text = format!("; SLASM_VERSION {}\n; TARGET {}\n", VERSION, program.target());

    text.push_str("\nglobal _main\n");
    for (name, _) in global_ctx.natives() {
        text.push_str(&format!("extern {}\n", name));
    }

    text.push_str("\n    section .data\n");
    for (label, bytes) in program.data() {
        let bytes = bytes
            .iter()
            .map(|b| b.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!("{}: db {}\n", label, bytes));
    }

    text.push_str("\n    section .bss\n");
    for name in program.globals() {
        text.push_str(&format!("{}: resb {}\n", name, WORD_SIZE));
    }

    text.push_str("\n    section .text\n");

    // exit status of the entry function is forwarded in rax
    let entry = program.entry()?;
    text.push_str(&format!("_main:\n    call {}\n    ret\n", entry));

    for function in program.functions() {
        text.push_str(&emit_function(function, &global_ctx)?);
        text.push('\n');
    }

    Ok(text)
}
