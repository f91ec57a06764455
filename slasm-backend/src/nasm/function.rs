//! Function and basic-block emission
//!
//! One NASM label per function, one local `.label:` per basic block. The
//! entry block is emitted first; the rest follow in insertion order.

use crate::abi::GlobalContext;
use crate::nasm::instr::emit_instruction;
use log::trace;
use slasm_common::SlasmError;
use slasm_ir::{BasicBlock, Function};

/// Per-function emission state: the enclosing function's identity plus the
/// callable table used to resolve its call sites.
pub(crate) struct FunctionContext<'a> {
    func_name: &'a str,
    returns_value: bool,
    global_ctx: &'a GlobalContext,
}

impl<'a> FunctionContext<'a> {
    pub(crate) fn new(
        func_name: &'a str,
        returns_value: bool,
        global_ctx: &'a GlobalContext,
    ) -> FunctionContext<'a> {
        FunctionContext {
            func_name,
            returns_value,
            global_ctx,
        }
    }

    pub(crate) fn func_name(&self) -> &str {
        self.func_name
    }

    pub(crate) fn returns_value(&self) -> bool {
        self.returns_value
    }

    pub(crate) fn global_ctx(&self) -> &GlobalContext {
        self.global_ctx
    }
}

fn emit_basic_block(
    label: &str,
    bb: &BasicBlock,
    ctx: &FunctionContext<'_>,
) -> Result<String, SlasmError> {
    let mut text = format!("\n  .{}:", label);

    for instr in bb {
        let lowered = emit_instruction(instr, ctx)?.replace('\n', "\n    ");
        text.push_str(&format!("\n    {}", lowered));
    }

    Ok(text)
}

pub(crate) fn emit_function(
    function: &Function,
    global_ctx: &GlobalContext,
) -> Result<String, SlasmError> {
    trace!("emitting function '{}'", function.name());

    let ctx = FunctionContext::new(function.name(), function.returns_value(), global_ctx);
    let entry = function.entry()?;
    let mut text = format!("{}:", ctx.func_name());

    // entry block first so fallthrough from the function label is correct
    for (label, bb) in function.basic_blocks().filter(|(label, _)| *label == entry) {
        text.push_str(&emit_basic_block(label, bb, &ctx)?);
    }
    for (label, bb) in function.basic_blocks().filter(|(label, _)| *label != entry) {
        text.push_str(&emit_basic_block(label, bb, &ctx)?);
    }

    Ok(text)
}
