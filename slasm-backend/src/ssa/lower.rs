//! Program-to-SSA lowering
//!
//! Walks each function with a private value stack that mirrors the operand
//! stack at lowering time: loads push SSA values, stores and operations pop
//! them. Locals and parameters become word-sized slots allocated in the
//! entry block (incoming arguments are stored into their slots first), so
//! STORE_PARAM works the same as STORE_LOCAL. Popping an empty stack means
//! the program's stack discipline is broken and fails as a structural error.

use crate::abi::GlobalContext;
use crate::ssa::ir::{
    SsaBlock, SsaBinOp, SsaFunction, SsaInstr, SsaModule, SsaNative, SsaUnOp, SsaValue,
};
use log::{info, trace};
use slasm_common::{
    DataType, LoweringError, SlasmError, StructuralError,
};
use slasm_ir::{validate_program, Function, Instruction, Program};

const EMITTER: &str = "ssa";

struct FunctionContext<'a> {
    func_name: &'a str,
    returns_value: bool,
    global_ctx: &'a GlobalContext,
    value_stack: Vec<SsaValue>,
    next_temp: u32,
    param_slots: Vec<SsaValue>,
    local_slots: Vec<SsaValue>,
}

impl<'a> FunctionContext<'a> {
    fn new(func_name: &'a str, returns_value: bool, global_ctx: &'a GlobalContext) -> Self {
        FunctionContext {
            func_name,
            returns_value,
            global_ctx,
            value_stack: Vec::new(),
            next_temp: 0,
            param_slots: Vec::new(),
            local_slots: Vec::new(),
        }
    }

    fn fresh_temp(&mut self) -> SsaValue {
        let temp = SsaValue::Temp(self.next_temp);
        self.next_temp += 1;
        temp
    }

    fn push(&mut self, value: SsaValue) {
        self.value_stack.push(value);
    }

    fn pop(&mut self, opcode: &str) -> Result<SsaValue, SlasmError> {
        self.value_stack
            .pop()
            .ok_or_else(|| {
                StructuralError::OperandStackUnderflow {
                    function: self.func_name.to_string(),
                    opcode: opcode.to_string(),
                }
                .into()
            })
    }

    fn local_slot(&self, idx: u64) -> Result<SsaValue, SlasmError> {
        self.local_slots
            .get(idx as usize)
            .cloned()
            .ok_or_else(|| {
                StructuralError::UndefinedLocal {
                    function: self.func_name.to_string(),
                    index: idx,
                    count: self.local_slots.len(),
                }
                .into()
            })
    }

    fn param_slot(&self, idx: u64) -> Result<SsaValue, SlasmError> {
        self.param_slots
            .get(idx as usize)
            .cloned()
            .ok_or_else(|| {
                StructuralError::UndefinedParam {
                    function: self.func_name.to_string(),
                    index: idx,
                    count: self.param_slots.len(),
                }
                .into()
            })
    }
}

fn unsupported(opcode: &str, dt: DataType) -> SlasmError {
    LoweringError::UnsupportedDataType {
        emitter: EMITTER,
        opcode: opcode.to_string(),
        data_type: dt,
    }
    .into()
}

fn binop_for(instr: &Instruction) -> SsaBinOp {
    match instr {
        Instruction::Add { .. } => SsaBinOp::Add,
        Instruction::Sub { .. } => SsaBinOp::Sub,
        Instruction::Mul { .. } => SsaBinOp::Mul,
        Instruction::Div { .. } => SsaBinOp::Div,
        Instruction::Mod { .. } => SsaBinOp::Mod,
        Instruction::Eq { .. } => SsaBinOp::Eq,
        Instruction::Neq { .. } => SsaBinOp::Neq,
        Instruction::Gt { .. } => SsaBinOp::Gt,
        Instruction::Lt { .. } => SsaBinOp::Lt,
        Instruction::GtEq { .. } => SsaBinOp::GtEq,
        Instruction::LtEq { .. } => SsaBinOp::LtEq,
        // the binary-operator arm in lower_instruction admits nothing else
        _ => unreachable!(),
    }
}

fn lower_call(
    ctx: &mut FunctionContext<'_>,
    instrs: &mut Vec<SsaInstr>,
    opcode: &str,
    target: &str,
    num_params: usize,
    returns_value: bool,
) -> Result<(), SlasmError> {
    // operands were pushed left to right, so they pop off in reverse
    let mut args = Vec::with_capacity(num_params);
    for _ in 0..num_params {
        args.push(ctx.pop(opcode)?);
    }
    args.reverse();

    let dest = if returns_value {
        Some(ctx.fresh_temp())
    } else {
        None
    };

    instrs.push(SsaInstr::Call {
        dest: dest.clone(),
        target: target.to_string(),
        args,
    });

    if let Some(dest) = dest {
        ctx.push(dest);
    }
    Ok(())
}

fn lower_instruction(
    instr: &Instruction,
    ctx: &mut FunctionContext<'_>,
    instrs: &mut Vec<SsaInstr>,
) -> Result<(), SlasmError> {
    match instr {
        Instruction::Noop => {}

        Instruction::LoadConst { value } => ctx.push(SsaValue::Const(value.as_i64())),
        Instruction::LoadLocal { idx } => {
            let addr = ctx.local_slot(*idx)?;
            let dest = ctx.fresh_temp();
            instrs.push(SsaInstr::Load {
                dest: dest.clone(),
                addr,
            });
            ctx.push(dest);
        }
        Instruction::LoadParam { idx } => {
            let addr = ctx.param_slot(*idx)?;
            let dest = ctx.fresh_temp();
            instrs.push(SsaInstr::Load {
                dest: dest.clone(),
                addr,
            });
            ctx.push(dest);
        }
        Instruction::LoadGlobal { name } => {
            let dest = ctx.fresh_temp();
            instrs.push(SsaInstr::Load {
                dest: dest.clone(),
                addr: SsaValue::Global(name.clone()),
            });
            ctx.push(dest);
        }
        Instruction::LoadMem { offset } => {
            let base = ctx.pop("LOAD_MEM")?;
            let addr = ctx.fresh_temp();
            instrs.push(SsaInstr::Binary {
                dest: addr.clone(),
                op: SsaBinOp::Add,
                data_type: DataType::I64,
                lhs: base,
                rhs: SsaValue::Const(*offset),
            });
            let dest = ctx.fresh_temp();
            instrs.push(SsaInstr::Load {
                dest: dest.clone(),
                addr,
            });
            ctx.push(dest);
        }
        Instruction::LoadFuncAddr { name } => {
            ctx.global_ctx.get_function(name)?;
            ctx.push(SsaValue::Function(name.clone()));
        }

        Instruction::Pop => {
            ctx.pop("POP")?;
        }
        Instruction::StoreLocal { idx } => {
            let addr = ctx.local_slot(*idx)?;
            let value = ctx.pop("STORE_LOCAL")?;
            instrs.push(SsaInstr::Store { value, addr });
        }
        Instruction::StoreParam { idx } => {
            let addr = ctx.param_slot(*idx)?;
            let value = ctx.pop("STORE_PARAM")?;
            instrs.push(SsaInstr::Store { value, addr });
        }
        Instruction::StoreGlobal { name } => {
            let value = ctx.pop("STORE_GLOBAL")?;
            instrs.push(SsaInstr::Store {
                value,
                addr: SsaValue::Global(name.clone()),
            });
        }
        Instruction::StoreMem { offset } => {
            // address on top, then the value to store
            let base = ctx.pop("STORE_MEM")?;
            let value = ctx.pop("STORE_MEM")?;
            let addr = ctx.fresh_temp();
            instrs.push(SsaInstr::Binary {
                dest: addr.clone(),
                op: SsaBinOp::Add,
                data_type: DataType::I64,
                lhs: base,
                rhs: SsaValue::Const(*offset),
            });
            instrs.push(SsaInstr::Store { value, addr });
        }

        Instruction::Mod { data_type } if data_type.is_float() => {
            // r = a - trunc(a / b) * b, matching the native emitter
            let rhs = ctx.pop("MOD")?;
            let lhs = ctx.pop("MOD")?;
            let quotient = ctx.fresh_temp();
            instrs.push(SsaInstr::Binary {
                dest: quotient.clone(),
                op: SsaBinOp::Div,
                data_type: *data_type,
                lhs: lhs.clone(),
                rhs: rhs.clone(),
            });
            let truncated = ctx.fresh_temp();
            instrs.push(SsaInstr::Convert {
                dest: truncated.clone(),
                from: *data_type,
                to: DataType::I64,
                value: quotient,
            });
            let back = ctx.fresh_temp();
            instrs.push(SsaInstr::Convert {
                dest: back.clone(),
                from: DataType::I64,
                to: *data_type,
                value: truncated,
            });
            let product = ctx.fresh_temp();
            instrs.push(SsaInstr::Binary {
                dest: product.clone(),
                op: SsaBinOp::Mul,
                data_type: *data_type,
                lhs: back,
                rhs,
            });
            let dest = ctx.fresh_temp();
            instrs.push(SsaInstr::Binary {
                dest: dest.clone(),
                op: SsaBinOp::Sub,
                data_type: *data_type,
                lhs,
                rhs: product,
            });
            ctx.push(dest);
        }

        Instruction::Add { data_type }
        | Instruction::Sub { data_type }
        | Instruction::Mul { data_type }
        | Instruction::Div { data_type }
        | Instruction::Mod { data_type }
        | Instruction::Eq { data_type }
        | Instruction::Neq { data_type }
        | Instruction::Gt { data_type }
        | Instruction::Lt { data_type }
        | Instruction::GtEq { data_type }
        | Instruction::LtEq { data_type } => {
            let rhs = ctx.pop(instr.opcode())?;
            let lhs = ctx.pop(instr.opcode())?;
            let dest = ctx.fresh_temp();
            instrs.push(SsaInstr::Binary {
                dest: dest.clone(),
                op: binop_for(instr),
                data_type: *data_type,
                lhs,
                rhs,
            });
            ctx.push(dest);
        }

        Instruction::Inc { data_type } | Instruction::Dec { data_type } => {
            if data_type.is_float() {
                return Err(unsupported(instr.opcode(), *data_type));
            }
            let value = ctx.pop(instr.opcode())?;
            let dest = ctx.fresh_temp();
            instrs.push(SsaInstr::Binary {
                dest: dest.clone(),
                op: if matches!(instr, Instruction::Inc { .. }) {
                    SsaBinOp::Add
                } else {
                    SsaBinOp::Sub
                },
                data_type: *data_type,
                lhs: value,
                rhs: SsaValue::Const(1),
            });
            ctx.push(dest);
        }

        Instruction::Neg { data_type } => {
            if data_type.is_unsigned() {
                return Err(unsupported("NEG", *data_type));
            }
            let value = ctx.pop("NEG")?;
            let dest = ctx.fresh_temp();
            instrs.push(SsaInstr::Unary {
                dest: dest.clone(),
                op: SsaUnOp::Neg,
                data_type: *data_type,
                value,
            });
            ctx.push(dest);
        }

        Instruction::Or | Instruction::And | Instruction::Xor => {
            let rhs = ctx.pop(instr.opcode())?;
            let lhs = ctx.pop(instr.opcode())?;
            let dest = ctx.fresh_temp();
            instrs.push(SsaInstr::Binary {
                dest: dest.clone(),
                op: match instr {
                    Instruction::Or => SsaBinOp::Or,
                    Instruction::And => SsaBinOp::And,
                    _ => SsaBinOp::Xor,
                },
                data_type: DataType::UI64,
                lhs,
                rhs,
            });
            ctx.push(dest);
        }
        Instruction::Not => {
            let value = ctx.pop("NOT")?;
            let dest = ctx.fresh_temp();
            instrs.push(SsaInstr::Unary {
                dest: dest.clone(),
                op: SsaUnOp::Not,
                data_type: DataType::UI64,
                value,
            });
            ctx.push(dest);
        }
        Instruction::Shl { amount } | Instruction::Shr { amount } => {
            let value = ctx.pop(instr.opcode())?;
            let dest = ctx.fresh_temp();
            instrs.push(SsaInstr::Binary {
                dest: dest.clone(),
                op: if matches!(instr, Instruction::Shl { .. }) {
                    SsaBinOp::Shl
                } else {
                    SsaBinOp::Shr
                },
                data_type: DataType::UI64,
                lhs: value,
                rhs: SsaValue::Const(*amount as i64),
            });
            ctx.push(dest);
        }

        Instruction::Convert { from, to } => {
            if from == to {
                // same bit pattern, nothing to emit
            } else if *from == DataType::UI64 && to.is_float() {
                return Err(LoweringError::UnsupportedConversion {
                    emitter: EMITTER,
                    from: *from,
                    to: *to,
                }
                .into());
            } else {
                let value = ctx.pop("CONVERT")?;
                let dest = ctx.fresh_temp();
                instrs.push(SsaInstr::Convert {
                    dest: dest.clone(),
                    from: *from,
                    to: *to,
                    value,
                });
                ctx.push(dest);
            }
        }

        Instruction::Jump { target } => instrs.push(SsaInstr::Branch {
            target: target.clone(),
        }),
        Instruction::CondJump {
            true_target,
            false_target,
        } => {
            let value = ctx.pop("COND_JUMP")?;
            let cond = ctx.fresh_temp();
            instrs.push(SsaInstr::Binary {
                dest: cond.clone(),
                op: SsaBinOp::Neq,
                data_type: DataType::I64,
                lhs: value,
                rhs: SsaValue::Const(0),
            });
            instrs.push(SsaInstr::BranchCond {
                cond,
                true_target: true_target.clone(),
                false_target: false_target.clone(),
            });
        }

        Instruction::Call { target } => {
            let def = ctx.global_ctx.get_function(target)?;
            let (num_params, returns_value) = (def.num_params(), def.returns_value);
            lower_call(ctx, instrs, instr.opcode(), target, num_params, returns_value)?;
        }
        Instruction::NativeCall {
            target,
            num_params,
            returns_value,
        } => lower_call(ctx, instrs, instr.opcode(), target, *num_params, *returns_value)?,
        Instruction::IndirectCall => {
            return Err(LoweringError::UnsupportedInstruction {
                emitter: EMITTER,
                opcode: "INDIRECT_CALL".to_string(),
            }
            .into());
        }

        Instruction::Ret => {
            let value = if ctx.returns_value {
                Some(ctx.pop("RET")?)
            } else {
                None
            };
            instrs.push(SsaInstr::Return { value });
        }
    }

    Ok(())
}

fn lower_function(
    function: &Function,
    global_ctx: &GlobalContext,
) -> Result<SsaFunction, SlasmError> {
    trace!("lowering function '{}' to SSA", function.name());

    let mut ctx = FunctionContext::new(function.name(), function.returns_value(), global_ctx);

    // entry preamble: one slot per parameter and local, arguments copied in
    let mut preamble = Vec::new();
    for idx in 0..function.num_params() {
        let slot = ctx.fresh_temp();
        preamble.push(SsaInstr::Alloc { dest: slot.clone() });
        preamble.push(SsaInstr::Store {
            value: SsaValue::Arg(idx),
            addr: slot.clone(),
        });
        ctx.param_slots.push(slot);
    }
    for _ in 0..function.num_locals() {
        let slot = ctx.fresh_temp();
        preamble.push(SsaInstr::Alloc { dest: slot.clone() });
        ctx.local_slots.push(slot);
    }

    let entry = function.entry()?.to_string();
    let mut blocks = Vec::new();

    // entry block first, then the rest in insertion order
    let ordered = function
        .basic_blocks()
        .filter(|(label, _)| *label == entry)
        .chain(function.basic_blocks().filter(|(label, _)| *label != entry));

    for (label, bb) in ordered {
        let mut instrs = if label == entry {
            std::mem::take(&mut preamble)
        } else {
            Vec::new()
        };

        for instr in bb {
            lower_instruction(instr, &mut ctx, &mut instrs)?;
        }

        blocks.push(SsaBlock {
            label: label.to_string(),
            instrs,
        });
    }

    Ok(SsaFunction {
        name: function.name().to_string(),
        num_params: function.num_params(),
        returns_value: function.returns_value(),
        blocks,
    })
}

/// Lower a validated program to an SSA module. Shares no state with the NASM
/// emitter; both can run on the same program in either order.
pub fn emit_module(
    program: &Program,
    native_funcs: Vec<(String, crate::abi::FuncDef)>,
) -> Result<SsaModule, SlasmError> {
    validate_program(program)?;

    let global_ctx = GlobalContext::build(program, native_funcs)?;
    global_ctx.check_call_sites(program)?;

    info!(
        "emitting SSA module for target '{}' ({} function(s))",
        program.target(),
        program.functions().count()
    );

    let natives = global_ctx
        .natives()
        .map(|(name, def)| SsaNative {
            name: name.to_string(),
            num_params: def.num_params(),
            returns_value: def.returns_value,
        })
        .collect();

    let functions = program
        .functions()
        .map(|f| lower_function(f, &global_ctx))
        .collect::<Result<_, _>>()?;

    Ok(SsaModule {
        target: program.target().to_string(),
        natives,
        functions,
    })
}
