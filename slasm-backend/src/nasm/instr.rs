//! Per-instruction x86-64 lowering
//!
//! The operand stack maps onto the machine stack; `rax`/`rbx` are the two
//! scratch registers (RHS pops into `rbx` first, LHS into `rax` second) and
//! floats round-trip through `xmm0`/`xmm1`/`xmm2` via bit-pattern `movq`.
//! Each lowering opens with a `; OPCODE` comment line. An `(opcode, type)`
//! pair with no entry here is a fatal [`LoweringError`].

use crate::nasm::function::FunctionContext;
use slasm_common::{DataType, Endianness, LoweringError, SlasmError, WORD_SIZE};
use slasm_ir::Instruction;

const EMITTER: &str = "nasm";

/// Width aliases of (`rax`, `rbx`) for an integer type, or `None` for floats.
fn gp_aliases(dt: DataType) -> Option<(&'static str, &'static str)> {
    match dt {
        DataType::I8 | DataType::UI8 => Some(("al", "bl")),
        DataType::I16 | DataType::UI16 => Some(("ax", "bx")),
        DataType::I32 | DataType::UI32 => Some(("eax", "ebx")),
        DataType::I64 | DataType::UI64 => Some(("rax", "rbx")),
        DataType::F32 | DataType::F64 => None,
    }
}

/// Instruction that widens the `from`-typed value in `rax` to the full word,
/// or `None` when the value already fills it.
fn int_extend(from: DataType) -> Option<&'static str> {
    match from {
        DataType::I8 => Some("movsx rax, al"),
        DataType::UI8 => Some("movzx rax, al"),
        DataType::I16 => Some("movsx rax, ax"),
        DataType::UI16 => Some("movzx rax, ax"),
        DataType::I32 => Some("movsxd rax, eax"),
        DataType::UI32 => Some("mov eax, eax"),
        _ => None,
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

fn mem_operand(base: &str, offset: i64) -> String {
    let sign = if offset < 0 { '-' } else { '+' };
    format!("[{}{}{}]", base, sign, offset.unsigned_abs())
}

/// ADD, SUB, and MUL share one shape: width-aliased integer instruction, or
/// a scalar XMM operation for floats.
fn emit_arith(
    instr: &Instruction,
    dt: DataType,
    int_mnemonic: &str,
    float_mnemonic: &str,
) -> String {
    let mut text = format!("; {} {}\npop rbx\npop rax\n", instr.opcode(), dt);

    match gp_aliases(dt) {
        // no 8-bit two-operand imul; multiplication widens to 16 bits
        Some(("al", "bl")) if int_mnemonic == "imul" => {
            text.push_str("imul ax, bx\n");
        }
        Some((a, b)) => {
            text.push_str(&format!("{} {}, {}\n", int_mnemonic, a, b));
        }
        None => {
            let suffix = if dt == DataType::F32 { "ss" } else { "sd" };
            text.push_str(&format!(
                "movq xmm0, rax\nmovq xmm1, rbx\n{}{} xmm0, xmm1\nmovq rax, xmm0\n",
                float_mnemonic, suffix
            ));
        }
    }

    text.push_str("push rax");
    text
}

/// DIV and MOD: sign-extend or zero the high half, divide, then keep either
/// the quotient or the remainder register.
fn emit_divide(instr: &Instruction, dt: DataType, remainder: bool) -> String {
    let mut text = format!("; {} {}\npop rbx\npop rax\n", instr.opcode(), dt);

    let take = match dt {
        DataType::I8 => {
            text.push_str("movsx eax, al\nmovsx ecx, bl\ncdq\nidiv ecx\n");
            "mov eax, edx\n"
        }
        DataType::UI8 => {
            text.push_str("mov rdx, 0\ndiv bl\n");
            // 8-bit div leaves the remainder in ah
            "mov al, ah\n"
        }
        DataType::I16 => {
            text.push_str("movsx eax, ax\nmovsx ecx, bx\ncdq\nidiv ecx\n");
            "mov ax, dx\n"
        }
        DataType::UI16 => {
            text.push_str("mov rdx, 0\ndiv bx\n");
            "mov ax, dx\n"
        }
        DataType::I32 => {
            text.push_str("cdq\nidiv ebx\n");
            "mov eax, edx\n"
        }
        DataType::UI32 => {
            text.push_str("mov rdx, 0\ndiv ebx\n");
            "mov eax, edx\n"
        }
        DataType::I64 => {
            text.push_str("cqo\nidiv rbx\n");
            "mov rax, rdx\n"
        }
        DataType::UI64 => {
            text.push_str("mov rdx, 0\ndiv rbx\n");
            "mov rax, rdx\n"
        }
        DataType::F32 | DataType::F64 => {
            let suffix = if dt == DataType::F32 { "ss" } else { "sd" };
            if remainder {
                // no native float remainder: r = a - trunc(a / b) * b
                text.push_str(&format!(
                    "movq xmm0, rax\n\
                     movq xmm1, rbx\n\
                     movq xmm2, rax\n\
                     div{s} xmm2, xmm1\n\
                     cvtt{s}2si rax, xmm2\n\
                     cvtsi2{s} xmm2, rax\n\
                     mul{s} xmm2, xmm1\n\
                     sub{s} xmm0, xmm2\n\
                     movq rax, xmm0\n",
                    s = suffix
                ));
            } else {
                text.push_str(&format!(
                    "movq xmm0, rax\nmovq xmm1, rbx\ndiv{s} xmm0, xmm1\nmovq rax, xmm0\n",
                    s = suffix
                ));
            }
            text.push_str("push rax");
            return text;
        }
    };

    if remainder {
        text.push_str(take);
    }
    text.push_str("push rax");
    text
}

/// EQ/NEQ/GT/LT/GTEQ/LTEQ: compare, set a byte from the condition, widen.
fn emit_compare(instr: &Instruction, dt: DataType) -> String {
    // orderings use the unsigned condition codes for unsigned ints and
    // floats (ucomiss/ucomisd set CF/ZF like an unsigned compare)
    let signed = dt.is_signed();
    let cc = match instr {
        Instruction::Eq { .. } => "e",
        Instruction::Neq { .. } => "ne",
        Instruction::Gt { .. } if signed => "g",
        Instruction::Gt { .. } => "a",
        Instruction::Lt { .. } if signed => "l",
        Instruction::Lt { .. } => "b",
        Instruction::GtEq { .. } if signed => "ge",
        Instruction::GtEq { .. } => "ae",
        _ if signed => "le",
        _ => "be",
    };

    let mut text = format!("; {} {}\npop rbx\npop rax\n", instr.opcode(), dt);

    match gp_aliases(dt) {
        Some((a, b)) => text.push_str(&format!("cmp {}, {}\n", a, b)),
        None => {
            let mnemonic = if dt == DataType::F32 {
                "ucomiss"
            } else {
                "ucomisd"
            };
            text.push_str(&format!(
                "movq xmm0, rax\nmovq xmm1, rbx\n{} xmm0, xmm1\n",
                mnemonic
            ));
        }
    }

    text.push_str(&format!("set{} al\nmovzx rax, al\npush rax", cc));
    text
}

fn emit_convert(from: DataType, to: DataType) -> Result<String, SlasmError> {
    let comment = format!("; CONVERT {} {}", from, to);

    if from == to {
        return Ok(comment);
    }

    let body = match (from.is_float(), to.is_float()) {
        (false, false) => match int_extend(from) {
            Some(extend) => format!("pop rax\n{}\npush rax", extend),
            // 64-bit sources already fill the word; narrowing is implicit
            None => return Ok(comment),
        },
        (false, true) => {
            if from == DataType::UI64 {
                return Err(LoweringError::UnsupportedConversion {
                    emitter: EMITTER,
                    from,
                    to,
                }
                .into());
            }
            let cvt = if to == DataType::F32 {
                "cvtsi2ss"
            } else {
                "cvtsi2sd"
            };
            let mut body = String::from("pop rax\n");
            if let Some(extend) = int_extend(from) {
                body.push_str(extend);
                body.push('\n');
            }
            body.push_str(&format!("{} xmm0, rax\nmovq rax, xmm0\npush rax", cvt));
            body
        }
        (true, false) => {
            let cvt = if from == DataType::F32 {
                "cvttss2si"
            } else {
                "cvttsd2si"
            };
            format!("pop rax\nmovq xmm0, rax\n{} rax, xmm0\npush rax", cvt)
        }
        (true, true) => {
            let cvt = if from == DataType::F32 {
                "cvtss2sd"
            } else {
                "cvtsd2ss"
            };
            format!(
                "pop rax\nmovq xmm0, rax\n{} xmm0, xmm0\nmovq rax, xmm0\npush rax",
                cvt
            )
        }
    };

    Ok(format!("{}\n{}", comment, body))
}

fn emit_call(target: &str, num_params: usize, returns_value: bool) -> String {
    let mut text = format!("; CALL {}\ncall {}", target, target);

    if num_params != 0 {
        text.push_str(&format!(
            "\nadd rsp, {} ; remove arguments from stack",
            num_params * WORD_SIZE
        ));
    }
    if returns_value {
        text.push_str("\npush rax ; push return value");
    }

    text
}

/// Lower one instruction to NASM text. Lines are unindented; the caller
/// aligns them within the block.
pub(crate) fn emit_instruction(
    instr: &Instruction,
    ctx: &FunctionContext<'_>,
) -> Result<String, SlasmError> {
    let text = match instr {
        Instruction::Noop => "; NOOP\nxchg rax, rax".to_string(),

        Instruction::LoadConst { value } => {
            let hex = value.as_hex(Endianness::Little);
            format!("; LOAD_CONST {}\nmov rax, {}\npush rax", hex, hex)
        }
        Instruction::LoadLocal { idx } => format!(
            "; LOAD_LOCAL {}\npush qword [rbp-{}]",
            idx,
            (idx + 1) * WORD_SIZE as u64
        ),
        Instruction::LoadParam { idx } => format!(
            "; LOAD_PARAM {}\npush qword [rbp+{}]",
            idx,
            (idx + 2) * WORD_SIZE as u64
        ),
        Instruction::LoadGlobal { name } => {
            format!("; LOAD_GLOBAL {}\npush qword [rel {}]", name, name)
        }
        Instruction::LoadMem { offset } => format!(
            "; LOAD_MEM {}\npop rax\npush qword {}",
            offset,
            mem_operand("rax", *offset)
        ),
        Instruction::LoadFuncAddr { name } => {
            format!("; LOAD_FUNC_ADDR {}\nlea rax, [rel {}]\npush rax", name, name)
        }

        Instruction::Pop => format!("; POP\nadd rsp, {}", WORD_SIZE),
        Instruction::StoreLocal { idx } => format!(
            "; STORE_LOCAL {}\npop qword [rbp-{}]",
            idx,
            (idx + 1) * WORD_SIZE as u64
        ),
        Instruction::StoreParam { idx } => format!(
            "; STORE_PARAM {}\npop qword [rbp+{}]",
            idx,
            (idx + 2) * WORD_SIZE as u64
        ),
        Instruction::StoreGlobal { name } => {
            format!("; STORE_GLOBAL {}\npop qword [rel {}]", name, name)
        }
        Instruction::StoreMem { offset } => format!(
            "; STORE_MEM {}\npop rax\npop qword {}",
            offset,
            mem_operand("rax", *offset)
        ),

        Instruction::Add { data_type } => emit_arith(instr, *data_type, "add", "add"),
        Instruction::Sub { data_type } => emit_arith(instr, *data_type, "sub", "sub"),
        Instruction::Mul { data_type } => emit_arith(instr, *data_type, "imul", "mul"),
        Instruction::Div { data_type } => emit_divide(instr, *data_type, false),
        Instruction::Mod { data_type } => emit_divide(instr, *data_type, true),

        Instruction::Inc { data_type } | Instruction::Dec { data_type } => {
            let (a, _) = gp_aliases(*data_type).ok_or_else(|| unsupported(instr.opcode(), *data_type))?;
            let mnemonic = if matches!(instr, Instruction::Inc { .. }) {
                "inc"
            } else {
                "dec"
            };
            format!(
                "; {} {}\npop rax\n{} {}\npush rax",
                instr.opcode(),
                data_type,
                mnemonic,
                a
            )
        }

        Instruction::Neg { data_type } => match data_type {
            dt if dt.is_signed() => {
                let (a, _) = gp_aliases(*dt).ok_or_else(|| unsupported("NEG", *dt))?;
                format!("; NEG {}\npop rax\nneg {}\npush rax", dt, a)
            }
            DataType::F32 => {
                "; NEG F32\npop rax\nmov rbx, 0x80000000\nxor rax, rbx\npush rax".to_string()
            }
            DataType::F64 => {
                "; NEG F64\npop rax\nmov rbx, 0x8000000000000000\nxor rax, rbx\npush rax"
                    .to_string()
            }
            dt => return Err(unsupported("NEG", *dt)),
        },

        Instruction::Eq { data_type }
        | Instruction::Neq { data_type }
        | Instruction::Gt { data_type }
        | Instruction::Lt { data_type }
        | Instruction::GtEq { data_type }
        | Instruction::LtEq { data_type } => emit_compare(instr, *data_type),

        Instruction::Or => "; OR\npop rbx\npop rax\nor rax, rbx\npush rax".to_string(),
        Instruction::And => "; AND\npop rbx\npop rax\nand rax, rbx\npush rax".to_string(),
        Instruction::Xor => "; XOR\npop rbx\npop rax\nxor rax, rbx\npush rax".to_string(),
        Instruction::Not => "; NOT\npop rax\nnot rax\npush rax".to_string(),
        Instruction::Shl { amount } => {
            format!("; SHL {}\npop rax\nshl rax, {}\npush rax", amount, amount)
        }
        Instruction::Shr { amount } => {
            format!("; SHR {}\npop rax\nshr rax, {}\npush rax", amount, amount)
        }

        Instruction::Convert { from, to } => emit_convert(*from, *to)?,

        Instruction::Jump { target } => format!("; JUMP {}\njmp .{}", target, target),
        Instruction::CondJump {
            true_target,
            false_target,
        } => format!(
            "; COND_JUMP {} {}\npop rax\ncmp rax, 0\njnz .{}\njmp .{}",
            true_target, false_target, true_target, false_target
        ),

        Instruction::Call { target } => {
            let def = ctx.global_ctx().get_function(target)?;
            emit_call(target, def.num_params(), def.returns_value)
        }
        Instruction::IndirectCall => "; INDIRECT_CALL\npop rax\ncall rax".to_string(),
        Instruction::NativeCall {
            target,
            num_params,
            returns_value,
        } => emit_call(target, *num_params, *returns_value),

        Instruction::Ret => {
            if ctx.returns_value() {
                "; RET\npop rax\nret".to_string()
            } else {
                "; RET\nret".to_string()
            }
        }
    };

    Ok(text)
}
