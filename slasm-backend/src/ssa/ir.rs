//! The SSA output vocabulary
//!
//! A small LLVM-flavored instruction set produced by the lowering pass and
//! consumed by a JIT. Every value is one machine word; signedness and float
//! behavior live in the operation, not the value, so the `Display` mnemonic
//! is chosen from the `(op, DataType)` pair (`sdiv`/`udiv`/`fdiv`,
//! `icmp slt`/`icmp ult`/`fcmp olt`, and so on).

use slasm_common::DataType;
use std::fmt;

/// Operation type annotation: width for integers, `float`/`double` for reals.
fn ssa_type(dt: DataType) -> &'static str {
    match dt {
        DataType::I8 | DataType::UI8 => "i8",
        DataType::I16 | DataType::UI16 => "i16",
        DataType::I32 | DataType::UI32 => "i32",
        DataType::I64 | DataType::UI64 => "i64",
        DataType::F32 => "float",
        DataType::F64 => "double",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SsaValue {
    /// Result of an earlier instruction.
    Temp(u32),
    /// Incoming parameter value.
    Arg(usize),
    /// Word-sized constant (bit pattern, signedness per use).
    Const(i64),
    /// Address of a program global.
    Global(String),
    /// Address of a program function.
    Function(String),
}

impl fmt::Display for SsaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SsaValue::Temp(id) => write!(f, "%t{}", id),
            SsaValue::Arg(idx) => write!(f, "%arg{}", idx),
            SsaValue::Const(value) => write!(f, "{}", value),
            SsaValue::Global(name) | SsaValue::Function(name) => write!(f, "@{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsaBinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl SsaBinOp {
    /// The rendered mnemonic, selected by the operand type.
    pub fn mnemonic(self, dt: DataType) -> &'static str {
        let float = dt.is_float();
        let signed = dt.is_signed();
        match self {
            SsaBinOp::Add if float => "fadd",
            SsaBinOp::Add => "add",
            SsaBinOp::Sub if float => "fsub",
            SsaBinOp::Sub => "sub",
            SsaBinOp::Mul if float => "fmul",
            SsaBinOp::Mul => "mul",
            SsaBinOp::Div if float => "fdiv",
            SsaBinOp::Div if signed => "sdiv",
            SsaBinOp::Div => "udiv",
            // float remainder is expanded by the lowering pass, never
            // constructed as a single operation
            SsaBinOp::Mod if signed => "srem",
            SsaBinOp::Mod => "urem",
            SsaBinOp::Eq if float => "fcmp oeq",
            SsaBinOp::Eq => "icmp eq",
            SsaBinOp::Neq if float => "fcmp one",
            SsaBinOp::Neq => "icmp ne",
            SsaBinOp::Gt if float => "fcmp ogt",
            SsaBinOp::Gt if signed => "icmp sgt",
            SsaBinOp::Gt => "icmp ugt",
            SsaBinOp::Lt if float => "fcmp olt",
            SsaBinOp::Lt if signed => "icmp slt",
            SsaBinOp::Lt => "icmp ult",
            SsaBinOp::GtEq if float => "fcmp oge",
            SsaBinOp::GtEq if signed => "icmp sge",
            SsaBinOp::GtEq => "icmp uge",
            SsaBinOp::LtEq if float => "fcmp ole",
            SsaBinOp::LtEq if signed => "icmp sle",
            SsaBinOp::LtEq => "icmp ule",
            SsaBinOp::And => "and",
            SsaBinOp::Or => "or",
            SsaBinOp::Xor => "xor",
            SsaBinOp::Shl => "shl",
            SsaBinOp::Shr => "lshr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsaUnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SsaInstr {
    /// Reserve one word of mutable storage; the result is its address.
    Alloc { dest: SsaValue },
    Load {
        dest: SsaValue,
        addr: SsaValue,
    },
    Store {
        value: SsaValue,
        addr: SsaValue,
    },
    Binary {
        dest: SsaValue,
        op: SsaBinOp,
        data_type: DataType,
        lhs: SsaValue,
        rhs: SsaValue,
    },
    Unary {
        dest: SsaValue,
        op: SsaUnOp,
        data_type: DataType,
        value: SsaValue,
    },
    Convert {
        dest: SsaValue,
        from: DataType,
        to: DataType,
        value: SsaValue,
    },
    Call {
        dest: Option<SsaValue>,
        target: String,
        args: Vec<SsaValue>,
    },
    Branch { target: String },
    BranchCond {
        cond: SsaValue,
        true_target: String,
        false_target: String,
    },
    Return { value: Option<SsaValue> },
}

/// Cast mnemonic for a non-identity conversion.
fn convert_mnemonic(from: DataType, to: DataType) -> &'static str {
    match (from.is_float(), to.is_float()) {
        (false, false) => {
            if to.size_in_bytes() < from.size_in_bytes() {
                "trunc"
            } else if from.is_signed() {
                "sext"
            } else {
                "zext"
            }
        }
        (false, true) => {
            if from.is_signed() {
                "sitofp"
            } else {
                "uitofp"
            }
        }
        (true, false) => {
            if to.is_signed() {
                "fptosi"
            } else {
                "fptoui"
            }
        }
        (true, true) => {
            if to == DataType::F64 {
                "fpext"
            } else {
                "fptrunc"
            }
        }
    }
}

impl fmt::Display for SsaInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SsaInstr::Alloc { dest } => write!(f, "{} = alloc i64", dest),
            SsaInstr::Load { dest, addr } => write!(f, "{} = load i64, ptr {}", dest, addr),
            SsaInstr::Store { value, addr } => write!(f, "store i64 {}, ptr {}", value, addr),
            SsaInstr::Binary {
                dest,
                op,
                data_type,
                lhs,
                rhs,
            } => write!(
                f,
                "{} = {} {} {}, {}",
                dest,
                op.mnemonic(*data_type),
                ssa_type(*data_type),
                lhs,
                rhs
            ),
            SsaInstr::Unary {
                dest,
                op,
                data_type,
                value,
            } => {
                let mnemonic = match op {
                    SsaUnOp::Neg if data_type.is_float() => "fneg",
                    SsaUnOp::Neg => "neg",
                    SsaUnOp::Not => "not",
                };
                write!(f, "{} = {} {} {}", dest, mnemonic, ssa_type(*data_type), value)
            }
            SsaInstr::Convert {
                dest,
                from,
                to,
                value,
            } => write!(
                f,
                "{} = {} {} {} to {}",
                dest,
                convert_mnemonic(*from, *to),
                ssa_type(*from),
                value,
                ssa_type(*to)
            ),
            SsaInstr::Call { dest, target, args } => {
                let args = args
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                match dest {
                    Some(dest) => write!(f, "{} = call i64 @{}({})", dest, target, args),
                    None => write!(f, "call void @{}({})", target, args),
                }
            }
            SsaInstr::Branch { target } => write!(f, "br label %{}", target),
            SsaInstr::BranchCond {
                cond,
                true_target,
                false_target,
            } => write!(
                f,
                "br i1 {}, label %{}, label %{}",
                cond, true_target, false_target
            ),
            SsaInstr::Return { value: Some(value) } => write!(f, "ret i64 {}", value),
            SsaInstr::Return { value: None } => write!(f, "ret void"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SsaBlock {
    pub label: String,
    pub instrs: Vec<SsaInstr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SsaFunction {
    pub name: String,
    pub num_params: usize,
    pub returns_value: bool,
    pub blocks: Vec<SsaBlock>,
}

impl fmt::Display for SsaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = if self.returns_value { "i64" } else { "void" };
        let params = (0..self.num_params)
            .map(|i| format!("i64 %arg{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        writeln!(f, "define {} @{}({}) {{", result, self.name, params)?;
        for block in &self.blocks {
            writeln!(f, "{}:", block.label)?;
            for instr in &block.instrs {
                writeln!(f, "  {}", instr)?;
            }
        }
        write!(f, "}}")
    }
}

/// Declaration for an externally provided function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsaNative {
    pub name: String,
    pub num_params: usize,
    pub returns_value: bool,
}

impl fmt::Display for SsaNative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = if self.returns_value { "i64" } else { "void" };
        let params = (0..self.num_params)
            .map(|_| "i64")
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "declare {} @{}({})", result, self.name, params)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SsaModule {
    pub target: String,
    pub natives: Vec<SsaNative>,
    pub functions: Vec<SsaFunction>,
}

impl fmt::Display for SsaModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; SLASM_VERSION {}", slasm_common::VERSION)?;
        writeln!(f, "; TARGET {}", self.target)?;
        for native in &self.natives {
            writeln!(f)?;
            write!(f, "{}", native)?;
        }
        for function in &self.functions {
            writeln!(f)?;
            writeln!(f)?;
            write!(f, "{}", function)?;
        }
        writeln!(f)
    }
}
