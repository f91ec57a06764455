//! SSA emitter for JIT consumption
//!
//! Lowers a validated program into a word-typed SSA module instead of
//! assembly text. The operand stack disappears at lowering time: the pass
//! tracks it symbolically and emits straight-line value definitions, so the
//! produced module has no stack discipline left to honor.

mod ir;
mod lower;

pub use ir::{
    SsaBinOp, SsaBlock, SsaFunction, SsaInstr, SsaModule, SsaNative, SsaUnOp, SsaValue,
};
pub use lower::emit_module;
