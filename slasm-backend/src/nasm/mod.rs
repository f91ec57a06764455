//! x86-64 NASM text emitter
//!
//! Maps the operand stack directly onto the host machine stack. Parameters
//! live above the return address at `[rbp+(idx+2)*8]`, locals below the frame
//! base at `[rbp-(idx+1)*8]`, and the caller removes arguments after a call.
//! There is no explicit prologue/epilogue pair; the frame discipline is
//! implicit in the push/pop lowering of loads and stores.

mod function;
mod instr;
mod module;

pub use module::emit_program;
