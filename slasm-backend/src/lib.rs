//! SLASM Compiler Toolchain - Code Generation Backends
//!
//! Two independent emitters over the same validated program:
//!
//! - `nasm`: x86-64 NASM assembly text, mapping the operand stack onto the
//!   machine stack
//! - `ssa`: a word-typed SSA module for JIT consumption
//!
//! Both share only the ABI descriptor layer in `abi`: callable signatures
//! are forward-declared in a [`abi::GlobalContext`] and every call site is
//! checked against it before emission begins.

pub mod abi;
pub mod nasm;
pub mod ssa;

pub use abi::{FuncDef, GlobalContext};
