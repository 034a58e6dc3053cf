//! muljit internals.
//!
//! This is a deliberately small JIT: there is no source language, no
//! instruction selection, and no register allocation. A [Program] picks
//! one of a closed set of integer functions, the code generator writes
//! its fixed x86-64 encoding into a writable [jitmem::CodeBuffer], the
//! buffer swaps its write permission for execute permission, and the
//! result is called like any native function:
//!
//!  - a [Program] describes the function (constant, identity, negate,
//!    double, or multiply-by-immediate)
//!  - [emit] writes its byte-exact encoding into a caller-supplied buffer
//!  - [CompiledFunction] runs the whole cycle and hands back something
//!    callable
//!
//! The interesting property being demonstrated is the W^X cycle in
//! [jitmem], not the arithmetic.

extern crate jitmem;

pub mod errors;
pub mod program;

mod asm;
mod codegen;
mod jit;

pub use crate::codegen::emit;
pub use crate::errors::{CompileError, EmitError};
pub use crate::jit::CompiledFunction;
pub use crate::program::Program;
