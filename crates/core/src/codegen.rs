//! Generates machine code for a given program.
//!
//! Every [Program] variant maps to one fixed instruction sequence for the
//! System V AMD64 calling convention: the argument arrives in `edi`
//! (`rdi` for the 64-bit move), the result leaves in `eax` (`al` for the
//! byte-sized constant), and the last byte is always `ret`. Emission is a
//! straight data copy; the only thing checked here is that the
//! destination can hold the program.

use crate::asm::x86_64::{Reg, X86Assembly};
use crate::errors::EmitError;
use crate::program::Program;

/// Translates one [Program] into its instruction sequence.
pub struct CodeGenerator {
    asm: X86Assembly,
}

impl CodeGenerator {
    pub fn new() -> Self {
        CodeGenerator {
            asm: X86Assembly::new(),
        }
    }

    pub fn compile(&mut self, program: Program) -> &[u8] {
        match program {
            Program::ReturnConstant(value) => {
                // mov al, value
                // ret
                self.asm.mov_imm8(Reg::Rax, value);
                self.asm.ret();
            }
            Program::ReturnArgument => {
                // mov rax, rdi
                // ret
                self.asm.mov(Reg::Rax, Reg::Rdi);
                self.asm.ret();
            }
            Program::Negate => {
                self.load_argument_into_eax();
                // neg eax
                self.asm.neg32(Reg::Rax);
                self.leave();
            }
            Program::Double => {
                self.load_argument_into_eax();
                // add eax, eax
                self.asm.add32(Reg::Rax, Reg::Rax);
                self.leave();
            }
            Program::MultiplyBy(multiplier) => {
                self.load_argument_into_eax();
                // mov edx, multiplier
                // imul eax, edx
                self.asm.mov_imm32(Reg::Rdx, multiplier);
                self.asm.imul32(Reg::Rax, Reg::Rdx);
                self.leave();
            }
        }

        self.asm.machine_code()
    }

    // The unary transforms all share one frame-based preamble: set up a
    // frame, park the argument in it, and read it back into eax.
    //
    //  55           push   rbp
    //  48 89 e5     mov    rbp, rsp
    //  89 7d fc     mov    DWORD PTR [rbp-0x4], edi
    //  8b 45 fc     mov    eax, DWORD PTR [rbp-0x4]
    fn load_argument_into_eax(&mut self) {
        self.asm.push(Reg::Rbp);
        self.asm.mov(Reg::Rbp, Reg::Rsp);
        self.asm.store_local(-4, Reg::Rdi);
        self.asm.load_local(Reg::Rax, -4);
    }

    //  5d           pop    rbp
    //  c3           ret
    fn leave(&mut self) {
        self.asm.pop(Reg::Rbp);
        self.asm.ret();
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        CodeGenerator::new()
    }
}

/// Writes the machine code for `program` into the front of `buffer` and
/// returns how many bytes were written.
///
/// Fails with [EmitError::BufferTooSmall], before writing anything, if the
/// buffer cannot hold the whole program.
pub fn emit(program: Program, buffer: &mut [u8]) -> Result<usize, EmitError> {
    let needed = program.encoded_len();
    if buffer.len() < needed {
        return Err(EmitError::BufferTooSmall {
            needed,
            available: buffer.len(),
        });
    }

    let mut gen = CodeGenerator::new();
    let code = gen.compile(program);
    debug_assert_eq!(code.len(), needed, "encoded_len out of sync with codegen");

    buffer[..needed].copy_from_slice(code);
    Ok(needed)
}
