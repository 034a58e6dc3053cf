use jitmem::{CodeBuffer, MappingError};

use crate::codegen;
use crate::errors::CompileError;
use crate::program::Program;

type ConstantFn = extern "C" fn(i32) -> i8;
type UnaryFn = extern "C" fn(i32) -> i32;

/// A [Program] installed in executable memory, ready to be called.
///
/// Construction runs the entire permission cycle up to executable, so a
/// value of this type always holds runnable code; the mapping is
/// reclaimed on drop, or through [CompiledFunction::release] when the
/// caller wants unmap failures reported.
pub struct CompiledFunction {
    code: CodeBuffer,
    program: Program,
    code_len: usize,
}

impl CompiledFunction {
    /// Allocate a buffer, emit `program` into it, and make it executable.
    pub fn compile(program: Program) -> Result<CompiledFunction, CompileError> {
        let mut code = CodeBuffer::allocate(program.encoded_len())?;
        let code_len = codegen::emit(program, code.code_mut()?)?;
        code.finalize()?;

        Ok(CompiledFunction {
            code,
            program,
            code_len,
        })
    }

    pub fn program(&self) -> Program {
        self.program
    }

    /// The emitted instruction bytes (readable even though executable).
    pub fn code(&self) -> &[u8] {
        let code = self
            .code
            .code()
            .expect("buffer is executable once compiled");
        &code[..self.code_len]
    }

    /// Invoke the generated code with one integer argument.
    ///
    /// The byte-sized constant return is widened to `i32`, so every
    /// program can be compared against [Program::evaluate] directly.
    pub fn call(&self, argument: i32) -> i32 {
        match self.program {
            Program::ReturnConstant(_) => {
                let entry = unsafe { self.code.entry_point::<ConstantFn>() }
                    .expect("buffer is executable once compiled");
                entry.call(argument) as i32
            }
            _ => {
                let entry = unsafe { self.code.entry_point::<UnaryFn>() }
                    .expect("buffer is executable once compiled");
                entry.call(argument)
            }
        }
    }

    /// Unmap the code, reporting failure instead of swallowing it.
    pub fn release(self) -> Result<(), MappingError> {
        self.code.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(program: Program) -> CompiledFunction {
        CompiledFunction::compile(program).unwrap()
    }

    #[test]
    fn constant_ignores_its_argument() {
        let function = compile(Program::ReturnConstant(123));
        for x in [-1000, -1, 0, 1, 42, i32::MAX] {
            assert_eq!(function.call(x), 123);
        }
    }

    #[test]
    fn constant_return_is_sign_extended() {
        let function = compile(Program::ReturnConstant(-5));
        assert_eq!(function.call(0), -5);
    }

    #[test]
    fn return_argument_is_the_identity() {
        let function = compile(Program::ReturnArgument);
        for x in [i32::MIN, -999, -1, 0, 1, 999, i32::MAX] {
            assert_eq!(function.call(x), x);
        }
    }

    #[test]
    fn negate_wraps_at_the_minimum() {
        let function = compile(Program::Negate);
        assert_eq!(function.call(7), -7);
        assert_eq!(function.call(-7), 7);
        assert_eq!(function.call(0), 0);
        assert_eq!(function.call(i32::MIN), i32::MIN);
    }

    #[test]
    fn double_uses_native_wraparound() {
        let function = compile(Program::Double);
        for x in [0, 1, -1, 12, 1000, i32::MAX, i32::MIN, i32::MAX / 2 + 1] {
            assert_eq!(function.call(x), x.wrapping_add(x), "x = {}", x);
        }
    }

    #[test]
    fn multiply_matches_the_reference_for_the_grid() {
        for multiplier in [-5, 0, 1, 2, 113] {
            let program = Program::MultiplyBy(multiplier);
            let function = compile(program);
            for x in 0..9 {
                assert_eq!(function.call(x), x * multiplier);
                assert_eq!(function.call(x), program.evaluate(x));
            }
        }
    }

    #[test]
    fn multiply_wraps_modulo_the_integer_width() {
        let function = compile(Program::MultiplyBy(i32::MAX));
        assert_eq!(function.call(2), 2_i32.wrapping_mul(i32::MAX));
    }

    #[test]
    fn every_program_agrees_with_its_reference() {
        let programs = [
            Program::ReturnConstant(77),
            Program::ReturnArgument,
            Program::Negate,
            Program::Double,
            Program::MultiplyBy(-31),
        ];
        for program in programs {
            let function = compile(program);
            for x in -4..5 {
                assert_eq!(function.call(x), program.evaluate(x), "{:?}", program);
            }
        }
    }

    #[test]
    fn code_reports_the_emitted_bytes_only() {
        let function = compile(Program::ReturnConstant(9));
        assert_eq!(function.code(), &[0xb0, 0x09, 0xc3]);
    }

    #[test]
    fn release_reports_success() {
        let function = compile(Program::Double);
        function.release().unwrap();
    }
}
