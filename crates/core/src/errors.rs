//! All errors that can be _generated_ while compiling a program.

use jitmem::MappingError;

/// The only checked failure of emission: the destination buffer cannot
/// hold the selected program. Wrong opcode bytes are not a reportable
/// error; they surface as wrong answers at invocation time.
#[derive(Debug, Clone)]
pub enum EmitError {
    BufferTooSmall { needed: usize, available: usize },
}

/// Any error that occurs while compiling a program and installing it in
/// executable memory.
#[derive(Debug, Clone)]
pub enum CompileError {
    Emit(EmitError),
    Mapping(MappingError),
}

impl From<EmitError> for CompileError {
    fn from(err: EmitError) -> CompileError {
        CompileError::Emit(err)
    }
}

impl From<MappingError> for CompileError {
    fn from(err: MappingError) -> CompileError {
        CompileError::Mapping(err)
    }
}
