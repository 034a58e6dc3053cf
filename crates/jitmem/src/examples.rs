//! (only used in test cases)
//! Canned machine code for exercising the memory lifecycle without an
//! assembler.

use crate::error::Result;
use crate::CodeBuffer;

/// `fn(x) -> x * x` over 64-bit integers, System V AMD64 convention.
pub const SQUARE_FUNCTION: [u8; 8] = [
    // mov rax, rdi
    0x48, 0x89, 0xf8, //
    // imul rax, rdi
    0x48, 0x0f, 0xaf, 0xc7, //
    // ret
    0xc3, //
];

/// Returns a finalized [CodeBuffer] holding [SQUARE_FUNCTION].
pub fn square_program() -> Result<CodeBuffer> {
    let mut buffer = CodeBuffer::allocate(SQUARE_FUNCTION.len())?;
    buffer.code_mut()?[..SQUARE_FUNCTION.len()].copy_from_slice(&SQUARE_FUNCTION);
    buffer.finalize()?;

    Ok(buffer)
}
