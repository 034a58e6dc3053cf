use std::fmt;
use std::mem;

use crate::entry_point::{Callable, EntryPoint};
use crate::error::{MappingError, Result};
use crate::executable_region::ExecutableRegion;
use crate::writable_region::WritableRegion;

/// Where a [CodeBuffer] is in its permission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Writable,
    Executable,
    Released,
}

impl fmt::Display for BufferState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            BufferState::Writable => "writable",
            BufferState::Executable => "executable",
            BufferState::Released => "released",
        };
        write!(f, "{}", name)
    }
}

/// A region of memory for generated code, tracked through its whole
/// permission cycle: writable while code is emitted into it, executable
/// exactly once [CodeBuffer::finalize] is called, and gone after
/// [CodeBuffer::release].
///
/// Each operation checks the buffer's state first, so using the buffer out
/// of order is an [MappingError::InvalidStateTransition] instead of a wild
/// write or jump.
pub struct CodeBuffer {
    state: State,
}

enum State {
    Writable(WritableRegion),
    Executable(ExecutableRegion),
    Released,
}

impl CodeBuffer {
    /// Map a writable buffer of at least `minimum_length` bytes.
    ///
    /// The actual length is rounded up to whole pages, with a one-page
    /// floor.
    pub fn allocate(minimum_length: usize) -> Result<CodeBuffer> {
        let region = WritableRegion::allocate(minimum_length)?;
        Ok(CodeBuffer {
            state: State::Writable(region),
        })
    }

    pub fn state(&self) -> BufferState {
        match self.state {
            State::Writable(_) => BufferState::Writable,
            State::Executable(_) => BufferState::Executable,
            State::Released => BufferState::Released,
        }
    }

    /// Length of the underlying mapping, zero once released.
    pub fn len(&self) -> usize {
        match &self.state {
            State::Writable(region) => region.len(),
            State::Executable(region) => region.len(),
            State::Released => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the buffer's bytes for writing. Only legal while writable.
    pub fn code_mut(&mut self) -> Result<&mut [u8]> {
        match &mut self.state {
            State::Writable(region) => Ok(&mut region[..]),
            other => Err(wrong_state(BufferState::Writable, other)),
        }
    }

    /// Borrow the buffer's bytes for reading, in either live state.
    pub fn code(&self) -> Result<&[u8]> {
        match &self.state {
            State::Writable(region) => Ok(&region[..]),
            State::Executable(region) => Ok(&region[..]),
            other => Err(wrong_state(BufferState::Executable, other)),
        }
    }

    /// Swap write permission for execute permission.
    ///
    /// This is the only permission transition a buffer ever makes, and it
    /// can be made exactly once; finalizing an already-executable or
    /// released buffer is an [MappingError::InvalidStateTransition]. If
    /// the platform refuses the protection change, the mapping is
    /// reclaimed and the buffer is left released; there is nothing useful
    /// to retry.
    pub fn finalize(&mut self) -> Result<()> {
        match mem::replace(&mut self.state, State::Released) {
            State::Writable(region) => {
                // On error the region has already been unmapped by drop.
                let executable = region.into_executable()?;
                self.state = State::Executable(executable);
                Ok(())
            }
            State::Executable(region) => {
                self.state = State::Executable(region);
                Err(MappingError::InvalidStateTransition {
                    expected: BufferState::Writable,
                    found: BufferState::Executable,
                })
            }
            State::Released => Err(MappingError::InvalidStateTransition {
                expected: BufferState::Writable,
                found: BufferState::Released,
            }),
        }
    }

    /// Get a typed entry point at the start of the buffer.
    ///
    /// The buffer must be executable. The returned entry point borrows the
    /// buffer, so the code cannot be released out from under it.
    ///
    /// # Safety
    ///
    /// The bytes written into this buffer must form a complete function
    /// whose calling convention matches `F`. Nothing here can check that;
    /// it is a contract between whoever emitted the code and whoever
    /// picked `F`.
    pub unsafe fn entry_point<F: Callable>(&self) -> Result<EntryPoint<'_, F>> {
        match &self.state {
            State::Executable(region) => Ok(EntryPoint::new(F::from_code_address(region.addr()))),
            other => Err(wrong_state(BufferState::Executable, other)),
        }
    }

    /// Unmap the buffer, reporting an unmap failure instead of swallowing
    /// it. Dropping a buffer unmaps it too; this exists for callers that
    /// want the error.
    pub fn release(mut self) -> Result<()> {
        match mem::replace(&mut self.state, State::Released) {
            State::Writable(region) => region.into_mapped().unmap(),
            State::Executable(region) => region.into_mapped().unmap(),
            State::Released => Ok(()),
        }
    }
}

fn wrong_state(expected: BufferState, found: &State) -> MappingError {
    MappingError::InvalidStateTransition {
        expected,
        found: match found {
            State::Writable(_) => BufferState::Writable,
            State::Executable(_) => BufferState::Executable,
            State::Released => BufferState::Released,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::examples;
    use crate::page_size;

    type SquareFn = extern "C" fn(i64) -> i64;

    #[test]
    fn allocation_starts_writable_and_page_sized() {
        let buffer = CodeBuffer::allocate(1).unwrap();
        assert_eq!(buffer.state(), BufferState::Writable);
        assert_eq!(buffer.len(), page_size());
    }

    #[test]
    fn emitted_code_runs_after_finalize() {
        let buffer = examples::square_program().unwrap();
        assert_eq!(buffer.state(), BufferState::Executable);

        let square = unsafe { buffer.entry_point::<SquareFn>() }.unwrap();
        assert_eq!(square.call(5), 25);
        assert_eq!(square.call(-4), 16);
        assert_eq!(square.call(0), 0);
    }

    #[test]
    fn finalize_twice_is_an_invalid_transition() {
        let mut buffer = examples::square_program().unwrap();

        let err = buffer.finalize().unwrap_err();
        assert!(matches!(
            err,
            MappingError::InvalidStateTransition {
                expected: BufferState::Writable,
                found: BufferState::Executable,
            }
        ));
    }

    #[test]
    fn writing_after_finalize_is_an_invalid_transition() {
        let mut buffer = examples::square_program().unwrap();

        let err = buffer.code_mut().unwrap_err();
        assert!(matches!(
            err,
            MappingError::InvalidStateTransition {
                expected: BufferState::Writable,
                found: BufferState::Executable,
            }
        ));
    }

    #[test]
    fn entry_point_requires_an_executable_buffer() {
        let buffer = CodeBuffer::allocate(64).unwrap();

        let err = unsafe { buffer.entry_point::<SquareFn>() }.unwrap_err();
        assert!(matches!(
            err,
            MappingError::InvalidStateTransition {
                expected: BufferState::Executable,
                found: BufferState::Writable,
            }
        ));
    }

    #[test]
    fn code_stays_readable_after_finalize() {
        let buffer = examples::square_program().unwrap();
        let code = buffer.code().unwrap();
        assert_eq!(&code[..examples::SQUARE_FUNCTION.len()], &examples::SQUARE_FUNCTION);
    }

    #[test]
    fn release_succeeds_from_either_state() {
        let buffer = CodeBuffer::allocate(64).unwrap();
        buffer.release().unwrap();

        let buffer = examples::square_program().unwrap();
        buffer.release().unwrap();
    }
}
