use errno::Errno;

use crate::code_buffer::BufferState;

pub type Result<T> = std::result::Result<T, MappingError>;

/// Any error thrown while mapping memory or moving it through its
/// permission cycle.
#[derive(Debug, Clone)]
pub enum MappingError {
    /// The platform could not supply the requested region.
    AllocationFailed(Errno),
    /// The platform refused to change the region's protection.
    ProtectionChangeFailed(Errno),
    /// The platform reported a failure while unmapping the region.
    DeallocationFailed(Errno),
    /// A lifecycle operation was applied to a [crate::CodeBuffer] in the
    /// wrong state. This is caller misuse, not a platform failure.
    InvalidStateTransition {
        expected: BufferState,
        found: BufferState,
    },
}
