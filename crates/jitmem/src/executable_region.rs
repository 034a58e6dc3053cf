use std::ops::Index;
use std::slice::SliceIndex;

use errno::errno;

use crate::error::{MappingError, Result};
use crate::MappedRegion;

/// An executable region of memory. Get at the code through a
/// [crate::CodeBuffer] entry point, or via [ExecutableRegion::addr].
///
/// The region is read/execute; writing to it is over for good.
pub struct ExecutableRegion {
    region: MappedRegion,
}

impl ExecutableRegion {
    /// Consumes the [MappedRegion] and marks its memory as read-only and executable.
    pub fn from(region: MappedRegion) -> Result<Self> {
        use libc::{PROT_EXEC, PROT_READ};

        unsafe {
            if libc::mprotect(region.addr_mut(), region.len(), PROT_READ | PROT_EXEC) < 0 {
                return Err(MappingError::ProtectionChangeFailed(errno()));
            }
        }

        Ok(Self { region })
    }

    /// Returns the address of the mapped memory, which is the entry point
    /// of whatever was written at its start.
    pub fn addr(&self) -> *const u8 {
        self.region.addr()
    }

    pub fn len(&self) -> usize {
        self.region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    pub(crate) fn into_mapped(self) -> MappedRegion {
        self.region
    }
}

impl<I> Index<I> for ExecutableRegion
where
    I: SliceIndex<[u8]>,
{
    type Output = I::Output;

    fn index(&self, index: I) -> &Self::Output {
        &self.region[index]
    }
}
