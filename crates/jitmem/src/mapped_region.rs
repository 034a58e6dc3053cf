use std::ops::{Drop, Index};
use std::ptr;

use errno::{errno, Errno};
use libc::{c_void, size_t};

use crate::error::{MappingError, Result};
use crate::WritableRegion;

#[cfg(target_os = "macos")]
const MAP_FLAGS: libc::c_int = libc::MAP_PRIVATE | libc::MAP_ANON | libc::MAP_JIT;
#[cfg(not(target_os = "macos"))]
const MAP_FLAGS: libc::c_int = libc::MAP_PRIVATE | libc::MAP_ANON;

/// A page-aligned region of memory mapped by `mmap(2)`.
///
/// Freshly mapped, the region is inaccessible (`PROT_NONE`); convert it to
/// a [WritableRegion] before putting anything in it. `munmap(2)` is
/// automatically called when the value is dropped; use [MappedRegion::unmap]
/// to have an unmap failure reported instead of ignored.
#[derive(Debug)]
pub struct MappedRegion {
    addr: *mut c_void,
    len: size_t,
}

impl MappedRegion {
    /// Allocate a region of at least `size` bytes, rounded up to whole
    /// pages, with a one-page floor.
    pub fn allocate(size: usize) -> Result<Self> {
        let len = round_to_page(size)?;
        let memory;
        unsafe {
            memory = libc::mmap(ptr::null_mut(), len, libc::PROT_NONE, MAP_FLAGS, -1, 0);
        }

        if memory == libc::MAP_FAILED {
            return Err(MappingError::AllocationFailed(errno()));
        }

        Ok(MappedRegion { addr: memory, len })
    }

    /// Returns a pointer to the mapped memory.
    pub fn addr(&self) -> *const u8 {
        self.addr as *const u8
    }

    /// Returns a mutable pointer to this region.
    ///
    /// Note: to write to this memory, first you must convert into a WritableRegion.
    pub fn addr_mut(&self) -> *mut c_void {
        self.addr
    }

    /// Return the length of the region. Always a whole number of pages.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Consumes the region and returns a writable region.
    pub fn into_writable(self) -> Result<WritableRegion> {
        WritableRegion::from(self)
    }

    /// Unmaps the region, reporting failure instead of swallowing it.
    pub fn unmap(self) -> Result<()> {
        let (addr, len) = (self.addr, self.len);
        std::mem::forget(self);

        if unsafe { libc::munmap(addr, len) } < 0 {
            return Err(MappingError::DeallocationFailed(errno()));
        }
        Ok(())
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // Nothing sensible to do on failure here; callers that care use unmap().
        unsafe {
            libc::munmap(self.addr, self.len);
        }
    }
}

impl<I> Index<I> for MappedRegion
where
    I: std::slice::SliceIndex<[u8]>,
{
    type Output = I::Output;

    fn index(&self, index: I) -> &Self::Output {
        unsafe { &std::slice::from_raw_parts(self.addr as *const u8, self.len)[index] }
    }
}

/// The platform's page size, from `sysconf(3)`.
pub fn page_size() -> usize {
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

fn round_to_page(size: usize) -> Result<usize> {
    let page = page_size();
    let size = size.max(page);
    size.checked_add(page - 1)
        .map(|n| n & !(page - 1))
        // A request this close to usize::MAX can never be mapped anyway.
        .ok_or(MappingError::AllocationFailed(Errno(libc::ENOMEM)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_page_sized() {
        let page = page_size();
        let region = MappedRegion::allocate(1).unwrap();
        assert_eq!(region.len(), page);

        let region = MappedRegion::allocate(page + 1).unwrap();
        assert_eq!(region.len(), 2 * page);
    }

    #[test]
    fn enormous_allocation_is_refused() {
        let err = MappedRegion::allocate(usize::MAX / 2).unwrap_err();
        assert!(matches!(err, MappingError::AllocationFailed(_)));
    }

    #[test]
    fn unmap_reports_success() {
        let region = MappedRegion::allocate(1).unwrap();
        region.unmap().unwrap();
    }
}
