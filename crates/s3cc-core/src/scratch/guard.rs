//! RAII guard that releases reserved scratch bytes when dropped.

use super::allocator::ScratchAllocator;

/// Releases its reservation when dropped, including during unwinding.
#[derive(Debug)]
#[must_use = "the reservation is released as soon as the guard is dropped"]
pub struct ScratchGuard<'a> {
    pub(super) allocator: &'a ScratchAllocator,
    pub(super) bytes: u64,
}

impl ScratchGuard<'_> {
    /// Number of bytes held by this guard.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        self.allocator.release(self.bytes);
    }
}
