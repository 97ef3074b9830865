//! Counting allocator over a fixed-capacity scratch area.

use anyhow::Result;
use bytesize::ByteSize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::error::CapacityExceeded;
use super::guard::ScratchGuard;

/// Thread-safe byte budget for the scratch area.
///
/// Holds one counter of reserved bytes under a mutex; `0 <= reserved <= capacity`
/// holds after every call. Nothing is queued: a reservation that does not fit
/// fails immediately with `CapacityExceeded`.
#[derive(Debug)]
pub struct ScratchAllocator {
    capacity: u64,
    reserved: Mutex<u64>,
}

impl ScratchAllocator {
    /// Create an allocator with a fixed capacity in bytes.
    pub fn new(capacity: u64) -> Self {
        tracing::debug!(capacity = %ByteSize(capacity), "scratch allocator initialized");
        Self {
            capacity,
            reserved: Mutex::new(0),
        }
    }

    /// Create an allocator sized to the free space currently available in `dir`.
    ///
    /// Free space is queried once, here; it is never re-read.
    pub fn for_dir(dir: &Path) -> Result<Self> {
        let capacity = super::free_space(dir)?;
        Ok(Self::new(capacity))
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes currently reserved.
    pub fn reserved(&self) -> u64 {
        *self.lock()
    }

    /// Bytes still free (`capacity - reserved`), read under the lock.
    pub fn available(&self) -> u64 {
        self.capacity - *self.lock()
    }

    /// Reserve `bytes`. On failure nothing is reserved.
    ///
    /// Every successful call must be paired with exactly one `release(bytes)`;
    /// prefer `try_reserve`, which pairs them automatically.
    pub fn acquire(&self, bytes: u64) -> Result<(), CapacityExceeded> {
        let free = {
            let mut reserved = self.lock();
            let available = self.capacity - *reserved;
            if bytes > available {
                return Err(CapacityExceeded {
                    requested: bytes,
                    available,
                });
            }
            *reserved += bytes;
            self.capacity - *reserved
        };
        tracing::debug!(
            "allocated {} from scratch area (free: {})",
            ByteSize(bytes),
            ByteSize(free)
        );
        Ok(())
    }

    /// Return `bytes` to the pool. The counter never goes below zero, so an
    /// over-release only resets it.
    pub fn release(&self, bytes: u64) {
        let free = {
            let mut reserved = self.lock();
            *reserved = reserved.saturating_sub(bytes);
            self.capacity - *reserved
        };
        tracing::debug!(
            "freed {} from scratch area (free: {})",
            ByteSize(bytes),
            ByteSize(free)
        );
    }

    /// Reserve `bytes` and get a guard that releases them on drop.
    pub fn try_reserve(&self, bytes: u64) -> Result<ScratchGuard<'_>, CapacityExceeded> {
        self.acquire(bytes)?;
        Ok(ScratchGuard {
            allocator: self,
            bytes,
        })
    }

    // The counter is updated in one statement, so a poisoned lock still holds a valid value.
    fn lock(&self) -> MutexGuard<'_, u64> {
        self.reserved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
