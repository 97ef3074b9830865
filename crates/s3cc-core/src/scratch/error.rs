//! Capacity signal returned by the scratch allocator.

use bytesize::ByteSize;
use thiserror::Error;

/// Not enough free scratch space for the requested reservation.
///
/// Transient: the caller is expected to wait and retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "failed to allocate {} from scratch area (free: {})",
    ByteSize(*.requested),
    ByteSize(*.available)
)]
pub struct CapacityExceeded {
    /// Bytes the caller asked for.
    pub requested: u64,
    /// Bytes free at the time of the request.
    pub available: u64,
}
