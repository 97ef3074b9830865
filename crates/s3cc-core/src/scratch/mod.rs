//! Shared scratch-space budget.
//!
//! Large ETag computations stage their chunks in fast scratch storage
//! (`/dev/shm` by default). Every computation reserves the file's full size
//! from one shared `ScratchAllocator` before staging, so concurrent
//! comparisons never overfill the scratch area. A failed reservation is a
//! capacity signal: callers back off and retry.

mod allocator;
mod error;
mod guard;

pub use allocator::ScratchAllocator;
pub use error::CapacityExceeded;
pub use guard::ScratchGuard;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Preferred scratch directory (tmpfs on Linux).
pub const DEFAULT_SCRATCH_DIR: &str = "/dev/shm";

/// `/dev/shm` when it exists, otherwise the system temp directory.
pub fn default_scratch_dir() -> PathBuf {
    let shm = Path::new(DEFAULT_SCRATCH_DIR);
    if shm.is_dir() {
        shm.to_path_buf()
    } else {
        std::env::temp_dir()
    }
}

/// Bytes currently available to unprivileged users on the filesystem holding `dir`.
#[cfg(unix)]
#[allow(clippy::unnecessary_cast)]
pub fn free_space(dir: &Path) -> Result<u64> {
    use anyhow::Context;
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(dir.as_os_str().as_bytes())
        .with_context(|| format!("invalid scratch path: {}", dir.display()))?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let r = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if r != 0 {
        return Err(std::io::Error::last_os_error())
            .with_context(|| format!("statvfs {}", dir.display()));
    }
    Ok((stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64))
}

#[cfg(not(unix))]
pub fn free_space(dir: &Path) -> Result<u64> {
    anyhow::bail!(
        "cannot query free space of {} on this platform; set scratch_capacity explicitly",
        dir.display()
    )
}
