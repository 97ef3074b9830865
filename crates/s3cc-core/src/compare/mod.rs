//! Per-file comparison of a local file against its remote object.

mod failure;

pub use failure::{ComparisonFailure, FailureKind};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::etag::LocalChecksum;
use crate::remote::{object_key, MetadataSource};

/// One file to verify. Built once by the orchestrator, consumed once by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// Path relative to the base directory, `/` separated.
    pub rel_path: String,
    pub local_path: PathBuf,
    pub remote_key: String,
}

impl FileTask {
    pub fn new(base_dir: &Path, rel: &Path, prefix: &str) -> Self {
        let rel_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        Self {
            local_path: base_dir.join(rel),
            remote_key: object_key(prefix, &rel_path),
            rel_path,
        }
    }
}

/// Compares local files with remote metadata.
///
/// Holds no per-file state; one instance is shared by all workers.
pub struct Comparator {
    source: Arc<dyn MetadataSource>,
    checksum: Arc<dyn LocalChecksum>,
}

impl Comparator {
    pub fn new(source: Arc<dyn MetadataSource>, checksum: Arc<dyn LocalChecksum>) -> Self {
        Self { source, checksum }
    }

    /// Verify one file. Returns its size in bytes when size and checksum match.
    ///
    /// A size mismatch is reported without computing the checksum.
    pub fn compare(&self, task: &FileTask) -> Result<u64, ComparisonFailure> {
        let path = || task.rel_path.clone();

        let remote = self
            .source
            .fetch(&task.remote_key)
            .map_err(|cause| ComparisonFailure::MetadataUnavailable { path: path(), cause })?;

        let local_size = fs::metadata(&task.local_path)
            .map_err(|source| ComparisonFailure::LocalMetadataUnavailable {
                path: path(),
                source,
            })?
            .len();

        if local_size != remote.size {
            return Err(ComparisonFailure::SizeMismatch {
                path: path(),
                local: local_size,
                remote: remote.size,
            });
        }

        let local = self
            .checksum
            .checksum(&task.local_path, local_size)
            .map_err(|source| ComparisonFailure::ChecksumFailed { path: path(), source })?;

        let remote_etag = remote.etag_unquoted();
        if local != remote_etag {
            return Err(ComparisonFailure::ChecksumMismatch {
                path: path(),
                local,
                remote: remote_etag.to_string(),
            });
        }

        tracing::debug!("{} ok ({} bytes, {})", task.rel_path, local_size, local);
        Ok(local_size)
    }
}
