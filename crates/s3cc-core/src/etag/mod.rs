//! Local computation of S3 ETags.
//!
//! Files up to one chunk get a plain MD5. Larger files get the multipart
//! form: each chunk is hashed separately on a dedicated rayon pool, the raw
//! digests are concatenated in chunk order and hashed again, and the chunk
//! count is appended (`<hex>-<N>`).
//!
//! The multipart path first reserves the file's size from the shared
//! `ScratchAllocator`, then stages the chunks as part files in the scratch
//! directory. When the scratch area is full the computer backs off and tries
//! again; the reservation and the staged files are released on every exit path.
//! A file larger than the whole scratch area can never be staged, so its
//! chunks are hashed in place, each one read straight from the source file.

mod digest;
mod digests;
mod error;
mod split;

pub use digest::{md5_bytes, md5_hex_path, md5_path, md5_range, md5_reader, Md5Digest};
pub use digests::{multipart_etag, ChunkDigests};
pub use error::ChecksumError;

use anyhow::{Context, Result};
use bytesize::ByteSize;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};

use crate::chunk::{plan_chunks, Chunk};
use crate::config::S3ccConfig;
use crate::retry::{run_with_backoff, BackoffPolicy, Sleeper, ThreadSleeper};
use crate::scratch::{ScratchAllocator, ScratchGuard};

/// Computes the checksum of a local file that the object store would report.
///
/// Implemented by `EtagComputer`; the comparison engine only sees this trait.
pub trait LocalChecksum: Send + Sync {
    /// Checksum of `path`, whose size has already been read as `size`.
    fn checksum(&self, path: &Path, size: u64) -> Result<String, ChecksumError>;
}

/// Builds the pool used for per-chunk hashing.
pub fn chunk_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("s3cc-md5-{i}"))
        .build()
        .context("failed to build chunk hashing pool")
}

/// S3 ETag computer shared by all comparison workers.
pub struct EtagComputer {
    chunk_size: u64,
    pool: Arc<rayon::ThreadPool>,
    allocator: Arc<ScratchAllocator>,
    scratch_dir: PathBuf,
    backoff: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
    abort: Option<Arc<AtomicBool>>,
}

impl EtagComputer {
    /// Computer with the default backoff (1s, unbounded) and real sleeps.
    pub fn new(
        chunk_size: u64,
        pool: Arc<rayon::ThreadPool>,
        allocator: Arc<ScratchAllocator>,
        scratch_dir: PathBuf,
    ) -> Self {
        let chunk_size = chunk_size.max(1);
        tracing::debug!(
            chunk_size = %ByteSize(chunk_size),
            workers = pool.current_num_threads(),
            scratch_dir = %scratch_dir.display(),
            "ETag computer initialized"
        );
        Self {
            chunk_size,
            pool,
            allocator,
            scratch_dir,
            backoff: BackoffPolicy::default(),
            sleeper: Arc::new(ThreadSleeper),
            abort: None,
        }
    }

    /// Builds the pool and allocator described by `cfg`.
    ///
    /// Without an explicit `scratch_capacity`, the free space of the scratch
    /// directory is queried once here.
    pub fn from_config(cfg: &S3ccConfig) -> Result<Self> {
        let scratch_dir = cfg.scratch_dir();
        let allocator = match cfg.scratch_capacity {
            Some(capacity) => ScratchAllocator::new(capacity),
            None => ScratchAllocator::for_dir(&scratch_dir)?,
        };
        let pool = chunk_pool(cfg.chunk_workers)?;
        let backoff = BackoffPolicy::from(&cfg.backoff());
        Ok(Self::new(cfg.chunk_size, Arc::new(pool), Arc::new(allocator), scratch_dir)
            .with_backoff(backoff))
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Stop waiting for scratch space once `abort` is set.
    pub fn with_abort(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = Some(abort);
        self
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn allocator(&self) -> &Arc<ScratchAllocator> {
        &self.allocator
    }

    /// ETag of `path` as S3 reports it for a multipart upload with this chunk size.
    pub fn compute(&self, path: &Path, size: u64) -> Result<String, ChecksumError> {
        if size <= self.chunk_size {
            return md5_hex_path(path).map_err(|source| ChecksumError::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        if size > self.allocator.capacity() {
            return self.compute_in_place(path, size);
        }
        let _reservation = self.reserve(path, size)?;
        self.compute_multipart(path, size)
    }

    /// Waits until `size` bytes of scratch space are reserved.
    fn reserve(&self, path: &Path, size: u64) -> Result<ScratchGuard<'_>, ChecksumError> {
        run_with_backoff(&self.backoff, self.sleeper.as_ref(), self.abort.as_deref(), || {
            self.allocator.try_reserve(size).inspect_err(|e| {
                tracing::debug!(
                    "{} for {}, sleeping {:?}",
                    e,
                    path.display(),
                    self.backoff.interval
                )
            })
        })
        .map_err(|e| {
            if e.aborted {
                ChecksumError::Aborted
            } else {
                ChecksumError::CapacityWaitExhausted {
                    attempts: e.attempts,
                    last: e.last,
                }
            }
        })
    }

    fn compute_multipart(&self, path: &Path, size: u64) -> Result<String, ChecksumError> {
        let chunks = plan_chunks(size, self.chunk_size);
        tracing::debug!(
            "multipart ETag for {}: {} chunks of {}",
            path.display(),
            chunks.len(),
            ByteSize(self.chunk_size)
        );
        let staged = split::stage_chunks(path, &chunks, &self.scratch_dir)?;
        let parts = staged.parts();
        let etag = self.hash_chunks(path, parts.len(), |i| md5_path(&parts[i].path))?;
        drop(staged);
        Ok(etag)
    }

    /// Multipart ETag without staging: every chunk is read from `path` directly.
    fn compute_in_place(&self, path: &Path, size: u64) -> Result<String, ChecksumError> {
        let chunks: Vec<Chunk> = plan_chunks(size, self.chunk_size);
        tracing::debug!(
            "{} ({}) exceeds the scratch area ({}), hashing {} chunks in place",
            path.display(),
            ByteSize(size),
            ByteSize(self.allocator.capacity()),
            chunks.len()
        );
        let etag = self.hash_chunks(path, chunks.len(), |i| {
            md5_range(path, chunks[i].start, chunks[i].len())
        })?;
        let grew = digest::has_data_past(path, size).map_err(|source| ChecksumError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if grew {
            return Err(ChecksumError::Grew {
                path: path.to_path_buf(),
                expected: size,
            });
        }
        Ok(etag)
    }

    /// Runs `hash(i)` for every chunk index on the chunk pool and combines the
    /// digests in index order.
    fn hash_chunks<F>(&self, path: &Path, count: usize, hash: F) -> Result<String, ChecksumError>
    where
        F: Fn(usize) -> io::Result<Md5Digest> + Sync,
    {
        // Digests arrive in completion order; ChunkDigests puts them back in index order.
        let (tx, rx) = mpsc::channel();
        let hash = &hash;
        let hashed = panic::catch_unwind(AssertUnwindSafe(|| {
            self.pool.scope(|scope| {
                for index in 0..count {
                    let tx = tx.clone();
                    scope.spawn(move |_| {
                        let _ = tx.send((index, hash(index)));
                    });
                }
            })
        }));
        drop(tx);
        if hashed.is_err() {
            return Err(ChecksumError::ChunkPanicked);
        }

        let mut digests = ChunkDigests::new(count);
        for (index, res) in rx {
            let digest = res.map_err(|source| ChecksumError::Chunk {
                path: path.to_path_buf(),
                index,
                source,
            })?;
            digests.insert(index, digest);
        }
        digests.finish()
    }
}

impl LocalChecksum for EtagComputer {
    fn checksum(&self, path: &Path, size: u64) -> Result<String, ChecksumError> {
        self.compute(path, size)
    }
}
