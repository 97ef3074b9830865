//! Errors raised while computing a local ETag.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::scratch::CapacityExceeded;

#[derive(Debug, Error)]
pub enum ChecksumError {
    /// Reading the source file failed.
    #[error("read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    /// Creating or writing the staged chunk files failed.
    #[error("stage chunks in {}: {source}", .dir.display())]
    Scratch { dir: PathBuf, source: io::Error },

    /// Hashing one staged chunk failed.
    #[error("hash chunk {index} of {}: {source}", .path.display())]
    Chunk {
        path: PathBuf,
        index: usize,
        source: io::Error,
    },

    /// The file ended before its recorded size (it changed under us).
    #[error("{} is shorter than expected: wanted {expected} bytes, read {read}", .path.display())]
    ShortRead {
        path: PathBuf,
        expected: u64,
        read: u64,
    },

    /// A chunk digest never arrived from the hashing pool.
    #[error("missing digest for chunk {0}")]
    MissingChunk(usize),

    /// A chunk hashing task panicked.
    #[error("chunk hashing task panicked")]
    ChunkPanicked,

    /// The file has more data than its recorded size (it grew under us).
    #[error("{} grew while being hashed: expected {expected} bytes", .path.display())]
    Grew { path: PathBuf, expected: u64 },

    /// The run was aborted while waiting for scratch space.
    #[error("aborted while waiting for scratch space")]
    Aborted,

    /// The configured number of reservation attempts ran out.
    #[error("gave up waiting for scratch space after {attempts} attempts: {last}")]
    CapacityWaitExhausted {
        attempts: u32,
        last: CapacityExceeded,
    },
}
