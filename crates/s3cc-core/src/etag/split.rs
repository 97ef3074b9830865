//! Stage a file's chunks as part files in a private scratch directory.
//!
//! The directory is a `TempDir`, so it and every part file are removed when
//! `StagedChunks` is dropped, whatever the outcome of the computation.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::error::ChecksumError;
use crate::chunk::Chunk;

const BUF_SIZE: usize = 256 * 1024;

/// One chunk copied to the scratch area.
#[derive(Debug)]
pub(crate) struct StagedPart {
    pub(crate) index: usize,
    pub(crate) path: PathBuf,
}

/// All part files of one file, owned by their scratch directory.
#[derive(Debug)]
pub(crate) struct StagedChunks {
    dir: TempDir,
    parts: Vec<StagedPart>,
}

impl StagedChunks {
    pub(crate) fn parts(&self) -> &[StagedPart] {
        &self.parts
    }

    #[cfg(test)]
    pub(crate) fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Copies each chunk of `source` into its own part file under `scratch_dir`.
pub(crate) fn stage_chunks(
    source: &Path,
    chunks: &[Chunk],
    scratch_dir: &Path,
) -> Result<StagedChunks, ChecksumError> {
    let scratch_err = |source: std::io::Error| ChecksumError::Scratch {
        dir: scratch_dir.to_path_buf(),
        source,
    };
    let dir = tempfile::Builder::new()
        .prefix("s3cc-")
        .tempdir_in(scratch_dir)
        .map_err(scratch_err)?;
    let mut src = File::open(source).map_err(|e| ChecksumError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;

    let mut buf = vec![0u8; BUF_SIZE];
    let mut parts = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let part_path = dir.path().join(format!("part-{:06}", chunk.index));
        let mut out = File::create(&part_path).map_err(scratch_err)?;
        let mut remaining = chunk.len();
        while remaining > 0 {
            let want = remaining.min(buf.len() as u64) as usize;
            let n = src.read(&mut buf[..want]).map_err(|e| ChecksumError::Io {
                path: source.to_path_buf(),
                source: e,
            })?;
            if n == 0 {
                return Err(ChecksumError::ShortRead {
                    path: source.to_path_buf(),
                    expected: chunk.end,
                    read: chunk.end - remaining,
                });
            }
            out.write_all(&buf[..n]).map_err(scratch_err)?;
            remaining -= n as u64;
        }
        parts.push(StagedPart {
            index: chunk.index,
            path: part_path,
        });
    }

    let total = chunks.last().map_or(0, |c| c.end);
    let extra = src.read(&mut buf[..1]).map_err(|e| ChecksumError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;
    if extra > 0 {
        return Err(ChecksumError::Grew {
            path: source.to_path_buf(),
            expected: total,
        });
    }

    Ok(StagedChunks { dir, parts })
}
