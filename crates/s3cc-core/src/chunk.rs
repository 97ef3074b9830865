//! Fixed-size chunk planning for multipart ETags.

/// One multipart chunk: byte range [start, end) of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position in the file (S3 part number - 1).
    pub index: usize,
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl Chunk {
    /// Length of this chunk in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Number of chunks of `chunk_size` needed to cover `total_size` bytes.
pub fn chunk_count(total_size: u64, chunk_size: u64) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    total_size.div_ceil(chunk_size) as usize
}

/// Splits `total_size` bytes into consecutive chunks of exactly `chunk_size`
/// bytes; only the last chunk may be shorter.
///
/// Returns an empty vec if `total_size` or `chunk_size` is 0.
pub fn plan_chunks(total_size: u64, chunk_size: u64) -> Vec<Chunk> {
    let count = chunk_count(total_size, chunk_size);
    let mut out = Vec::with_capacity(count);
    let mut start = 0u64;
    for index in 0..count {
        let end = start.saturating_add(chunk_size).min(total_size);
        out.push(Chunk { index, start, end });
        start = end;
    }
    out
}
