//! Per-chunk digest collection and the final hash-of-hashes.

use md5::{Digest, Md5};

use super::digest::Md5Digest;
use super::error::ChecksumError;

/// Digests of one file's chunks, stored by chunk index.
///
/// Chunks may be hashed and inserted in any order; `finish` always
/// concatenates them in ascending index order.
#[derive(Debug, Clone)]
pub struct ChunkDigests {
    slots: Vec<Option<Md5Digest>>,
}

impl ChunkDigests {
    /// Collection for a file of `count` chunks.
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
        }
    }

    /// Number of chunks expected.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Record the digest for chunk `index`. Indices outside the file are ignored.
    pub fn insert(&mut self, index: usize, digest: Md5Digest) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(digest);
        }
    }

    /// Build the multipart ETag; fails if any chunk digest is missing.
    pub fn finish(self) -> Result<String, ChecksumError> {
        let digests = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(i, d)| d.ok_or(ChecksumError::MissingChunk(i)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(multipart_etag(&digests))
    }
}

/// `hex(md5(d0 || d1 || ...))-N` over raw digests, in the order given.
pub fn multipart_etag(digests: &[Md5Digest]) -> String {
    let mut hasher = Md5::new();
    for d in digests {
        hasher.update(d);
    }
    format!("{}-{}", hex::encode(hasher.finalize()), digests.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etag::digest::md5_bytes;

    fn sample() -> Vec<Md5Digest> {
        vec![md5_bytes(b"first"), md5_bytes(b"second"), md5_bytes(b"third")]
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let d = sample();
        let mut forward = ChunkDigests::new(3);
        for (i, digest) in d.iter().enumerate() {
            forward.insert(i, *digest);
        }
        let mut shuffled = ChunkDigests::new(3);
        shuffled.insert(2, d[2]);
        shuffled.insert(0, d[0]);
        shuffled.insert(1, d[1]);
        assert_eq!(forward.finish().unwrap(), shuffled.finish().unwrap());
    }

    #[test]
    fn concatenation_order_matters() {
        let d = sample();
        let swapped = vec![d[1], d[0], d[2]];
        assert_ne!(multipart_etag(&d), multipart_etag(&swapped));
    }

    #[test]
    fn suffix_is_chunk_count() {
        let d = sample();
        assert!(multipart_etag(&d).ends_with("-3"));
        assert!(multipart_etag(&d[..1]).ends_with("-1"));
    }

    #[test]
    fn hashes_raw_digest_bytes() {
        let d = sample();
        let mut concat = Vec::new();
        for digest in &d {
            concat.extend_from_slice(digest);
        }
        let expected = format!("{}-3", hex::encode(md5_bytes(&concat)));
        assert_eq!(multipart_etag(&d), expected);
    }

    #[test]
    fn missing_chunk_is_an_error() {
        let mut digests = ChunkDigests::new(2);
        digests.insert(0, md5_bytes(b"a"));
        digests.insert(5, md5_bytes(b"ignored"));
        assert!(matches!(
            digests.finish(),
            Err(ChecksumError::MissingChunk(1))
        ));
    }
}
