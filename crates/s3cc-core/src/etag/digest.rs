//! MD5 helpers (the S3 ETag primitive).

use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Raw 16-byte MD5 digest.
pub type Md5Digest = [u8; 16];

/// MD5 of an in-memory buffer.
pub fn md5_bytes(data: &[u8]) -> Md5Digest {
    let mut hasher = Md5::new();
    hasher.update(data);
    finish(hasher)
}

/// MD5 of everything `reader` yields, read in bounded chunks.
pub fn md5_reader<R: Read>(mut reader: R) -> io::Result<Md5Digest> {
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(finish(hasher))
}

/// MD5 of a whole file.
pub fn md5_path(path: &Path) -> io::Result<Md5Digest> {
    md5_reader(File::open(path)?)
}

/// MD5 of `len` bytes of `path` starting at `offset`.
///
/// Fails with `UnexpectedEof` if the file ends before `offset + len`.
pub fn md5_range(path: &Path, offset: u64, len: u64) -> io::Result<Md5Digest> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut reader = file.take(len);
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; BUF_SIZE];
    let mut read = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        read += n as u64;
    }
    if read < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("range at {offset} ended after {read} of {len} bytes"),
        ));
    }
    Ok(finish(hasher))
}

/// True if `path` has any data at or past `offset`.
pub(crate) fn has_data_past(path: &Path, offset: u64) -> io::Result<bool> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut byte = [0u8; 1];
    Ok(file.read(&mut byte)? > 0)
}

/// Lowercase hex MD5 of a whole file (the single-part ETag).
pub fn md5_hex_path(path: &Path) -> io::Result<String> {
    md5_path(path).map(hex::encode)
}

fn finish(hasher: Md5) -> Md5Digest {
    let mut out = [0u8; 16];
    out.copy_from_slice(&hasher.finalize());
    out
}
