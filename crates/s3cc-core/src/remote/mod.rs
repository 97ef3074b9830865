//! Remote object metadata.
//!
//! The comparison engine only needs an object's size and ETag. It gets them
//! through the `MetadataSource` trait; `HttpHeadSource` implements it with a
//! plain HTTP HEAD request against an S3 (or S3-compatible) endpoint, signed
//! with SigV4 when credentials are available.

mod head;
mod parse;
mod s3url;
mod sign;

pub use head::HttpHeadSource;
pub use s3url::{S3Url, S3UrlError};
pub use sign::Credentials;

use anyhow::Result;

/// Size and checksum of one remote object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMetadata {
    /// `Content-Length` in bytes.
    pub size: u64,
    /// ETag as sent by the store; may still be wrapped in quotes.
    pub etag: String,
}

impl RemoteMetadata {
    /// ETag with surrounding quote characters removed.
    pub fn etag_unquoted(&self) -> &str {
        self.etag.trim_matches('"')
    }
}

/// Anything that can look up an object's metadata by key.
pub trait MetadataSource: Send + Sync {
    fn fetch(&self, key: &str) -> Result<RemoteMetadata>;
}

/// Object key for `rel_path` under `prefix`.
///
/// The prefix is treated as a directory: `backup` and `backup/` both map
/// `a/b.txt` to `backup/a/b.txt`. An empty prefix leaves the path unchanged.
pub fn object_key(prefix: &str, rel_path: &str) -> String {
    if prefix.is_empty() {
        rel_path.to_string()
    } else if prefix.ends_with('/') {
        format!("{prefix}{rel_path}")
    } else {
        format!("{prefix}/{rel_path}")
    }
}
