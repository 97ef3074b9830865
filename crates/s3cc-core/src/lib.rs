//! s3cc core: verify a local file tree against its copy in an S3 bucket.
//!
//! Sizes are compared first; files whose sizes match get their S3 ETag
//! recomputed locally (plain or multipart MD5) and compared with the
//! remote one.

pub mod chunk;
pub mod compare;
pub mod config;
pub mod etag;
pub mod logging;
pub mod remote;
pub mod retry;
pub mod scratch;
pub mod verify;
pub mod walk;
