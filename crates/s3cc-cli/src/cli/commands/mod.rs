//! CLI command handlers, one per file.

mod etag;
mod verify;

pub use etag::run_etag;
pub use verify::run_verify;
