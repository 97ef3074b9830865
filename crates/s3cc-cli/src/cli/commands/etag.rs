//! `s3cc etag <path>` – print the ETag S3 would report for a local file.

use anyhow::{Context, Result};
use s3cc_core::config::S3ccConfig;
use s3cc_core::etag::EtagComputer;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::cli::interrupt::{is_interrupted, EXIT_INTERRUPTED};

pub fn run_etag(cfg: &S3ccConfig, path: &Path, abort: Arc<AtomicBool>) -> Result<i32> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    let computer = EtagComputer::from_config(cfg)?.with_abort(abort);
    let etag = match computer
        .compute(path, size)
        .with_context(|| format!("compute ETag of {}", path.display()))
    {
        Ok(etag) => etag,
        Err(err) if is_interrupted(&err) => {
            tracing::warn!("{:#}", err);
            return Ok(EXIT_INTERRUPTED);
        }
        Err(err) => return Err(err),
    };
    println!("{}  {}", etag, path.display());
    Ok(0)
}
