//! `s3cc verify <dir> s3://bucket/prefix` – compare a local tree with S3.

use anyhow::Result;
use s3cc_core::compare::Comparator;
use s3cc_core::config::S3ccConfig;
use s3cc_core::etag::EtagComputer;
use s3cc_core::remote::{HttpHeadSource, S3Url};
use s3cc_core::verify::verify_tree;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::cli::interrupt::{is_interrupted, EXIT_INTERRUPTED};

pub fn run_verify(
    cfg: &S3ccConfig,
    base_dir: &Path,
    target: &S3Url,
    json: bool,
    abort: Arc<AtomicBool>,
) -> Result<i32> {
    let source = HttpHeadSource::from_config(cfg, &target.bucket)?;
    let computer = EtagComputer::from_config(cfg)?.with_abort(Arc::clone(&abort));
    let comparator = Arc::new(Comparator::new(Arc::new(source), Arc::new(computer)));

    let summary = match verify_tree(base_dir, target, comparator, cfg.file_workers, Some(abort)) {
        Ok(summary) => summary,
        Err(err) if is_interrupted(&err) => {
            tracing::warn!("{:#}", err);
            return Ok(EXIT_INTERRUPTED);
        }
        Err(err) => return Err(err),
    };
    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!("{summary}");
    }
    Ok(summary.exit_code())
}
