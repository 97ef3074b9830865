//! Run orchestration: enumerate the tree, compare every file, aggregate.

mod run;
mod summary;

pub use run::{run_comparisons, RunAborted};
pub use summary::{FailedFile, RunSummary};

use anyhow::Result;
use bytesize::ByteSize;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::compare::{Comparator, FailureKind, FileTask};
use crate::remote::S3Url;
use crate::walk::find_files;

/// Compare every file under `base_dir` with its object under `target`.
///
/// Per-file failures end up in the summary, including entries the walk could
/// not list. An `Err` means the run itself could not complete (unreadable
/// `base_dir`, dead worker, abort).
pub fn verify_tree(
    base_dir: &Path,
    target: &S3Url,
    comparator: Arc<Comparator>,
    workers: usize,
    abort: Option<Arc<AtomicBool>>,
) -> Result<RunSummary> {
    let listing = find_files(base_dir)?;
    let tasks: Vec<FileTask> = listing
        .files
        .iter()
        .map(|rel| FileTask::new(base_dir, rel, &target.prefix))
        .collect();
    tracing::info!(
        "comparing {} files from {} with {}",
        tasks.len(),
        base_dir.display(),
        target
    );

    let mut summary = run_comparisons(tasks, comparator, workers, abort)?;
    for err in &listing.errors {
        summary.record_failure(&err.path, FailureKind::LocalMetadataUnavailable);
    }
    tracing::info!(
        success = summary.success,
        errors = summary.errors,
        files = summary.files,
        bytes = %ByteSize(summary.bytes),
        "verification finished"
    );
    Ok(summary)
}
