//! Bounded worker pool over file comparisons.

use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use super::RunSummary;
use crate::compare::{Comparator, ComparisonFailure, FileTask};

/// Returned when the abort token was set before every file reported.
#[derive(Debug, Error)]
#[error("run aborted after {completed} of {total} files")]
pub struct RunAborted {
    pub completed: usize,
    pub total: usize,
}

/// Run every task on at most `workers` threads and aggregate the results.
///
/// Results are consumed in completion order. The summary is returned only
/// after all tasks have reported; a worker that dies without reporting fails
/// the whole run. When `abort` is set, workers stop taking new tasks, tasks
/// already running finish, and the run returns `RunAborted`.
pub fn run_comparisons(
    tasks: Vec<FileTask>,
    comparator: Arc<Comparator>,
    workers: usize,
    abort: Option<Arc<AtomicBool>>,
) -> Result<RunSummary> {
    let count = tasks.len();
    let mut summary = RunSummary::default();
    if count == 0 {
        return Ok(summary);
    }

    let work: Arc<Mutex<VecDeque<FileTask>>> = Arc::new(Mutex::new(tasks.into_iter().collect()));
    let abort = abort.unwrap_or_else(|| Arc::new(AtomicBool::new(false)));
    let (tx, rx) = mpsc::channel::<Result<u64, ComparisonFailure>>();
    let num_workers = workers.max(1).min(count);
    let mut handles = Vec::with_capacity(num_workers);
    for i in 0..num_workers {
        let work = Arc::clone(&work);
        let tx = tx.clone();
        let abort = Arc::clone(&abort);
        let comparator = Arc::clone(&comparator);
        let handle = std::thread::Builder::new()
            .name(format!("s3cc-cmp-{i}"))
            .spawn(move || loop {
                if abort.load(Ordering::Relaxed) {
                    break;
                }
                let task = match work.lock().unwrap_or_else(PoisonError::into_inner).pop_front() {
                    Some(t) => t,
                    None => break,
                };
                tracing::debug!("comparing {}", task.rel_path);
                let res = comparator.compare(&task);
                if tx.send(res).is_err() {
                    break;
                }
            })
            .map_err(|e| anyhow!("failed to spawn comparison worker: {e}"))?;
        handles.push(handle);
    }
    drop(tx);

    let mut first_error: Option<anyhow::Error> = None;
    let mut to_receive = count;
    while to_receive > 0 {
        let res = match rx.recv() {
            Ok(res) => res,
            Err(_) => {
                // Every sender is gone: either the abort token stopped the
                // workers or one of them panicked.
                if abort.load(Ordering::Relaxed) {
                    first_error = Some(anyhow!(RunAborted {
                        completed: count - to_receive,
                        total: count,
                    }));
                } else {
                    first_error = Some(anyhow!(
                        "comparison result channel closed with {} of {} files unreported (worker may have panicked)",
                        to_receive,
                        count
                    ));
                }
                break;
            }
        };
        to_receive -= 1;
        if let Err(failure) = &res {
            log_failure(failure);
        }
        summary.record(&res);
    }

    for h in handles {
        if h.join().is_err() && first_error.is_none() {
            first_error = Some(anyhow!("comparison worker panicked"));
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }
    Ok(summary)
}

fn log_failure(failure: &ComparisonFailure) {
    match failure {
        ComparisonFailure::SizeMismatch {
            path,
            local,
            remote,
        } => tracing::error!(
            kind = %failure.kind(),
            "{}: size mismatch, local={} remote={}",
            path,
            local,
            remote
        ),
        ComparisonFailure::ChecksumMismatch {
            path,
            local,
            remote,
        } => tracing::error!(
            kind = %failure.kind(),
            "{}: checksum mismatch, local={} remote={}",
            path,
            local,
            remote
        ),
        other => tracing::error!(kind = %other.kind(), "{}", other),
    }
}
