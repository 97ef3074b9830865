//! Ctrl-C handling: the first interrupt asks the run to stop, the second exits.

use anyhow::{Context, Result};
use s3cc_core::etag::ChecksumError;
use s3cc_core::verify::RunAborted;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exit status after an interrupt (128 + SIGINT).
pub const EXIT_INTERRUPTED: i32 = 130;

/// Installs the process-wide Ctrl-C handler and returns its abort token.
///
/// Workers stop taking new files once the token is set, so staged chunks
/// and the scratch directory are removed on the way out.
pub fn install_abort_handler() -> Result<Arc<AtomicBool>> {
    let abort = Arc::new(AtomicBool::new(false));
    let token = Arc::clone(&abort);
    ctrlc::set_handler(move || {
        if on_interrupt(&token) {
            std::process::exit(EXIT_INTERRUPTED);
        }
    })
    .context("install Ctrl-C handler")?;
    Ok(abort)
}

/// Sets `abort`. Returns true when it was already set (second interrupt).
pub(crate) fn on_interrupt(abort: &AtomicBool) -> bool {
    let again = abort.swap(true, Ordering::SeqCst);
    if !again {
        eprintln!("s3cc: interrupted, finishing files in progress (Ctrl-C again to exit now)");
    }
    again
}

/// True when `err` comes from a run stopped by the abort token.
pub fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<RunAborted>().is_some()
            || matches!(cause.downcast_ref::<ChecksumError>(), Some(ChecksumError::Aborted))
    })
}
