//! Exit code logic for the curly process.
//!
//! Single responsibility: map a fatal error to the process exit outcome.

use std::sync::atomic::{AtomicBool, Ordering};

use curly_core::{ErrorCategory, TransferError};

use crate::ProcessExit;

/// Determines the process exit outcome for a fatal error.
///
/// Errors that are not transfer errors count as general failures.
pub(crate) fn determine_exit_outcome(error: &anyhow::Error) -> ProcessExit {
    match error.downcast_ref::<TransferError>().map(TransferError::category) {
        Some(ErrorCategory::Configuration) => ProcessExit::Configuration,
        Some(ErrorCategory::Timeout) => ProcessExit::Timeout,
        Some(ErrorCategory::Transport) | None => ProcessExit::Failure,
    }
}

/// Reports a `--max-time` expiry and ends the process with the timeout code.
///
/// Skips runtime shutdown, which would wait on blocked file or pipe I/O.
/// Both the watchdog thread and the main task may get here; only the first
/// reports and exits, a later caller parks until the exit lands.
pub(crate) fn exit_on_timeout(seconds: u64) -> ! {
    static REPORTED: AtomicBool = AtomicBool::new(false);
    if !REPORTED.swap(true, Ordering::SeqCst) {
        eprintln!("curly: {}", TransferError::MaxTimeExpired { seconds });
        std::process::exit(i32::from(ProcessExit::Timeout.code()));
    }
    loop {
        std::thread::park();
    }
}
