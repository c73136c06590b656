//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use postgres::{CancelToken, NoTls};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use strata_migrate::MigrateError;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main never prints it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Exit code after a second interrupt
pub(crate) const INTERRUPTED: u8 = 130;

/// Run blocking database work on its own thread.
///
/// The synchronous PostgreSQL client drives a private runtime and cannot be
/// used from inside the async runtime, so it never runs on a runtime thread.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = tokio::sync::oneshot::channel();
    std::thread::Builder::new()
        .name("strata-db".to_string())
        .spawn(move || {
            let _ = tx.send(work());
        })
        .context("Failed to start database thread")?;
    rx.await.context("Database thread exited unexpectedly")?
}

/// Slot where the worker publishes the cancel token of its connection
pub(crate) type CancelSlot = Mutex<Option<CancelToken>>;

/// Store the session's cancel token for [`wait_with_interrupts`]
pub(crate) fn publish_cancel_token(slot: &CancelSlot, token: CancelToken) {
    if let Ok(mut guard) = slot.lock() {
        *guard = Some(token);
    }
}

fn cancel_running_query(slot: &CancelSlot) {
    let Some(token) = slot.lock().ok().and_then(|mut guard| guard.take()) else {
        return;
    };
    // cancel_query blocks on its own runtime.
    std::thread::spawn(move || {
        if let Err(e) = token.cancel_query(NoTls) {
            log::warn!("Failed to cancel running query: {}", e);
        }
    });
}

/// Await `work` while watching for Ctrl-C.
///
/// The first interrupt sets `cancel` and cancels the statement in flight, so
/// the run stops at the next boundary and rolls back the current step. A
/// second interrupt gives up immediately with exit code 130.
pub(crate) async fn wait_with_interrupts<T>(
    work: impl Future<Output = Result<T>>,
    cancel: &AtomicBool,
    slot: &CancelSlot,
) -> Result<T> {
    tokio::pin!(work);
    let mut interrupted = false;
    loop {
        tokio::select! {
            result = &mut work => return result,
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for interrupt")?;
                if interrupted {
                    eprintln!("Interrupted again, exiting");
                    return Err(ExitCode(INTERRUPTED).into());
                }
                interrupted = true;
                eprintln!("Interrupt received, cancelling (press Ctrl-C again to exit now)");
                cancel.store(true, Ordering::SeqCst);
                cancel_running_query(slot);
            }
        }
    }
}

/// Render a migration or code install failure the way psql users expect:
/// the error, then DETAIL, HINT and the failing line with a caret.
pub(crate) fn format_migrate_error(err: &MigrateError) -> String {
    let mut lines = vec![err.to_string()];
    if let Some(info) = err.sql_info() {
        if let Some(detail) = &info.detail {
            lines.push(format!("DETAIL: {detail}"));
        }
        if let Some(hint) = &info.hint {
            lines.push(format!("HINT: {hint}"));
        }
    }
    if let Some(line) = err.sql_diagnostic() {
        lines.push(line.render_caret());
    }
    lines.join("\n")
}

/// Print a library failure and turn it into exit code 1
pub(crate) fn report(err: MigrateError) -> anyhow::Error {
    eprintln!("{}", format_migrate_error(&err));
    ExitCode(1).into()
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
