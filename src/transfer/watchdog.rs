//! `--max-time` watchdog.
//!
//! The deadline is fixed when the watchdog starts. [`Watchdog::guard`] races
//! the whole transfer against it; on expiry the transfer future is dropped
//! mid-flight (closing sockets and the output file) and
//! [`TransferError::MaxTimeExpired`] is returned. There is no salvage of
//! partial results.
//!
//! `guard` only fires while the runtime gets to poll it. Blocking work (a
//! stalled pipe, a FIFO with no writer) can starve it, so
//! [`Watchdog::spawn_backstop`] also runs the deadline on a plain OS thread.

use std::future::Future;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::time::Instant;
use tracing::error;

use super::error::TransferError;

/// Wall-clock budget for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct Watchdog {
    budget_secs: u64,
    deadline: Option<Instant>,
    wall_deadline: Option<std::time::Instant>,
}

impl Watchdog {
    /// Starts the watchdog now. A budget of zero never fires.
    #[must_use]
    pub fn start(budget_secs: u64) -> Self {
        let budget = Duration::from_secs(budget_secs);
        let armed = budget_secs > 0;
        Self {
            budget_secs,
            deadline: armed.then(|| Instant::now() + budget),
            wall_deadline: armed.then(|| std::time::Instant::now() + budget),
        }
    }

    /// Returns true when a deadline is set.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Completes when the deadline passes; pends forever when unarmed.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    /// Spawns an OS thread that calls `on_expire` with the budget once the
    /// wall-clock deadline passes. Returns `None` when unarmed or when the
    /// thread cannot be spawned.
    ///
    /// The thread does not depend on the async runtime, so it fires even when
    /// every worker is blocked. `on_expire` is expected to end the process.
    pub fn spawn_backstop<F>(&self, on_expire: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let wall_deadline = self.wall_deadline?;
        let seconds = self.budget_secs;
        thread::Builder::new()
            .name("curly-watchdog".to_string())
            .spawn(move || {
                thread::sleep(wall_deadline.saturating_duration_since(std::time::Instant::now()));
                on_expire(seconds);
            })
            .map_err(|error| error!(error = %error, "failed to spawn watchdog thread"))
            .ok()
    }

    /// Runs `operation` unless the deadline passes first.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, or
    /// [`TransferError::MaxTimeExpired`] when the deadline wins.
    pub async fn guard<F, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: From<TransferError>,
    {
        if !self.is_armed() {
            return operation.await;
        }

        tokio::select! {
            result = operation => result,
            () = self.expired() => {
                error!(seconds = self.budget_secs, "maximum operation time expired");
                Err(TransferError::MaxTimeExpired { seconds: self.budget_secs }.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_fires_before_slow_operation() {
        let watchdog = Watchdog::start(1);
        let result = watchdog
            .guard(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, TransferError>("done")
            })
            .await;

        assert!(matches!(
            result,
            Err(TransferError::MaxTimeExpired { seconds: 1 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_lets_fast_operation_finish() {
        let watchdog = Watchdog::start(5);
        let result = watchdog
            .guard(async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, TransferError>(42)
            })
            .await;

        assert_eq!(result.ok(), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_zero_budget_never_fires() {
        let watchdog = Watchdog::start(0);
        assert!(!watchdog.is_armed());
        let result = watchdog
            .guard(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok::<_, TransferError>(())
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_propagates_operation_error() {
        let watchdog = Watchdog::start(5);
        let result: Result<(), _> = watchdog
            .guard(async { Err(TransferError::ConflictingBody) })
            .await;
        assert!(matches!(result, Err(TransferError::ConflictingBody)));
    }

    #[test]
    fn test_watchdog_backstop_fires_without_runtime() {
        let watchdog = Watchdog::start(1);
        let (tx, rx) = std::sync::mpsc::channel();
        let started = std::time::Instant::now();

        let handle = watchdog
            .spawn_backstop(move |seconds| {
                let _ = tx.send(seconds);
            })
            .unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
        assert!(started.elapsed() >= Duration::from_millis(900));
        handle.join().unwrap();
    }

    #[test]
    fn test_watchdog_backstop_unarmed_spawns_nothing() {
        let watchdog = Watchdog::start(0);
        assert!(watchdog.spawn_backstop(|_| {}).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_deadline_counts_from_start() {
        let watchdog = Watchdog::start(2);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let result = watchdog
            .guard(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, TransferError>(())
            })
            .await;
        assert!(matches!(result, Err(TransferError::MaxTimeExpired { .. })));
    }
}
