//! # One-shot timer interface.
//!
//! The dispatch core borrows timers from the host reactor through
//! [`TimerDriver`]: schedule once, cancel if still pending. [`TokioTimer`] is
//! the bundled implementation; embedders with their own reactor implement the
//! trait and hand it to [`HubBuilder::with_timer`](crate::HubBuilder::with_timer).
//!
//! ## Rules
//! - Timers are one-shot, never auto-repeating.
//! - `cancel` is prompt, idempotent, and safe to call after the timer fired.
//! - The callback runs at most once.

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

/// Callback invoked when a one-shot timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a scheduled one-shot timer.
///
/// Carries the cancellation signal; drivers observe it to abandon the
/// callback. Dropping the handle does not cancel the timer.
#[derive(Clone, Debug)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    /// Creates a handle around the driver's cancellation signal.
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Returns the cancellation signal for driver implementations.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }
}

/// One-shot timer source borrowed from the host reactor.
pub trait TimerDriver: Send + Sync {
    /// Schedules `callback` to run once after `after`.
    fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerHandle;

    /// Cancels a pending timer; a no-op if it already fired or was cancelled.
    fn cancel(&self, handle: &TimerHandle);
}

/// [`TimerDriver`] backed by the tokio runtime.
///
/// `schedule` spawns a task that sleeps and then runs the callback, raced
/// against the handle's cancellation token. Requires an active tokio runtime;
/// with a multi-threaded runtime the callback runs on a worker thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTimer;

impl TimerDriver for TokioTimer {
    fn schedule(&self, after: Duration, callback: TimerCallback) -> TimerHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(after) => callback(),
                _ = cancelled.cancelled() => {}
            }
        });
        TimerHandle { token }
    }

    fn cancel(&self, handle: &TimerHandle) {
        handle.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_schedule_fires_once_after_deadline() {
        let fired = Arc::new(AtomicU32::new(0));
        let observed = fired.clone();

        let driver = TokioTimer;
        let _handle = driver.schedule(
            Duration::from_secs(1),
            Box::new(move || {
                observed.fetch_add(1, Ordering::SeqCst);
            }),
        );

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0, "not due yet");

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1, "one-shot, no repeat");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_callback() {
        let fired = Arc::new(AtomicU32::new(0));
        let observed = fired.clone();

        let driver = TokioTimer;
        let handle = driver.schedule(
            Duration::from_secs(1),
            Box::new(move || {
                observed.fetch_add(1, Ordering::SeqCst);
            }),
        );
        driver.cancel(&handle);
        driver.cancel(&handle); // idempotent

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
