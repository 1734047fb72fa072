//! Repeating background task that drives the authentication check.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Shortest accepted poll period. `interval_at` rejects zero.
pub const MIN_PERIOD: Duration = Duration::from_millis(100);

/// Handle to a running poll loop. Dropping it stops the loop.
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Run `tick` every `period`, first after one full period. Periods
    /// shorter than [`MIN_PERIOD`] are raised to it.
    ///
    /// `tick` returns `None` once its owner is gone, which ends the loop.
    /// A tick in progress is abandoned when the handle is stopped.
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Option<Fut> + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = if period < MIN_PERIOD {
            tracing::warn!("Poll period {:?} too short, using {:?}", period, MIN_PERIOD);
            MIN_PERIOD
        } else {
            period
        };
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let Some(work) = tick() else {
                            break;
                        };
                        tokio::select! {
                            _ = token.cancelled() => break,
                            _ = work => {}
                        }
                    }
                }
            }
            tracing::debug!("Auth poll loop stopped");
        });

        Self { cancel, task }
    }

    /// Stop the loop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
