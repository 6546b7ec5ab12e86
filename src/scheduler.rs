//! Recurring poll scheduling, one task per subscriber.
//!
//! The scheduler owns a map from subscriber identity to an abortable tokio
//! task. Starting a poll for a subscriber that already has one replaces it
//! atomically under the map's lock, so two tasks for the same subscriber
//! never run concurrently. Stopping reports whether a task actually existed,
//! which the caller uses for the "no monitoring was active" reply.

use crate::core::SubscriberId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// An active recurring poll for one subscriber.
struct PollTask {
    handle: JoinHandle<()>,
    interval: Duration,
    started_at: DateTime<Utc>,
}

/// Maps each subscriber to at most one active poll task.
#[derive(Default)]
pub struct Scheduler {
    tasks: Mutex<HashMap<SubscriberId, PollTask>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a recurring poll for a subscriber, replacing any existing one.
    ///
    /// `on_tick` is invoked once per interval, starting one full interval
    /// after this call (the first tick is not immediate). A failed tick is
    /// logged and swallowed; it never cancels the task.
    pub fn start<F, Fut>(&self, id: SubscriberId, interval: Duration, mut on_tick: F)
    where
        F: FnMut(SubscriberId) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately;
            // consume it so the first poll fires after one interval.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if let Err(e) = on_tick(id).await {
                    tracing::warn!(subscriber = %id, "poll tick failed: {e:#}");
                }
            }
        });

        let task = PollTask {
            handle,
            interval,
            started_at: Utc::now(),
        };

        let mut tasks = self.lock_tasks();
        if let Some(previous) = tasks.insert(id, task) {
            previous.handle.abort();
            tracing::info!(subscriber = %id, "replaced active poll task");
        } else {
            tracing::info!(subscriber = %id, interval = ?interval, "started poll task");
        }
    }

    /// Cancel the subscriber's poll task if one is active.
    ///
    /// Returns whether a task was actually cancelled. `false` is a normal
    /// negative result, not an error.
    pub fn stop(&self, id: SubscriberId) -> bool {
        let removed = self.lock_tasks().remove(&id);
        match removed {
            Some(task) => {
                task.handle.abort();
                tracing::info!(
                    subscriber = %id,
                    interval = ?task.interval,
                    active_for = %(Utc::now() - task.started_at),
                    "stopped poll task"
                );
                true
            }
            None => false,
        }
    }

    /// Whether the subscriber currently has an active poll task.
    pub fn is_active(&self, id: SubscriberId) -> bool {
        self.lock_tasks().contains_key(&id)
    }

    /// Number of active poll tasks.
    pub fn active_count(&self) -> usize {
        self.lock_tasks().len()
    }

    /// Abort all active tasks. Used on shutdown.
    pub fn shutdown(&self) {
        let mut tasks = self.lock_tasks();
        for (id, task) in tasks.drain() {
            task.handle.abort();
            tracing::debug!(subscriber = %id, "aborted poll task on shutdown");
        }
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriberId, PollTask>> {
        // The map only holds task handles; a panic while holding the lock
        // cannot leave it in an inconsistent state.
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_stop_without_start_reports_no_task() {
        let scheduler = Scheduler::new();
        assert!(!scheduler.stop(SubscriberId(42)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_interval() {
        let scheduler = Scheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        let counter = ticks.clone();
        scheduler.start(SubscriberId(1), Duration::from_secs(1), move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_future_ticks() {
        let scheduler = Scheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        let counter = ticks.clone();
        scheduler.start(SubscriberId(7), Duration::from_secs(1), move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        assert!(scheduler.stop(SubscriberId(7)));
        assert!(!scheduler.is_active(SubscriberId(7)));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_errors_do_not_cancel_the_task() {
        let scheduler = Scheduler::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        let counter = ticks.clone();
        scheduler.start(SubscriberId(9), Duration::from_secs(1), move |_| {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    anyhow::bail!("simulated fetch failure");
                }
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        // The failing first tick did not stop the schedule.
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(scheduler.is_active(SubscriberId(9)));
    }
}
