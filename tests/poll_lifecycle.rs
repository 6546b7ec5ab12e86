//! Integration tests for the per-subscriber poll lifecycle.

use oximeter_bot::core::SubscriberId;
use oximeter_bot::scheduler::Scheduler;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn counting_tick(
    counter: Arc<AtomicUsize>,
) -> impl FnMut(SubscriberId) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>>
       + Send
       + 'static {
    move |_| {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

#[tokio::test(start_paused = true)]
async fn ticks_fire_on_schedule_after_one_interval() {
    let scheduler = Scheduler::new();
    let ticks = Arc::new(AtomicUsize::new(0));

    scheduler.start(
        SubscriberId(1),
        Duration::from_secs(1),
        counting_tick(ticks.clone()),
    );

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn restart_replaces_the_active_task() {
    let scheduler = Scheduler::new();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let id = SubscriberId(42);

    scheduler.start(id, Duration::from_secs(1), counting_tick(first.clone()));
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(first.load(Ordering::SeqCst), 1);

    // Replacing the task must silence the first one for good.
    scheduler.start(id, Duration::from_secs(1), counting_tick(second.clone()));
    assert_eq!(scheduler.active_count(), 1);

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn stop_reports_whether_a_task_existed() {
    let scheduler = Scheduler::new();
    let ticks = Arc::new(AtomicUsize::new(0));
    let id = SubscriberId(7);

    // Stop with nothing running is a normal negative result.
    assert!(!scheduler.stop(id));

    scheduler.start(id, Duration::from_secs(1), counting_tick(ticks.clone()));
    assert!(scheduler.stop(id));
    assert!(!scheduler.stop(id));

    // No ticks fire after the stop.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn subscribers_are_independent() {
    let scheduler = Scheduler::new();
    let a = Arc::new(AtomicUsize::new(0));
    let b = Arc::new(AtomicUsize::new(0));

    scheduler.start(
        SubscriberId(1),
        Duration::from_secs(1),
        counting_tick(a.clone()),
    );
    scheduler.start(
        SubscriberId(2),
        Duration::from_secs(2),
        counting_tick(b.clone()),
    );
    assert_eq!(scheduler.active_count(), 2);

    tokio::time::sleep(Duration::from_millis(4500)).await;
    assert_eq!(a.load(Ordering::SeqCst), 4);
    assert_eq!(b.load(Ordering::SeqCst), 2);

    // Stopping one subscriber leaves the other running.
    assert!(scheduler.stop(SubscriberId(1)));
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(a.load(Ordering::SeqCst), 4);
    assert_eq!(b.load(Ordering::SeqCst), 3);
}
