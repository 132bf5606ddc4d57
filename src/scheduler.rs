//! Periodic forwarding cycles.
//!
//! A fixed-rate timer fires every `interval`, first at `start + interval`.
//! Each fire runs one cycle in its own task so a slow cycle never delays the
//! timer. At most one cycle is in flight: a fire that finds the previous
//! cycle still running is skipped, not queued.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::relay::Relay;

/// Counters of the periodic schedule.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    ticks: AtomicU64,
    started: AtomicU64,
    skipped: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl SchedulerStats {
    /// Timer fires so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Fires that started a cycle.
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    /// Fires dropped because a cycle was still running.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Runs [`Relay::run_cycle`] on a fixed-rate schedule.
#[derive(Debug)]
pub struct Scheduler {
    relay: Relay,
    interval: Duration,
    stats: Arc<SchedulerStats>,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(relay: Relay, interval: Duration) -> Self {
        Self {
            relay,
            interval,
            stats: Arc::new(SchedulerStats::default()),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> Arc<SchedulerStats> {
        self.stats.clone()
    }

    /// Spawn the timer task.
    ///
    /// Stopping the returned handle stops future fires; a cycle already in
    /// flight runs to completion.
    pub fn start(&self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let relay = self.relay.clone();
        let stats = self.stats.clone();
        let running = self.running.clone();
        let interval = self.interval;

        let task = tokio::spawn(async move {
            let Some(first) = Instant::now().checked_add(interval) else {
                tracing::error!(
                    interval_secs = interval.as_secs(),
                    "Interval out of range, periodic forwarding disabled"
                );
                return;
            };
            let mut timer = tokio::time::interval_at(first, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        let tick = stats.ticks.fetch_add(1, Ordering::Relaxed) + 1;

                        let Some(guard) = CycleGuard::try_acquire(&running) else {
                            stats.skipped.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(tick, "Previous cycle still running, skipping tick");
                            continue;
                        };

                        stats.started.fetch_add(1, Ordering::Relaxed);
                        tokio::spawn(run_guarded(relay.clone(), stats.clone(), guard, tick));
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            tracing::debug!("Scheduler stopped");
                            break;
                        }
                    }
                }
            }
        });

        SchedulerHandle { stop_tx, task }
    }
}

async fn run_guarded(relay: Relay, stats: Arc<SchedulerStats>, _guard: CycleGuard, tick: u64) {
    tracing::info!(tick, "Cycle started");

    match relay.run_cycle().await {
        Ok(report) => {
            stats.succeeded.fetch_add(1, Ordering::Relaxed);
            tracing::info!(
                tick,
                submitted = report.submitted,
                rejected = report.failures.len(),
                skipped_ticks = stats.skipped(),
                "Cycle complete"
            );
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                tick,
                stage = e.stage(),
                error = %e,
                failed_cycles = stats.failed(),
                "Cycle abandoned"
            );
        }
    }
}

/// Marks a cycle as in flight; clears the mark when dropped.
#[derive(Debug)]
struct CycleGuard {
    running: Arc<AtomicBool>,
}

impl CycleGuard {
    fn try_acquire(running: &Arc<AtomicBool>) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                running: running.clone(),
            })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Handle for controlling the periodic schedule.
///
/// Dropping the handle also stops the schedule.
#[derive(Debug)]
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Whether the timer task is still alive.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop future fires and wait for the timer task to exit.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Scheduler task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::Forwarder;
    use crate::hostname::HostnameCache;
    use crate::testing::{RecordingSink, StaticSource};
    use crate::transform::Transformer;
    use beatrelay_types::{IndexTemplate, Snapshot};

    fn relay(source: Arc<StaticSource>, sink: Arc<RecordingSink>) -> Relay {
        let hostname = Arc::new(HostnameCache::with_resolver(|| Ok("node-1".to_string())));
        Relay::new(
            source,
            Transformer::new(IndexTemplate::parse("metrics-%s").unwrap(), hostname),
            Forwarder::new(sink),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fire_after_interval() {
        let source = Arc::new(StaticSource::new(Snapshot::default()));
        let sink = Arc::new(RecordingSink::new());
        let scheduler = Scheduler::new(relay(source.clone(), sink), Duration::from_secs(1));
        let stats = scheduler.stats();

        let handle = scheduler.start();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(stats.ticks(), 0);
        assert_eq!(source.calls(), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(stats.ticks(), 1);
        assert_eq!(stats.succeeded(), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_ticks_are_skipped() {
        let source = Arc::new(
            StaticSource::new(Snapshot::default()).with_delay(Duration::from_millis(2500)),
        );
        let sink = Arc::new(RecordingSink::new());
        let scheduler = Scheduler::new(relay(source.clone(), sink.clone()), Duration::from_secs(1));
        let stats = scheduler.stats();

        let handle = scheduler.start();
        tokio::time::sleep(Duration::from_millis(10_500)).await;

        // Cycles start at 1s, 4s, 7s and 10s; each runs 2.5s.
        assert_eq!(stats.ticks(), 10);
        assert_eq!(stats.started(), 4);
        assert_eq!(stats.skipped(), 6);
        assert_eq!(stats.succeeded(), 3);
        assert_eq!(source.max_in_flight(), 1);
        assert_eq!(sink.batches().len(), 3);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_does_not_stop_schedule() {
        let source = Arc::new(StaticSource::new(Snapshot::default()));
        source.set_failing(true);
        let sink = Arc::new(RecordingSink::new());
        let scheduler = Scheduler::new(relay(source.clone(), sink.clone()), Duration::from_secs(1));
        let stats = scheduler.stats();

        let handle = scheduler.start();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(stats.failed(), 1);
        assert_eq!(sink.calls(), 0);

        source.set_failing(false);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(stats.ticks(), 2);
        assert_eq!(stats.succeeded(), 1);
        assert_eq!(sink.calls(), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_fires() {
        let source = Arc::new(StaticSource::new(Snapshot::default()));
        let sink = Arc::new(RecordingSink::new());
        let scheduler = Scheduler::new(relay(source, sink), Duration::from_secs(1));
        let stats = scheduler.stats();

        let handle = scheduler.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.stop().await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(stats.ticks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_interval_disables_schedule() {
        let source = Arc::new(StaticSource::new(Snapshot::default()));
        let sink = Arc::new(RecordingSink::new());
        let scheduler = Scheduler::new(relay(source.clone(), sink), Duration::MAX);
        let stats = scheduler.stats();

        let handle = scheduler.start();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(!handle.is_running());
        assert_eq!(stats.ticks(), 0);
        assert_eq!(source.calls(), 0);
        handle.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_longest_allowed_interval_schedules() {
        let source = Arc::new(StaticSource::new(Snapshot::default()));
        let sink = Arc::new(RecordingSink::new());
        let interval = Duration::from_secs(crate::config::MAX_INTERVAL_SECS);
        let scheduler = Scheduler::new(relay(source, sink), interval);
        let stats = scheduler.stats();

        let handle = scheduler.start();
        tokio::time::sleep(interval + Duration::from_secs(1)).await;

        assert!(handle.is_running());
        assert_eq!(stats.ticks(), 1);
        handle.stop().await;
    }

    #[test]
    fn test_cycle_guard_is_exclusive() {
        let running = Arc::new(AtomicBool::new(false));

        let first = CycleGuard::try_acquire(&running);
        assert!(first.is_some());
        assert!(CycleGuard::try_acquire(&running).is_none());

        drop(first);
        assert!(CycleGuard::try_acquire(&running).is_some());
    }
}
