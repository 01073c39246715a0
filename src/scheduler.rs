//! Fixed-interval scheduler
//!
//! Runs the job immediately, then sleeps `interval` after each completion.
//! There is no persisted last-run time: a restart runs straight away.
//! Shutdown is only observed while idle; a running job always finishes.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

/// Recurring job runner.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    interval: Duration,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run `job` forever, or until `shutdown` resolves between runs.
    ///
    /// Returns the number of completed runs.
    pub async fn run<F, Fut, S>(&self, mut job: F, shutdown: S) -> u64
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut completed = 0u64;

        loop {
            job().await;
            completed += 1;

            let next_run = chrono::Duration::from_std(self.interval)
                .ok()
                .and_then(|d| Utc::now().checked_add_signed(d));
            info!(
                cycles = completed,
                sleep_secs = self.interval.as_secs(),
                next_run = ?next_run.map(|t| t.to_rfc3339()),
                "Cycle complete, sleeping"
            );

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    info!(cycles = completed, "Shutdown requested, scheduler stopping");
                    return completed;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_first_run_is_immediate() {
        let runs = Arc::new(AtomicU64::new(0));
        let scheduler = Scheduler::new(Duration::from_secs(3600));

        let counter = runs.clone();
        let completed = tokio::time::timeout(
            Duration::from_secs(5),
            scheduler.run(
                move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                },
                std::future::ready(()),
            ),
        )
        .await
        .expect("scheduler should stop without waiting an interval");

        assert_eq!(completed, 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_repeats_until_shutdown() {
        let runs = Arc::new(AtomicU64::new(0));
        let stop = Arc::new(Notify::new());
        let scheduler = Scheduler::new(Duration::from_millis(10));

        let counter = runs.clone();
        let trigger = stop.clone();
        let completed = scheduler
            .run(
                move || {
                    let counter = counter.clone();
                    let trigger = trigger.clone();
                    async move {
                        if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                            trigger.notify_one();
                        }
                    }
                },
                stop.notified(),
            )
            .await;

        assert_eq!(completed, 3);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_are_one_interval_apart() {
        let interval = Duration::from_secs(30 * 24 * 60 * 60);
        let started = Instant::now();
        let runs = Arc::new(Mutex::new(Vec::new()));
        let scheduler = Scheduler::new(interval);

        let log = runs.clone();
        let handle = tokio::spawn(async move {
            scheduler
                .run(
                    move || {
                        log.lock().unwrap().push(Instant::now());
                        async {}
                    },
                    std::future::pending::<()>(),
                )
                .await
        });

        tokio::time::sleep(interval - Duration::from_secs(1)).await;
        assert_eq!(runs.lock().unwrap().len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        {
            let runs = runs.lock().unwrap();
            assert_eq!(runs.len(), 2);
            assert_eq!(runs[0], started);
            assert_eq!(runs[1] - runs[0], interval);
        }

        handle.abort();
    }
}
