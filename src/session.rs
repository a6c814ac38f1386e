//! Background work owned by the steps screen.
//!
//! Both types abort their tasks on drop, so releasing them on any exit path
//! (stop, shutdown, an early return) never leaks a timer or a subscription.

use chrono::{DateTime, Local};
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

/// Counters of a session that has been stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedSession {
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub steps: u64,
    pub duration: u64,
}

/// A recording in progress: a one-second elapsed ticker plus a subscription
/// to sensor increments.
pub struct LiveSession {
    start_time: DateTime<Local>,
    steps: Arc<AtomicU64>,
    duration: Arc<AtomicU64>,
    ticker: JoinHandle<()>,
    watcher: JoinHandle<()>,
}

impl LiveSession {
    /// `on_steps` runs after each increment has been added to the session.
    pub fn start<F, Fut>(
        start_time: DateTime<Local>,
        mut increments: broadcast::Receiver<u64>,
        on_steps: F,
    ) -> Self
    where
        F: Fn(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let steps = Arc::new(AtomicU64::new(0));
        let duration = Arc::new(AtomicU64::new(0));

        let elapsed = Arc::clone(&duration);
        let ticker = tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                elapsed.fetch_add(1, Ordering::SeqCst);
            }
        });

        let counted = Arc::clone(&steps);
        let watcher = tokio::spawn(async move {
            loop {
                match increments.recv().await {
                    Ok(delta) => {
                        counted.fetch_add(delta, Ordering::SeqCst);
                        on_steps(delta).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "dropped pedometer readings");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self {
            start_time,
            steps,
            duration,
            ticker,
            watcher,
        }
    }

    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::SeqCst)
    }

    pub fn duration(&self) -> u64 {
        self.duration.load(Ordering::SeqCst)
    }

    /// Releases the ticker and the subscription and returns the final counts.
    /// The logged duration is derived from the two timestamps.
    pub fn stop(self, end_time: DateTime<Local>) -> CompletedSession {
        let end_time = end_time.max(self.start_time);
        CompletedSession {
            start_time: self.start_time,
            end_time,
            steps: self.steps(),
            duration: (end_time - self.start_time).num_seconds().max(0) as u64,
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.ticker.abort();
        self.watcher.abort();
    }
}

/// Runs `refresh` on a fixed period until dropped.
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn spawn<F, Fut>(period: Duration, refresh: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                refresh().await;
            }
        });
        Self { handle }
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn ticker_counts_elapsed_seconds() {
        let (_tx, rx) = broadcast::channel(8);
        let session = LiveSession::start(Local::now(), rx, |_| async {});
        time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(session.duration(), 3);

        let started = session.start_time();
        let done = session.stop(started + chrono::Duration::seconds(95));
        assert_eq!(done.duration, 95);
        assert_eq!(done.steps, 0);
    }

    #[tokio::test]
    async fn increments_accumulate_and_notify() {
        let (tx, rx) = broadcast::channel(8);
        let notified = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&notified);
        let session = LiveSession::start(Local::now(), rx, move |delta| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(delta, Ordering::SeqCst);
            }
        });

        tx.send(10).unwrap();
        tx.send(15).unwrap();
        for _ in 0..50 {
            if notified.load(Ordering::SeqCst) == 25 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(session.steps(), 25);
        assert_eq!(notified.load(Ordering::SeqCst), 25);
    }

    #[tokio::test]
    async fn dropping_a_session_releases_the_subscription() {
        let (tx, rx) = broadcast::channel::<u64>(8);
        let session = LiveSession::start(Local::now(), rx, |_| async {});
        assert_eq!(tx.receiver_count(), 1);
        drop(session);
        for _ in 0..50 {
            if tx.receiver_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(tx.receiver_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_runs_until_dropped() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let poller = Poller::spawn(Duration::from_secs(30), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        time::sleep(Duration::from_secs(95)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert!(poller.is_running());

        drop(poller);
        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }
}
