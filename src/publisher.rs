//! Progress publishing
//!
//! A subscription is a lazy, finite stream of [`JobSnapshot`]s for one media
//! id. It emits the current state on every tick while the job is running,
//! emits the terminal snapshot as soon as the job finishes (without waiting for
//! the next tick), and then ends.
//!
//! Subscriptions only read from the [`JobRegistry`]. Dropping one releases its
//! timer and watch receiver immediately and has no effect on the download.

use crate::registry::JobRegistry;
use crate::types::{JobSnapshot, MediaId};
use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};

/// Hands out per-job progress subscriptions
#[derive(Debug, Clone)]
pub struct ProgressPublisher {
    registry: Arc<JobRegistry>,
    interval: Duration,
}

enum Phase {
    /// Job not registered yet
    Waiting {
        registry: Arc<JobRegistry>,
        id: MediaId,
        interval: Duration,
    },
    Watching {
        rx: watch::Receiver<JobSnapshot>,
        ticker: Interval,
    },
    Done,
}

impl ProgressPublisher {
    /// Create a publisher emitting at most once per `interval` while jobs run
    pub fn new(registry: Arc<JobRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Subscribe to the snapshots of job `id`
    ///
    /// If the job does not exist yet, nothing is emitted until it is created.
    /// Each call yields an independent emission schedule.
    pub fn subscribe(
        &self,
        id: MediaId,
    ) -> impl Stream<Item = JobSnapshot> + Send + 'static + use<> {
        let start = Phase::Waiting {
            registry: self.registry.clone(),
            id,
            interval: self.interval,
        };

        futures::stream::unfold(start, |phase| async move {
            match phase {
                Phase::Waiting {
                    registry,
                    id,
                    interval,
                } => {
                    let rx = registry.wait_for(&id).await;
                    let mut ticker = tokio::time::interval(interval);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    next_emission(rx, ticker).await
                }
                Phase::Watching { rx, ticker } => next_emission(rx, ticker).await,
                Phase::Done => None,
            }
        })
    }
}

async fn next_emission(
    mut rx: watch::Receiver<JobSnapshot>,
    mut ticker: Interval,
) -> Option<(JobSnapshot, Phase)> {
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = rx.borrow_and_update().clone();
                let next = if snapshot.is_terminal() {
                    Phase::Done
                } else {
                    Phase::Watching { rx, ticker }
                };
                return Some((snapshot, next));
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    // writer and registry entry are gone (teardown)
                    let last = rx.borrow().clone();
                    return last.is_terminal().then_some((last, Phase::Done));
                }
                let snapshot = rx.borrow_and_update().clone();
                if snapshot.is_terminal() {
                    return Some((snapshot, Phase::Done));
                }
                // intermediate progress waits for the next tick
            }
        }
    }
}
