// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::ingest::types::NewsProvider;
use crate::service::NewsService;

/// Running poll loop. Dropping the handle detaches the loop; call
/// [`PollerHandle::stop`] for a deterministic shutdown.
pub struct PollerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Signal the loop to stop and wait for it. A fetch in flight is
    /// abandoned; the store is only touched after a fetch completes, so
    /// nothing is left half-applied.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            warn!(target: "ingest", error = %e, "poller task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the poll loop: one cycle right away, then one per `interval`.
///
/// Cycles run one after another in this task; a slow fetch delays the next
/// tick rather than overlapping it.
pub fn spawn_poller(
    service: Arc<NewsService>,
    provider: Arc<dyn NewsProvider>,
    interval: Duration,
) -> PollerHandle {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

    let task = tokio::spawn(async move {
        // `interval` panics on zero
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            target: "ingest",
            provider = provider.name(),
            interval_ms = interval.as_millis() as u64,
            topics = service.topics().len(),
            "poller started"
        );

        loop {
            tokio::select! {
                biased;

                Some(()) = shutdown_rx.recv() => break,

                // first tick completes immediately
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;

                        Some(()) = shutdown_rx.recv() => break,

                        report = crate::ingest::run_once(provider.as_ref(), &service) => {
                            counter!("news_poll_cycles_total").increment(1);
                            info!(
                                target: "ingest",
                                fetched = report.fetched,
                                inserted = report.inserted,
                                malformed = report.malformed,
                                failed = report.error.is_some(),
                                "poll tick"
                            );
                        }
                    }
                }
            }
        }

        info!(target: "ingest", "poller stopped");
    });

    PollerHandle { shutdown_tx, task }
}
