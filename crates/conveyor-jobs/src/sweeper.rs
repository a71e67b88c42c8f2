//! Periodic retry and requeue driver.
//!
//! Each tick flips retry-eligible failed jobs back to pending, then offers
//! every pending job to the queue. Offers that do not fit are simply tried
//! again on the next tick, so a full queue delays work but never loses it.

use crate::job::Job;
use crate::metrics::MetricsLedger;
use crate::queue::{JobQueue, Offer};
use crate::store::JobStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Outcome of a single sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Failed jobs moved back to pending.
    pub recovered: usize,

    /// Pending IDs accepted by the queue.
    pub offered: usize,

    /// Pending IDs dropped because the queue was full.
    pub dropped: usize,

    /// The sweep stopped early (cancellation or closed queue).
    pub interrupted: bool,
}

/// Single background driver that keeps pending work flowing.
pub struct Sweeper {
    store: Arc<JobStore>,
    queue: Arc<JobQueue>,
    metrics: Arc<MetricsLedger>,
    interval: Duration,
}

impl Sweeper {
    /// Create a new sweeper.
    pub fn new(
        store: Arc<JobStore>,
        queue: Arc<JobQueue>,
        metrics: Arc<MetricsLedger>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            queue,
            metrics,
            interval,
        }
    }

    /// Sweep every interval until `cancel` fires.
    ///
    /// The first sweep happens one full interval after start.
    pub async fn run(self, cancel: CancellationToken) {
        info!(interval_ms = self.interval.as_millis() as u64, "Starting sweeper");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.sweep_once(&cancel);
                    if report.recovered > 0 || report.offered > 0 || report.dropped > 0 {
                        debug!(
                            recovered = report.recovered,
                            offered = report.offered,
                            dropped = report.dropped,
                            "Sweep finished"
                        );
                    }
                }
            }
        }
    }

    /// Perform one sweep.
    pub fn sweep_once(&self, cancel: &CancellationToken) -> SweepReport {
        let mut report = SweepReport::default();

        match self.store.sweep_retry_eligible(cancel) {
            Ok(recovered) => {
                for _ in 0..recovered {
                    self.metrics.increment_retried();
                }
                report.recovered = recovered;
            }
            Err(e) if e.is_cancelled() => {
                report.interrupted = true;
                return report;
            }
            Err(e) => {
                error!(error = %e, "Failed to recover retry-eligible jobs, skipping sweep");
                report.interrupted = true;
                return report;
            }
        }

        self.offer_pending(self.store.list_pending(), cancel, &mut report);
        report
    }

    /// Offer `pending` to the queue in order, stopping at cancellation or a
    /// closed queue.
    fn offer_pending(
        &self,
        pending: Vec<Job>,
        cancel: &CancellationToken,
        report: &mut SweepReport,
    ) {
        for job in pending {
            if cancel.is_cancelled() {
                report.interrupted = true;
                break;
            }

            match self.queue.offer(job.id.clone()) {
                Offer::Accepted => report.offered += 1,
                Offer::Full => {
                    debug!(job_id = %job.id, "Queue full, job stays pending until next sweep");
                    report.dropped += 1;
                }
                Offer::Closed => {
                    debug!("Queue closed, ending sweep");
                    report.interrupted = true;
                    break;
                }
            }
        }
    }
}
