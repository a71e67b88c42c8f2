//! Common test infrastructure for pipeline integration tests.

#![allow(dead_code)]

use conveyor_jobs::{JobService, JobsConfig, MetricsSnapshot, StatusCounts};
use std::time::Duration;

/// Upper bound for any single wait in these tests.
pub const WAIT_LIMIT: Duration = Duration::from_secs(10);

/// Builds a config tuned for fast tests.
pub fn fast_config() -> JobsConfig {
    let mut config = JobsConfig::default();
    config.queue.capacity = 16;
    config.worker.concurrency = 2;
    config.worker.workload_latency_ms = 5;
    config.worker.shutdown_timeout_secs = 1;
    config.sweeper.interval_ms = 25;
    config
}

/// Polls `condition` until it holds or [`WAIT_LIMIT`] elapses.
pub async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Waits until no job is pending or processing.
pub async fn wait_for_quiescence(service: &JobService) {
    wait_until("quiescence", || {
        let counts = service.status_counts();
        counts.pending == 0 && counts.processing == 0
    })
    .await;
}

/// Asserts the ledger agrees with the store.
pub fn assert_ledger_matches_store(metrics: MetricsSnapshot, counts: StatusCounts) {
    assert_eq!(
        metrics.jobs_in_progress, counts.processing,
        "jobs_in_progress must equal processing jobs"
    );
    assert_eq!(
        metrics.jobs_failed, counts.failed,
        "jobs_failed must equal failed jobs"
    );
    assert_eq!(metrics.total_jobs_created, counts.total());
}

