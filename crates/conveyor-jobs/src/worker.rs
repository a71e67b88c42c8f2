//! Worker pool for processing jobs.

use crate::job::{Job, JobId};
use crate::metrics::MetricsLedger;
use crate::queue::{JobQueue, Offer};
use crate::store::{ClaimOutcome, FailureOutcome, JobStore};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Executes the body of a claimed job.
///
/// Returning `Err` reports the job as failed with the given reason.
/// Implementations do not need to watch for cancellation; the worker races
/// the returned future against its cancellation token and drops it on
/// shutdown.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, job: &Job) -> Result<(), String>;
}

/// Placeholder workload: sleeps for a fixed latency, then succeeds unless
/// the job type is the designated failing type.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    latency: Duration,
    failing_job_type: String,
}

impl SimulatedExecutor {
    pub fn new(latency: Duration, failing_job_type: impl Into<String>) -> Self {
        Self {
            latency,
            failing_job_type: failing_job_type.into(),
        }
    }
}

#[async_trait]
impl JobExecutor for SimulatedExecutor {
    async fn execute(&self, job: &Job) -> Result<(), String> {
        tokio::time::sleep(self.latency).await;
        if job.job_type == self.failing_job_type {
            return Err(format!("job type '{}' always fails", job.job_type));
        }
        Ok(())
    }
}

/// What happened to one ID pulled off the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Another worker won the claim, or the job was already handled.
    NotClaimable,
    /// The job completed.
    Completed,
    /// The job failed and went back to pending; `requeue` is the result of
    /// re-offering its ID.
    Retrying { requeue: Offer },
    /// The job failed and has no retries left.
    Failed,
    /// Cancellation fired mid-workload; nothing was reported.
    Aborted,
    /// The store rejected the report.
    ReportRejected,
}

/// A single consumer.
#[derive(Clone)]
pub struct Worker {
    id: String,
    store: Arc<JobStore>,
    queue: Arc<JobQueue>,
    metrics: Arc<MetricsLedger>,
    executor: Arc<dyn JobExecutor>,
}

impl Worker {
    /// Create a worker over shared components.
    pub fn new(
        id: impl Into<String>,
        store: Arc<JobStore>,
        queue: Arc<JobQueue>,
        metrics: Arc<MetricsLedger>,
        executor: Arc<dyn JobExecutor>,
    ) -> Self {
        Self {
            id: id.into(),
            store,
            queue,
            metrics,
            executor,
        }
    }

    /// Worker ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Consume IDs until cancelled or until the queue is closed and empty.
    pub async fn run(self, cancel: CancellationToken) {
        debug!(worker_id = %self.id, "Worker started");

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(worker_id = %self.id, "Worker cancelled");
                    break;
                }
                next = self.queue.recv() => next,
            };

            let Some(job_id) = next else {
                debug!(worker_id = %self.id, "Queue closed, worker exiting");
                break;
            };

            if self.process(&job_id, &cancel).await == ProcessOutcome::Aborted {
                break;
            }
        }
    }

    /// Claim, execute and report a single job.
    pub async fn process(&self, job_id: &JobId, cancel: &CancellationToken) -> ProcessOutcome {
        let job = match self.store.claim(job_id) {
            ClaimOutcome::Claimed(job) => job,
            ClaimOutcome::NotClaimable => {
                debug!(job_id = %job_id, worker_id = %self.id, "Job not claimable, skipping");
                return ProcessOutcome::NotClaimable;
            }
        };
        self.metrics.increment_in_progress();

        debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            attempt = job.attempts,
            worker_id = %self.id,
            "Processing job"
        );

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(
                    job_id = %job.id,
                    worker_id = %self.id,
                    "Workload aborted by shutdown, job left processing"
                );
                return ProcessOutcome::Aborted;
            }
            result = self.executor.execute(&job) => result,
        };

        match result {
            Ok(()) => self.complete(&job),
            Err(reason) => self.fail(&job, reason),
        }
    }

    fn complete(&self, job: &Job) -> ProcessOutcome {
        match self.store.report_success(&job.id) {
            Ok(()) => {
                self.metrics.increment_completed();
                debug!(job_id = %job.id, "Job completed successfully");
                ProcessOutcome::Completed
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Failed to mark job as complete");
                ProcessOutcome::ReportRejected
            }
        }
    }

    fn fail(&self, job: &Job, reason: String) -> ProcessOutcome {
        warn!(job_id = %job.id, attempt = job.attempts, error = %reason, "Job execution failed");

        match self.store.report_failure(&job.id, reason) {
            Ok(FailureOutcome::Retry) => {
                self.metrics.record_failure(true);
                let requeue = self.queue.offer(job.id.clone());
                debug!(job_id = %job.id, requeue = ?requeue, "Job scheduled for retry");
                ProcessOutcome::Retrying { requeue }
            }
            Ok(FailureOutcome::Exhausted) => {
                self.metrics.record_failure(false);
                warn!(
                    job_id = %job.id,
                    attempts = job.attempts,
                    max_retries = job.max_retries,
                    "Job exhausted its retries"
                );
                ProcessOutcome::Failed
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "Failed to mark job as failed");
                ProcessOutcome::ReportRejected
            }
        }
    }
}

/// Fixed-size pool of workers sharing one queue.
pub struct WorkerPool {
    /// Unique pool ID.
    id: String,

    store: Arc<JobStore>,
    queue: Arc<JobQueue>,
    metrics: Arc<MetricsLedger>,
    executor: Arc<dyn JobExecutor>,

    /// Number of concurrent workers.
    concurrency: usize,
}

impl WorkerPool {
    /// Create a new worker pool.
    pub fn new(
        store: Arc<JobStore>,
        queue: Arc<JobQueue>,
        metrics: Arc<MetricsLedger>,
        executor: Arc<dyn JobExecutor>,
        concurrency: usize,
    ) -> Self {
        Self {
            id: format!("worker-pool-{}", Uuid::new_v4()),
            store,
            queue,
            metrics,
            executor,
            concurrency,
        }
    }

    /// Get the pool ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Configured number of workers.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Spawn every worker onto the current runtime.
    ///
    /// Workers stop when `cancel` fires, or once the queue is closed and
    /// drained. Joining the returned set waits for all of them.
    pub fn spawn(&self, cancel: CancellationToken) -> JoinSet<()> {
        info!(pool_id = %self.id, concurrency = self.concurrency, "Starting worker pool");

        let mut workers = JoinSet::new();
        for n in 0..self.concurrency {
            let worker = Worker::new(
                format!("{}-{}", self.id, n),
                self.store.clone(),
                self.queue.clone(),
                self.metrics.clone(),
                self.executor.clone(),
            );
            let span = tracing::info_span!("worker", worker_id = %worker.id());
            workers.spawn(worker.run(cancel.clone()).instrument(span));
        }
        workers
    }
}
