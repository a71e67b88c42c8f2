//! Job service: the facade handed to the transport layer.
//!
//! Owns the store, queue and ledger, starts the worker pool and sweeper, and
//! runs the shutdown sequence:
//!
//! 1. stop accepting creations,
//! 2. cancel the sweeper and wait for it,
//! 3. close the queue,
//! 4. let workers drain what is buffered, cancelling them if that takes
//!    longer than the configured shutdown timeout.

use crate::config::JobsConfig;
use crate::error::{JobError, JobResult};
use crate::job::{Job, JobId};
use crate::metrics::{MetricsLedger, MetricsSnapshot};
use crate::queue::{JobQueue, Offer, QueueStats};
use crate::store::{JobStore, StatusCounts};
use crate::sweeper::Sweeper;
use crate::worker::{JobExecutor, SimulatedExecutor, WorkerPool};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct RunningTasks {
    sweeper: JoinHandle<()>,
    workers: JoinSet<()>,
}

/// In-process job service.
pub struct JobService {
    store: Arc<JobStore>,
    queue: Arc<JobQueue>,
    metrics: Arc<MetricsLedger>,
    executor: Arc<dyn JobExecutor>,
    config: JobsConfig,

    /// Fires when creations must stop.
    accepting: CancellationToken,
    /// Parent of the sweeper and worker tokens.
    shutdown: CancellationToken,
    sweeper_cancel: CancellationToken,
    worker_cancel: CancellationToken,

    tasks: Mutex<Option<RunningTasks>>,
}

impl JobService {
    /// Create a service running the simulated workload.
    pub fn new(config: JobsConfig) -> JobResult<Self> {
        let executor = Arc::new(SimulatedExecutor::new(
            config.worker.workload_latency(),
            config.worker.failing_job_type.clone(),
        ));
        Self::with_executor(config, executor)
    }

    /// Create a service with a custom executor.
    pub fn with_executor(config: JobsConfig, executor: Arc<dyn JobExecutor>) -> JobResult<Self> {
        config.validate()?;

        let shutdown = CancellationToken::new();
        Ok(Self {
            store: Arc::new(JobStore::new()),
            queue: Arc::new(JobQueue::new(config.queue.capacity)),
            metrics: Arc::new(MetricsLedger::new()),
            executor,
            accepting: CancellationToken::new(),
            sweeper_cancel: shutdown.child_token(),
            worker_cancel: shutdown.child_token(),
            shutdown,
            config,
            tasks: Mutex::new(None),
        })
    }

    /// Spawn the worker pool and the sweeper on the current runtime.
    pub fn start(&self) -> JobResult<()> {
        let mut tasks = self.tasks.lock();
        if tasks.is_some() {
            return Err(JobError::Configuration(
                "Job service already running".to_string(),
            ));
        }
        if self.shutdown.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let pool = WorkerPool::new(
            self.store.clone(),
            self.queue.clone(),
            self.metrics.clone(),
            self.executor.clone(),
            self.config.worker.concurrency,
        );
        let workers = pool.spawn(self.worker_cancel.clone());

        let sweeper = Sweeper::new(
            self.store.clone(),
            self.queue.clone(),
            self.metrics.clone(),
            self.config.sweeper.interval(),
        );
        let sweeper = tokio::spawn(sweeper.run(self.sweeper_cancel.clone()));

        *tasks = Some(RunningTasks { sweeper, workers });
        info!(
            concurrency = self.config.worker.concurrency,
            queue_capacity = self.config.queue.capacity,
            sweep_interval_ms = self.config.sweeper.interval_ms,
            "Job service started"
        );
        Ok(())
    }

    /// Create a job with the configured default retry budget.
    pub fn create(
        &self,
        job_type: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> JobResult<Job> {
        self.create_with_retries(job_type, payload, self.config.retry.max_retries)
    }

    /// Create a job with an explicit retry budget.
    ///
    /// The job is stored first, then offered to the queue without waiting. A
    /// dropped offer is picked up by the next sweep.
    pub fn create_with_retries(
        &self,
        job_type: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        max_retries: u32,
    ) -> JobResult<Job> {
        let job = Job::new(job_type, payload).with_max_retries(max_retries);

        self.store.create(job.clone(), &self.accepting)?;
        self.metrics.increment_created();

        match self.queue.offer(job.id.clone()) {
            Offer::Accepted => {}
            Offer::Full => debug!(job_id = %job.id, "Queue full, job left for the sweeper"),
            Offer::Closed => debug!(job_id = %job.id, "Queue closed, job left pending"),
        }

        debug!(job_id = %job.id, job_type = %job.job_type, "Job created");
        Ok(job)
    }

    /// All jobs, oldest first.
    pub fn list(&self) -> Vec<Job> {
        self.store.list()
    }

    /// A single job.
    pub fn get(&self, id: &JobId) -> JobResult<Job> {
        self.store
            .get(id)
            .ok_or_else(|| JobError::NotFound(id.clone()))
    }

    /// Current counters.
    pub fn read_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Jobs per status.
    pub fn status_counts(&self) -> StatusCounts {
        self.store.status_counts()
    }

    /// Queue statistics.
    pub fn queue_stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Whether the service still accepts creations.
    pub fn is_accepting(&self) -> bool {
        !self.accepting.is_cancelled()
    }

    /// Whether workers and sweeper are running.
    pub fn is_running(&self) -> bool {
        self.tasks.lock().is_some()
    }

    /// Shared store.
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    /// Shared queue.
    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    /// Stop the service in order. Safe to call more than once.
    pub async fn shutdown(&self) {
        info!("Shutting down job service...");
        self.accepting.cancel();

        let tasks = self.tasks.lock().take();

        self.sweeper_cancel.cancel();
        let mut workers = match tasks {
            Some(RunningTasks { sweeper, workers }) => {
                if let Err(e) = sweeper.await {
                    warn!(error = %e, "Sweeper task ended abnormally");
                }
                Some(workers)
            }
            None => None,
        };

        self.queue.close();

        if let Some(workers) = workers.as_mut() {
            let grace = self.config.worker.shutdown_timeout();
            if timeout(grace, join_all(workers)).await.is_err() {
                warn!(
                    timeout_secs = grace.as_secs(),
                    "Workers did not drain in time, cancelling"
                );
                self.worker_cancel.cancel();
                join_all(workers).await;
            }
        }

        self.shutdown.cancel();

        let counts = self.store.status_counts();
        info!(
            pending = counts.pending,
            processing = counts.processing,
            completed = counts.completed,
            failed = counts.failed,
            "Job service stopped"
        );
    }
}

async fn join_all(workers: &mut JoinSet<()>) {
    while let Some(res) = workers.join_next().await {
        if let Err(e) = res {
            warn!(error = %e, "Worker task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JobsConfig {
        let mut config = JobsConfig::default();
        config.queue.capacity = 4;
        config.worker.concurrency = 2;
        config.worker.workload_latency_ms = 1;
        config.sweeper.interval_ms = 20;
        config
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.queue.capacity = 0;
        assert!(matches!(JobService::new(config), Err(JobError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_create_without_start_stays_pending() {
        let service = JobService::new(config()).unwrap();
        let job = service.create("email", b"{}".to_vec()).unwrap();

        assert_eq!(service.list(), vec![job.clone()]);
        assert_eq!(service.get(&job.id).unwrap().max_retries, 3);
        assert_eq!(service.read_metrics().total_jobs_created, 1);
        assert_eq!(service.queue_stats().buffered, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let service = JobService::new(config()).unwrap();
        let id = JobId::from("nope");
        assert_eq!(service.get(&id), Err(JobError::NotFound(id)));
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let service = JobService::new(config()).unwrap();
        service.start().unwrap();
        assert!(service.is_running());
        assert!(service.start().is_err());
        service.shutdown().await;
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_create_after_shutdown_is_cancelled() {
        let service = JobService::new(config()).unwrap();
        service.start().unwrap();
        service.shutdown().await;

        assert!(!service.is_accepting());
        assert_eq!(service.create("email", Vec::new()), Err(JobError::Cancelled));
        assert_eq!(service.read_metrics().total_jobs_created, 0);
        assert!(service.start().is_err());
    }

    #[tokio::test]
    async fn test_shutdown_without_start() {
        let service = JobService::new(config()).unwrap();
        service.shutdown().await;
        service.shutdown().await;
        assert!(!service.queue().is_open());
    }
}
