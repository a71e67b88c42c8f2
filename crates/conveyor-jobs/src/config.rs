//! Job system configuration.
//!
//! Values arrive already parsed; loading them from files or the environment
//! is the job of the configuration crate.

use crate::error::{JobError, JobResult};
use crate::job::DEFAULT_MAX_RETRIES;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the job system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Queue configuration.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Worker pool configuration.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Sweeper configuration.
    #[serde(default)]
    pub sweeper: SweeperConfig,

    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl JobsConfig {
    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> JobResult<()> {
        if self.queue.capacity == 0 {
            return Err(JobError::Configuration(
                "queue.capacity must be greater than zero".to_string(),
            ));
        }
        if self.worker.concurrency == 0 {
            return Err(JobError::Configuration(
                "worker.concurrency must be greater than zero".to_string(),
            ));
        }
        if self.sweeper.interval_ms == 0 {
            return Err(JobError::Configuration(
                "sweeper.interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of buffered job IDs.
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    100
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent workers.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Latency of the simulated workload in milliseconds.
    #[serde(default = "default_workload_latency")]
    pub workload_latency_ms: u64,

    /// Job type the simulated workload always fails.
    #[serde(default = "default_failing_job_type")]
    pub failing_job_type: String,

    /// How long shutdown waits for workers to drain the queue, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            workload_latency_ms: default_workload_latency(),
            failing_job_type: default_failing_job_type(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_workload_latency() -> u64 {
    1000
}

fn default_failing_job_type() -> String {
    "always_fail".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

impl WorkerConfig {
    /// Returns workload latency as Duration.
    pub fn workload_latency(&self) -> Duration {
        Duration::from_millis(self.workload_latency_ms)
    }

    /// Returns shutdown timeout as Duration.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Sweeper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Interval between sweeps in milliseconds.
    #[serde(default = "default_sweep_interval")]
    pub interval_ms: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_sweep_interval(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    5000
}

impl SweeperConfig {
    /// Returns the sweep interval as Duration.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retry budget given to jobs created without an explicit one.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = JobsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.queue.capacity, 100);
        assert_eq!(config.worker.concurrency, 4);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.worker.failing_job_type, "always_fail");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = JobsConfig::default();
        config.queue.capacity = 0;
        assert!(matches!(config.validate(), Err(JobError::Configuration(_))));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = JobsConfig::default();
        config.worker.concurrency = 0;
        assert!(matches!(config.validate(), Err(JobError::Configuration(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = JobsConfig::default();
        config.sweeper.interval_ms = 0;
        assert!(matches!(config.validate(), Err(JobError::Configuration(_))));
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: JobsConfig =
            serde_json::from_str(r#"{"queue": {"capacity": 8}, "worker": {"concurrency": 2}}"#)
                .unwrap();
        assert_eq!(config.queue.capacity, 8);
        assert_eq!(config.worker.concurrency, 2);
        assert_eq!(config.worker.workload_latency(), Duration::from_millis(1000));
        assert_eq!(config.sweeper.interval(), Duration::from_secs(5));
    }
}
