//! Conveyor Jobs - In-Process Job Processing Core
//!
//! An in-memory job system with:
//! - An authoritative job store enforcing a closed state machine
//! - A bounded, non-blocking queue of job IDs
//! - A fixed pool of workers claiming jobs atomically
//! - A periodic sweeper that retries failed jobs and requeues pending ones
//! - A metrics ledger mirroring store transitions
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Conveyor Jobs Architecture                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                               │
//! │  create(type, payload)                                        │
//! │     │                                                         │
//! │     ├──────────────► ┌──────────────┐ ◄──── claim / report ─┐ │
//! │     │                │   JobStore   │                       │ │
//! │     │   ┌──────────► └──────────────┘                       │ │
//! │     │   │ sweep + list_pending                              │ │
//! │     │ ┌─┴───────┐                                           │ │
//! │     │ │ Sweeper │                                           │ │
//! │     │ └─┬───────┘                                           │ │
//! │     ▼   ▼ offer (non-blocking)                              │ │
//! │  ┌─────────────────────────────┐     ┌──────────────────┐   │ │
//! │  │   JobQueue (bounded IDs)    │ ──► │   Worker Pool    │ ──┘ │
//! │  └─────────────────────────────┘     │ W1  W2  ...  WN  │     │
//! │                ▲     retry offer     └────────┬─────────┘     │
//! │                └──────────────────────────────┘               │
//! │                                               │               │
//! │                                               ▼               │
//! │                                      ┌──────────────────┐     │
//! │                                      │  MetricsLedger   │     │
//! │                                      └──────────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use conveyor_jobs::{JobService, JobsConfig};
//!
//! let service = JobService::new(JobsConfig::default())?;
//! service.start()?;
//!
//! let job = service.create("send_email", br#"{"to":"user@example.com"}"#.to_vec())?;
//! println!("created {}", job.id);
//!
//! println!("{:?}", service.read_metrics());
//! service.shutdown().await;
//! ```

pub mod config;
pub mod error;
pub mod job;
pub mod metrics;
pub mod queue;
pub mod retry;
pub mod service;
pub mod store;
pub mod sweeper;
pub mod worker;

pub use config::{JobsConfig, QueueConfig, RetryConfig, SweeperConfig, WorkerConfig};
pub use error::{JobError, JobResult};
pub use job::{Job, JobId, JobStatus, DEFAULT_MAX_RETRIES};
pub use metrics::{register_metrics, MetricsLedger, MetricsSnapshot};
pub use queue::{JobQueue, Offer, QueueStats};
pub use retry::is_retry_eligible;
pub use service::JobService;
pub use store::{ClaimOutcome, FailureOutcome, JobStore, StatusCounts};
pub use sweeper::{SweepReport, Sweeper};
pub use worker::{JobExecutor, ProcessOutcome, SimulatedExecutor, Worker, WorkerPool};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::job::{Job, JobId, JobStatus};
    pub use crate::service::JobService;
    pub use crate::worker::JobExecutor;
    pub use crate::{JobError, JobResult};
}
