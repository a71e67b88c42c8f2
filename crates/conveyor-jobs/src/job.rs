//! Job record and status definitions.

use crate::error::{JobError, JobResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default number of retries granted to a job.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Unique job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Creates a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates a job ID from a string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the job ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job status enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting to be claimed.
    #[default]
    Pending,
    /// Job has been claimed by a worker.
    Processing,
    /// Job completed successfully.
    Completed,
    /// Job failed and is not (yet) scheduled for another attempt.
    Failed,
}

impl JobStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Pending,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Failed,
    ];

    /// The transition table. Anything not listed here is rejected.
    pub fn can_transition_to(self, to: JobStatus) -> bool {
        matches!(
            (self, to),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
                | (JobStatus::Failed, JobStatus::Pending)
        )
    }

    /// Returns the lowercase name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of work.
///
/// Values handed out by the store are snapshots; changing one has no effect
/// on the store's copy. Status only moves through [`JobStatus::can_transition_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Job ID.
    pub id: JobId,

    /// Job type tag, selects processing behavior.
    pub job_type: String,

    /// Current status.
    pub status: JobStatus,

    /// Opaque payload bytes.
    pub payload: Vec<u8>,

    /// Number of successful claims so far.
    pub attempts: u32,

    /// Retry budget, fixed at creation.
    pub max_retries: u32,

    /// Reason recorded by the most recent failure.
    pub last_error: Option<String>,

    /// When the job was created.
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Creates a new pending job with the default retry budget.
    pub fn new(job_type: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id: JobId::new(),
            job_type: job_type.into(),
            status: JobStatus::Pending,
            payload: payload.into(),
            attempts: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            last_error: None,
            created_at: Utc::now(),
        }
    }

    /// Overrides the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Overrides the job ID.
    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = id;
        self
    }

    /// Moves the job to `to` if the transition table allows it.
    pub(crate) fn transition(&mut self, to: JobStatus) -> JobResult<()> {
        if !self.status.can_transition_to(to) {
            return Err(JobError::InvalidTransition {
                job_id: self.id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
