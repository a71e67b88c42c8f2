//! In-memory job store.
//!
//! The store is the only holder of authoritative job state. Every read hands
//! out a snapshot; every write goes through the transition table in
//! [`JobStatus::can_transition_to`]. One reader/writer lock guards the whole
//! map, so each operation is atomic with respect to every other.

use crate::error::{JobError, JobResult};
use crate::job::{Job, JobId, JobStatus};
use crate::retry::is_retry_eligible;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Result of a claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The caller won the claim; the snapshot reflects the job as `processing`.
    Claimed(Job),
    /// The job does not exist or is not `pending`.
    NotClaimable,
}

impl ClaimOutcome {
    /// Returns the claimed snapshot, if any.
    pub fn into_job(self) -> Option<Job> {
        match self {
            ClaimOutcome::Claimed(job) => Some(job),
            ClaimOutcome::NotClaimable => None,
        }
    }

    /// Returns true if the claim was won.
    pub fn is_claimed(&self) -> bool {
        matches!(self, ClaimOutcome::Claimed(_))
    }
}

/// Verdict returned by [`JobStore::report_failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The job went straight back to `pending` and should be re-offered.
    Retry,
    /// The retry budget is spent; the job stays `failed`.
    Exhausted,
}

/// Number of jobs in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
}

impl StatusCounts {
    /// Total jobs across all statuses.
    pub fn total(&self) -> u64 {
        self.pending + self.processing + self.completed + self.failed
    }

    fn bump(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Processing => self.processing += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }
}

struct Entry {
    /// Insertion sequence, breaks `created_at` ties.
    seq: u64,
    job: Job,
}

#[derive(Default)]
struct StoreInner {
    jobs: HashMap<JobId, Entry>,
    next_seq: u64,
}

impl StoreInner {
    fn entry_mut(&mut self, id: &JobId) -> JobResult<&mut Job> {
        self.jobs
            .get_mut(id)
            .map(|entry| &mut entry.job)
            .ok_or_else(|| JobError::NotFound(id.clone()))
    }

    fn snapshot_where(&self, keep: impl Fn(&Job) -> bool) -> Vec<Job> {
        let mut entries: Vec<&Entry> = self.jobs.values().filter(|e| keep(&e.job)).collect();
        entries.sort_by(|a, b| {
            a.job
                .created_at
                .cmp(&b.job.created_at)
                .then(a.seq.cmp(&b.seq))
        });
        entries.into_iter().map(|e| e.job.clone()).collect()
    }
}

/// Authoritative map of job ID to job record.
#[derive(Default)]
pub struct JobStore {
    inner: RwLock<StoreInner>,
}

impl JobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job keyed by its ID.
    ///
    /// A second insert with the same ID replaces the first.
    pub fn create(&self, job: Job, cancel: &CancellationToken) -> JobResult<()> {
        if cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let mut inner = self.inner.write();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.jobs.insert(job.id.clone(), Entry { seq, job });
        Ok(())
    }

    /// Get a snapshot of a single job.
    pub fn get(&self, id: &JobId) -> Option<Job> {
        self.inner.read().jobs.get(id).map(|e| e.job.clone())
    }

    /// Snapshot of all jobs, oldest first.
    pub fn list(&self) -> Vec<Job> {
        self.inner.read().snapshot_where(|_| true)
    }

    /// Snapshot of pending jobs, oldest first.
    pub fn list_pending(&self) -> Vec<Job> {
        self.inner
            .read()
            .snapshot_where(|job| job.status == JobStatus::Pending)
    }

    /// Snapshot of failed jobs, oldest first.
    pub fn list_failed(&self) -> Vec<Job> {
        self.inner
            .read()
            .snapshot_where(|job| job.status == JobStatus::Failed)
    }

    /// Number of jobs held.
    pub fn len(&self) -> usize {
        self.inner.read().jobs.len()
    }

    /// Returns true if the store holds no jobs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count jobs per status under a single lock acquisition.
    pub fn status_counts(&self) -> StatusCounts {
        let inner = self.inner.read();
        let mut counts = StatusCounts::default();
        for entry in inner.jobs.values() {
            counts.bump(entry.job.status);
        }
        counts
    }

    /// Atomically move a pending job to processing.
    ///
    /// This is the only place a job enters `processing`, and the only place
    /// `attempts` grows. Of any number of concurrent callers for one ID, at
    /// most one observes [`ClaimOutcome::Claimed`].
    pub fn claim(&self, id: &JobId) -> ClaimOutcome {
        let mut inner = self.inner.write();
        let Some(entry) = inner.jobs.get_mut(id) else {
            return ClaimOutcome::NotClaimable;
        };

        // Only pending jobs may enter processing.
        if entry.job.transition(JobStatus::Processing).is_err() {
            return ClaimOutcome::NotClaimable;
        }
        entry.job.attempts = entry.job.attempts.saturating_add(1);
        ClaimOutcome::Claimed(entry.job.clone())
    }

    /// Mark a processing job as completed.
    pub fn report_success(&self, id: &JobId) -> JobResult<()> {
        let mut inner = self.inner.write();
        inner.entry_mut(id)?.transition(JobStatus::Completed)
    }

    /// Mark a processing job as failed and decide whether it runs again.
    ///
    /// On [`FailureOutcome::Retry`] the job has already been moved back to
    /// `pending` inside the same critical section.
    pub fn report_failure(
        &self,
        id: &JobId,
        reason: impl Into<String>,
    ) -> JobResult<FailureOutcome> {
        let mut inner = self.inner.write();
        let job = inner.entry_mut(id)?;

        job.transition(JobStatus::Failed)?;
        job.last_error = Some(reason.into());

        if is_retry_eligible(job.attempts, job.max_retries) {
            job.transition(JobStatus::Pending)?;
            Ok(FailureOutcome::Retry)
        } else {
            Ok(FailureOutcome::Exhausted)
        }
    }

    /// Move every retry-eligible failed job back to pending.
    ///
    /// Returns how many jobs moved.
    pub fn sweep_retry_eligible(&self, cancel: &CancellationToken) -> JobResult<usize> {
        if cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let mut inner = self.inner.write();
        let mut recovered = 0;
        for entry in inner.jobs.values_mut() {
            let job = &mut entry.job;
            if job.status == JobStatus::Failed && is_retry_eligible(job.attempts, job.max_retries) {
                job.transition(JobStatus::Pending)?;
                recovered += 1;
            }
        }

        if recovered > 0 {
            debug!(recovered, "Recovered retry-eligible failed jobs");
        }
        Ok(recovered)
    }
}
