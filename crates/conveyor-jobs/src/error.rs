//! Job error types.

use crate::job::{JobId, JobStatus};
use thiserror::Error;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Job-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The operation referenced an unknown job.
    #[error("Job not found: {0}")]
    NotFound(JobId),

    /// The operation attempted a transition absent from the state machine.
    #[error("Invalid transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    /// The shared cancellation signal fired.
    #[error("Operation was cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl JobError {
    /// Returns true if this error is the expected shutdown signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobError::Cancelled)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidTransition { .. } => 409,
            Self::Cancelled => 503,
            Self::Configuration(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Cancelled => "SHUTTING_DOWN",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cancelled_is_cancelled() {
        assert!(JobError::Cancelled.is_cancelled());
        assert!(!JobError::NotFound(JobId::from("job-123")).is_cancelled());
        let err = JobError::InvalidTransition {
            job_id: JobId::from("job-1"),
            from: JobStatus::Completed,
            to: JobStatus::Processing,
        };
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_error_display_invalid_transition() {
        let err = JobError::InvalidTransition {
            job_id: JobId::from("job-xyz"),
            from: JobStatus::Pending,
            to: JobStatus::Completed,
        };
        let msg = err.to_string();
        assert!(msg.contains("job-xyz"));
        assert!(msg.contains("pending") && msg.contains("completed"));
    }

    #[test]
    fn test_error_display_not_found() {
        let err = JobError::NotFound(JobId::from("missing"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_configuration_error() {
        let err = JobError::Configuration("queue capacity must be > 0".into());
        assert!(!err.is_cancelled());
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(JobError::NotFound(JobId::from("x")).status_code(), 404);
        assert_eq!(JobError::Cancelled.status_code(), 503);
        assert_eq!(JobError::Configuration(String::new()).status_code(), 500);
        let err = JobError::InvalidTransition {
            job_id: JobId::from("x"),
            from: JobStatus::Failed,
            to: JobStatus::Completed,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
    }
}
