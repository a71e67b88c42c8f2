//! Retry eligibility for failed jobs.
//!
//! Both the immediate path in [`JobStore::report_failure`] and the bulk
//! [`JobStore::sweep_retry_eligible`] go through [`is_retry_eligible`].
//!
//! [`JobStore::report_failure`]: crate::store::JobStore::report_failure
//! [`JobStore::sweep_retry_eligible`]: crate::store::JobStore::sweep_retry_eligible

/// Returns true if a job with `attempts` claims so far may run again.
///
/// Attempts are counted at claim time, so with `<=` a job runs
/// `max_retries + 1` times before it stays failed.
pub fn is_retry_eligible(attempts: u32, max_retries: u32) -> bool {
    attempts <= max_retries
}
