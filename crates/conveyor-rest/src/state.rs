//! Application state for Axum handlers.

use conveyor_jobs::JobService;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub job_service: Arc<JobService>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(job_service: Arc<JobService>) -> Self {
        Self { job_service }
    }
}
