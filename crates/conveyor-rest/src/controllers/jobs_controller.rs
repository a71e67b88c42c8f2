//! Job submission and inspection controller.

use crate::responses::{created, ok, ApiResponse, ApiResult, AppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use conveyor_jobs::{Job, JobId, JobStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Create the jobs router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:job_id", get(get_job))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for job creation.
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    /// Job type tag.
    #[serde(rename = "type")]
    pub job_type: String,
    /// Arbitrary JSON payload, stored as bytes.
    #[serde(default)]
    pub payload: Value,
    /// Retry budget; the configured default when absent.
    pub max_retries: Option<u32>,
}

/// Job as rendered by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: JobStatus,
    pub payload: Value,
    pub attempts: u32,
    pub max_retries: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        let payload = decode_payload(&job.payload);
        Self {
            id: job.id.to_string(),
            job_type: job.job_type,
            status: job.status,
            payload,
            attempts: job.attempts,
            max_retries: job.max_retries,
            last_error: job.last_error,
            created_at: job.created_at,
        }
    }
}

/// Payloads submitted over HTTP are JSON. Anything else is shown as text.
fn decode_payload(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a job.
pub async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<ApiResponse<JobResponse>>), AppError> {
    let job_type = request.job_type.trim();
    if job_type.is_empty() {
        return Err(AppError::Validation("type must not be empty".to_string()));
    }

    let payload = if request.payload.is_null() {
        Vec::new()
    } else {
        serde_json::to_vec(&request.payload)
            .map_err(|e| AppError::Validation(format!("payload is not serializable: {e}")))?
    };

    let service = &state.job_service;
    let job = match request.max_retries {
        Some(max_retries) => service.create_with_retries(job_type, payload, max_retries)?,
        None => service.create(job_type, payload)?,
    };

    info!(job_id = %job.id, job_type = %job.job_type, "Job submitted");
    Ok(created(JobResponse::from(job)))
}

/// List every job, oldest first.
pub async fn list_jobs(State(state): State<AppState>) -> ApiResult<Vec<JobResponse>> {
    let jobs = state
        .job_service
        .list()
        .into_iter()
        .map(JobResponse::from)
        .collect();
    ok(jobs)
}

/// Fetch a single job.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<JobResponse> {
    let job = state.job_service.get(&JobId::from_string(job_id))?;
    ok(JobResponse::from(job))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload() {
        assert_eq!(decode_payload(b""), Value::Null);
        assert_eq!(decode_payload(br#"{"a":1}"#)["a"], 1);
        assert_eq!(decode_payload(b"plain"), Value::String("plain".into()));
    }
}
