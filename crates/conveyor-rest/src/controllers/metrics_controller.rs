//! Metrics controller.

use crate::responses::{ok, ApiResult};
use crate::state::AppState;
use axum::{extract::State, routing::get, Router};
use conveyor_jobs::{MetricsSnapshot, QueueStats, StatusCounts};
use serde::{Deserialize, Serialize};

/// Create the metrics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(read_metrics))
}

/// Ledger counters plus live store and queue figures.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
    pub jobs_by_status: StatusCounts,
    pub queue: QueueStats,
}

/// Read the current counters.
pub async fn read_metrics(State(state): State<AppState>) -> ApiResult<MetricsResponse> {
    let service = &state.job_service;
    ok(MetricsResponse {
        counters: service.read_metrics(),
        jobs_by_status: service.status_counts(),
        queue: service.queue_stats(),
    })
}
