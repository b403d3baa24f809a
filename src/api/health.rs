use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    solver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_limit_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    idle_workers: Option<usize>,
    max_cells: usize,
}

/// GET /api/v1/healthz - Liveness and engine info
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        solver: state.flattener.solver_name().to_string(),
        time_limit_secs: state.flattener.params().time_limit.map(|d| d.as_secs()),
        idle_workers: state.flattener.idle_workers(),
        max_cells: state.flattener.max_cells(),
    })
}
