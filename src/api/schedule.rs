use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::{
    api::{error::ApiError, response::ApiResponse, AppState},
    domain::SchedulingProblem,
    optimizer::SolveResult,
};

/// POST /api/v1/schedule/solve - Schedule one problem
///
/// Malformed or oversized problems are rejected with 400, and a 503 is
/// returned while every engine worker is busy. Every solver outcome,
/// including infeasible and invalid models, is a 200 carrying the status.
pub async fn solve_schedule(
    State(state): State<AppState>,
    payload: Result<Json<SchedulingProblem>, JsonRejection>,
) -> Result<ApiResponse<SolveResult>, ApiError> {
    let Json(problem) = payload?;
    state.flattener.admit(&problem)?;
    if state.flattener.is_saturated() {
        return Err(ApiError::SolverBusy);
    }

    tracing::info!(
        horizon = problem.horizon,
        machines = problem.machine_count,
        "solve requested"
    );

    let flattener = state.flattener.clone();
    let result = tokio::task::spawn_blocking(move || flattener.solve(&problem)).await??;

    Ok(ApiResponse::from(result))
}
