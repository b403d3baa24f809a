use axum::{
    routing::{get, post},
    Router,
};

use super::{health, schedule, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/schedule/solve", post(schedule::solve_schedule))
        .route("/healthz", get(health::healthz))
        .with_state(state)
}
