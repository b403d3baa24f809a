pub mod error;
pub mod health;
pub mod response;
pub mod schedule;
pub mod v1;

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{config::Config, optimizer::LoadFlattener};

#[derive(Clone)]
pub struct AppState {
    pub flattener: Arc<LoadFlattener>,
}

impl AppState {
    pub fn new(flattener: Arc<LoadFlattener>) -> Self {
        Self { flattener }
    }
}

pub fn router(state: AppState, cfg: &Config) -> Router {
    Router::new()
        .nest("/api/v1", v1::router(state))
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.server.request_timeout_secs))),
        )
        .layer(TraceLayer::new_for_http())
}
