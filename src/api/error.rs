use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::ProblemError;

/// Failures a handler reports instead of a [`SolveResult`](crate::optimizer::SolveResult)
///
/// Solver outcomes such as INFEASIBLE are never errors here; they travel
/// inside the result with a 200.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Invalid problem: {0}")]
    InvalidProblem(#[from] ProblemError),

    #[error("All solver workers are busy, retry later")]
    SolverBusy,

    #[error("Solver task failed: {0}")]
    SolverTask(#[from] tokio::task::JoinError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedBody(_) | ApiError::InvalidProblem(_) => StatusCode::BAD_REQUEST,
            ApiError::SolverBusy => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::SolverTask(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::MalformedBody(_) => "MalformedBody",
            ApiError::InvalidProblem(_) => "InvalidProblem",
            ApiError::SolverBusy => "SolverBusy",
            ApiError::SolverTask(_) => "SolverTask",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::SolverTask(_) => {
                tracing::error!(error = %self, "request failed");
                "the solver could not complete the request".to_string()
            }
            ApiError::SolverBusy => {
                tracing::warn!("request turned away, solver saturated");
                self.to_string()
            }
            _ => {
                tracing::debug!(error = %self, "request rejected");
                self.to_string()
            }
        };

        let body = ErrorBody {
            error: self.kind(),
            message,
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}
