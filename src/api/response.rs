use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::optimizer::SolveResult;

/// JSON envelope around a successful payload
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SolveMetadata>,
}

/// Which engine answered and how long it took
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolveMetadata {
    pub solver: String,
    pub elapsed_ms: u64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: SolveMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl From<SolveResult> for ApiResponse<SolveResult> {
    fn from(result: SolveResult) -> Self {
        let metadata = SolveMetadata {
            solver: result.solver.clone(),
            elapsed_ms: result.elapsed_ms,
        };
        Self::ok(result).with_metadata(metadata)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
