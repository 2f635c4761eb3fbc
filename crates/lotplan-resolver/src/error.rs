//! Error types for the resolver service

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Failure querying one state ArcGIS layer
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned {status}")]
    Status { status: u16 },

    #[error("Upstream reported an error: {0}")]
    Service(String),

    #[error("Upstream response was not GeoJSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors surfaced to HTTP callers
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Too many queries: {count} (limit {limit})")]
    TooManyQueries { count: usize, limit: usize },
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::TooManyQueries { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        };
        tracing::warn!(status = status.as_u16(), error = %self, "Rejected request");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
