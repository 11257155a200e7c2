use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::report::pipeline::PipelineError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Pipeline(e) => pipeline_status(e),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Client mistakes map to 400; every stage failure maps to 500 and is logged with
/// the stage that failed. The message is shown to the caller as-is.
fn pipeline_status(err: &PipelineError) -> (StatusCode, &'static str, String) {
    let (status, code) = match err {
        PipelineError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        PipelineError::NotFound(_) => (StatusCode::BAD_REQUEST, "NO_CONTEXT"),
        PipelineError::Retrieval(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RETRIEVAL_ERROR"),
        PipelineError::Generation { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "GENERATION_ERROR"),
        PipelineError::Parse { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "PARSE_ERROR"),
        PipelineError::Schema { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "SCHEMA_VALIDATION_ERROR")
        }
        PipelineError::Serialize { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };

    if status.is_server_error() {
        let stage = err.stage().map(|s| s.to_string()).unwrap_or_default();
        tracing::error!(%stage, "{code}: {err}");
    }
    (status, code, err.to_string())
}
