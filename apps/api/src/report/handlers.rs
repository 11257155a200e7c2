//! Axum route handlers for the career report API.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::report::pipeline::{
    analyze_uploaded_resume, generate_report, PipelineError, ReportRequest, ResumeUploadRequest,
};
use crate::report::query::{answer_query, QueryAnswer, QueryRequest};
use crate::report::schema::ResumeAnalysis;
use crate::report::synthesizer::render_markdown;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    #[serde(default)]
    pub format: ReportFormat,
}

#[derive(Debug, Serialize)]
pub struct ResumeAnalysisResponse {
    pub success: bool,
    pub analysis: ResumeAnalysis,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/agents/report
///
/// Runs the full pipeline. Returns the markdown report, or the `CareerReport`
/// aggregate with `?format=json`.
pub async fn handle_generate_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
    Json(request): Json<ReportRequest>,
) -> Result<Response, AppError> {
    let report = generate_report(&state.retriever, state.invoker.as_ref(), request).await?;

    Ok(match params.format {
        ReportFormat::Json => Json(report).into_response(),
        ReportFormat::Markdown => (
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            render_markdown(&report),
        )
            .into_response(),
    })
}

/// POST /api/v1/query
///
/// One retrieval and one free-text answer.
pub async fn handle_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryAnswer>, AppError> {
    let answer = answer_query(&state.retriever, state.invoker.as_ref(), request).await?;
    Ok(Json(answer))
}

/// POST /api/v1/agents/resume
///
/// Resume analysis only, over freshly uploaded text.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    Json(request): Json<ResumeUploadRequest>,
) -> Result<Json<ResumeAnalysisResponse>, AppError> {
    let analysis = analyze_uploaded_resume(&state.retriever, state.invoker.as_ref(), request)
        .await
        .map_err(|e| match e {
            PipelineError::Validation(_) => AppError::Validation("Missing data".to_string()),
            other => AppError::Pipeline(other),
        })?;

    Ok(Json(ResumeAnalysisResponse {
        success: true,
        analysis,
    }))
}
