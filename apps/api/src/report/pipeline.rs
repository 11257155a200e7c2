//! Report Pipeline: orchestrates retrieval and the five generation stages.
//!
//! Flow: retrieve → resume analysis → gap analysis → cover letter →
//!       interview prep → strategy plan → synthesize.
//!
//! Stages run strictly in sequence. Each stage's prompt embeds the validated output of
//! the stages before it. The first failure stops the run; no partial report is returned.

use std::fmt;
use std::future::Future;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM, SPECIFICITY_INSTRUCTION};
use crate::llm_client::{LlmError, ModelInvoker, ModelRequest, ModelSettings};
use crate::report::parser::{parse_json_object, ParseError};
use crate::report::prompts::{
    fill_template, COVER_LETTER_MODEL, COVER_LETTER_PROMPT_TEMPLATE, GAP_ANALYSIS_MODEL,
    GAP_ANALYSIS_PROMPT_TEMPLATE, INTERVIEW_PREP_MODEL, INTERVIEW_PREP_PROMPT_TEMPLATE,
    RESUME_ANALYSIS_MODEL, RESUME_ANALYSIS_PROMPT_TEMPLATE, STRATEGY_PLAN_MODEL,
    STRATEGY_PLAN_PROMPT_TEMPLATE, UPLOADED_TEXT_SECTION,
};
use crate::report::schema::{
    CoverLetter, GapAnalysis, InterviewPrep, ResumeAnalysis, StageOutput, StrategyPlan,
};
use crate::report::synthesizer::{synthesize, CareerReport};
use crate::retrieval::{join_context, ContextRetriever, OwnerFilter, RetrievalError};

/// Chunks of resume context fed to the report.
pub const REPORT_MAX_CHUNKS: usize = 12;
pub const DEFAULT_TARGET_COMPANY: &str = "OpenAI";
pub const DEFAULT_TARGET_ROLE: &str = "APM";
const EMPTY_CONTEXT: &str = "(no retrieved chunks)";

// ────────────────────────────────────────────────────────────────────────────
// Stages & errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Retrieve,
    ResumeAnalysis,
    GapAnalysis,
    CoverLetter,
    InterviewPrep,
    StrategyPlan,
    Synthesize,
    /// Free-text answer of the ad-hoc query endpoint.
    Answer,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Retrieve => "retrieval",
            Stage::ResumeAnalysis => "resume analysis",
            Stage::GapAnalysis => "gap analysis",
            Stage::CoverLetter => "cover letter",
            Stage::InterviewPrep => "interview prep",
            Stage::StrategyPlan => "strategy plan",
            Stage::Synthesize => "synthesis",
            Stage::Answer => "query answer",
        })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing required field: {0}")]
    Validation(&'static str),

    #[error("No resume chunks found for {0}. Please upload a resume again.")]
    NotFound(OwnerFilter),

    #[error("Retrieval failed: {0}")]
    Retrieval(RetrievalError),

    #[error("{stage} stage failed: model call error: {source}")]
    Generation {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    #[error("{source}")]
    Parse {
        stage: Stage,
        #[source]
        source: ParseError,
    },

    #[error("{stage} output failed schema validation: {reason}")]
    Schema { stage: Stage, reason: String },

    #[error("{stage} stage failed: could not serialize prompt context: {source}")]
    Serialize {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    /// The stage that failed; `None` when the request never got past validation.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Validation(_) => None,
            PipelineError::NotFound(_) | PipelineError::Retrieval(_) => Some(Stage::Retrieve),
            PipelineError::Generation { stage, .. }
            | PipelineError::Parse { stage, .. }
            | PipelineError::Schema { stage, .. }
            | PipelineError::Serialize { stage, .. } => Some(*stage),
        }
    }
}

impl From<RetrievalError> for PipelineError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::NotFound(owner) => PipelineError::NotFound(owner),
            other => PipelineError::Retrieval(other),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// Body of the report endpoint. Only `resumeId` is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub resume_id: Option<String>,
    pub target_company: Option<String>,
    pub target_role: Option<String>,
    pub job_description: Option<String>,
}

/// A validated request with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTarget {
    pub resume_id: String,
    pub company: String,
    pub role: String,
    pub job_description: String,
}

impl ReportRequest {
    /// Requires `resumeId`; fills in company, role and job description defaults.
    /// Blank strings count as absent.
    pub fn validate(self) -> Result<ReportTarget, PipelineError> {
        let resume_id = present(self.resume_id).ok_or(PipelineError::Validation("resumeId"))?;
        let company = present(self.target_company).unwrap_or_else(|| DEFAULT_TARGET_COMPANY.to_string());
        let role = present(self.target_role).unwrap_or_else(|| DEFAULT_TARGET_ROLE.to_string());
        let job_description = present(self.job_description)
            .unwrap_or_else(|| default_job_description(&company, &role));

        Ok(ReportTarget {
            resume_id,
            company,
            role,
            job_description,
        })
    }
}

pub fn default_job_description(company: &str, role: &str) -> String {
    format!("{role} role at {company} working on AI-native product experiences.")
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs the full report pipeline.
///
/// Steps:
/// 1. validate request → ReportTarget
/// 2. retrieve resume chunks (fails with NotFound before any model call)
/// 3. analyze_resume → ResumeAnalysis
/// 4. analyze_gaps → GapAnalysis
/// 5. write_cover_letter → CoverLetter
/// 6. prepare_interview → InterviewPrep
/// 7. plan_strategy → StrategyPlan
/// 8. synthesize → CareerReport
pub async fn generate_report(
    retriever: &ContextRetriever,
    invoker: &dyn ModelInvoker,
    request: ReportRequest,
) -> Result<CareerReport, PipelineError> {
    let target = request.validate()?;
    let run_id = Uuid::new_v4();
    info!(%run_id, "Report pipeline: starting for resumeId {}", target.resume_id);

    let result = run_stages(run_id, retriever, invoker, &target).await;

    match &result {
        Ok(_) => info!(%run_id, "Report pipeline: completed"),
        Err(e) => error!(
            %run_id,
            stage = %e.stage().map(|s| s.to_string()).unwrap_or_default(),
            "Report pipeline failed: {e}"
        ),
    }
    result
}

async fn run_stages(
    run_id: Uuid,
    retriever: &ContextRetriever,
    invoker: &dyn ModelInvoker,
    target: &ReportTarget,
) -> Result<CareerReport, PipelineError> {
    let owner = OwnerFilter::ResumeId(target.resume_id.clone());
    let chunks = logged(run_id, Stage::Retrieve, async {
        Ok::<_, PipelineError>(retriever.retrieve(&owner, REPORT_MAX_CHUNKS).await?)
    })
    .await?;
    info!(%run_id, "Report pipeline: retrieved {} chunks", chunks.len());
    let context = join_context(&chunks);

    let resume_analysis = logged(
        run_id,
        Stage::ResumeAnalysis,
        analyze_resume(
            invoker,
            &AnalysisInput {
                target_company: &target.company,
                target_role: &target.role,
                context: &context,
                uploaded_text: None,
            },
        ),
    )
    .await?;

    let gap_analysis = logged(
        run_id,
        Stage::GapAnalysis,
        analyze_gaps(invoker, target, &resume_analysis),
    )
    .await?;

    let cover_letter = logged(
        run_id,
        Stage::CoverLetter,
        write_cover_letter(invoker, target, &resume_analysis, &gap_analysis),
    )
    .await?;

    let interview_prep = logged(
        run_id,
        Stage::InterviewPrep,
        prepare_interview(invoker, target, &resume_analysis, &gap_analysis),
    )
    .await?;

    let strategy_plan = logged(
        run_id,
        Stage::StrategyPlan,
        plan_strategy(invoker, target, &gap_analysis),
    )
    .await?;

    logged(run_id, Stage::Synthesize, async {
        Ok::<_, PipelineError>(synthesize(
            target,
            Utc::now(),
            resume_analysis,
            gap_analysis,
            cover_letter,
            interview_prep,
            strategy_plan,
        ))
    })
    .await
}

/// Logs a stage's start and completion. Diagnostic only.
async fn logged<T>(
    run_id: Uuid,
    stage: Stage,
    work: impl Future<Output = Result<T, PipelineError>>,
) -> Result<T, PipelineError> {
    info!(%run_id, "Report pipeline: starting {stage}");
    let output = work.await?;
    info!(%run_id, "Report pipeline: {stage} done");
    Ok(output)
}

// ────────────────────────────────────────────────────────────────────────────
// Resume upload analysis
// ────────────────────────────────────────────────────────────────────────────

/// Chunks of prior context pulled in alongside an uploaded resume.
pub const UPLOAD_MAX_CHUNKS: usize = 20;

/// Body of the resume endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeUploadRequest {
    pub user_id: Option<String>,
    pub resume_text: Option<String>,
}

/// Runs only the resume analysis stage over freshly uploaded text.
///
/// Retrieval uses the resume text itself as the similarity query, scoped to the user.
/// An empty retrieval is fine here: the uploaded text is still analysed.
pub async fn analyze_uploaded_resume(
    retriever: &ContextRetriever,
    invoker: &dyn ModelInvoker,
    request: ResumeUploadRequest,
) -> Result<ResumeAnalysis, PipelineError> {
    let user_id = present(request.user_id).ok_or(PipelineError::Validation("userId"))?;
    let resume_text = present(request.resume_text).ok_or(PipelineError::Validation("resumeText"))?;

    let owner = OwnerFilter::UserId(user_id);
    let chunks = retriever
        .search(&resume_text, Some(&owner), UPLOAD_MAX_CHUNKS)
        .await?;
    info!("Resume analysis: {} prior chunks for {}", chunks.len(), owner);

    let context = join_context(&chunks);
    analyze_resume(
        invoker,
        &AnalysisInput {
            target_company: DEFAULT_TARGET_COMPANY,
            target_role: DEFAULT_TARGET_ROLE,
            context: &context,
            uploaded_text: Some(&resume_text),
        },
    )
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Stages
// ────────────────────────────────────────────────────────────────────────────

/// Inputs of the resume analysis stage, shared by the report and the resume endpoint.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub target_company: &'a str,
    pub target_role: &'a str,
    /// Retrieved chunks, already joined.
    pub context: &'a str,
    /// Free text uploaded by the caller, if any.
    pub uploaded_text: Option<&'a str>,
}

pub async fn analyze_resume(
    invoker: &dyn ModelInvoker,
    input: &AnalysisInput<'_>,
) -> Result<ResumeAnalysis, PipelineError> {
    let uploaded = input
        .uploaded_text
        .map(|text| fill_template(UPLOADED_TEXT_SECTION, &[("resume_text", text)]))
        .unwrap_or_default();
    let context = if input.context.trim().is_empty() {
        EMPTY_CONTEXT
    } else {
        input.context
    };

    let prompt = fill_template(
        RESUME_ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("specificity_instruction", SPECIFICITY_INSTRUCTION),
            ("shape", ResumeAnalysis::SHAPE),
            ("target_company", input.target_company),
            ("target_role", input.target_role),
            ("uploaded_text", &uploaded),
            ("context", context),
        ],
    );

    invoke_structured(invoker, Stage::ResumeAnalysis, &prompt, RESUME_ANALYSIS_MODEL).await
}

async fn analyze_gaps(
    invoker: &dyn ModelInvoker,
    target: &ReportTarget,
    resume_analysis: &ResumeAnalysis,
) -> Result<GapAnalysis, PipelineError> {
    let stage = Stage::GapAnalysis;
    let resume_json = prompt_json(stage, resume_analysis)?;

    let prompt = fill_template(
        GAP_ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("shape", GapAnalysis::SHAPE),
            ("target_company", &target.company),
            ("target_role", &target.role),
            ("resume_analysis_json", &resume_json),
            ("job_description", &target.job_description),
        ],
    );

    invoke_structured(invoker, stage, &prompt, GAP_ANALYSIS_MODEL).await
}

async fn write_cover_letter(
    invoker: &dyn ModelInvoker,
    target: &ReportTarget,
    resume_analysis: &ResumeAnalysis,
    gap_analysis: &GapAnalysis,
) -> Result<CoverLetter, PipelineError> {
    let stage = Stage::CoverLetter;
    let resume_json = prompt_json(stage, resume_analysis)?;
    let gap_json = prompt_json(stage, gap_analysis)?;

    let prompt = fill_template(
        COVER_LETTER_PROMPT_TEMPLATE,
        &[
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("specificity_instruction", SPECIFICITY_INSTRUCTION),
            ("shape", CoverLetter::SHAPE),
            ("target_company", &target.company),
            ("target_role", &target.role),
            ("resume_analysis_json", &resume_json),
            ("gap_analysis_json", &gap_json),
        ],
    );

    invoke_structured(invoker, stage, &prompt, COVER_LETTER_MODEL).await
}

async fn prepare_interview(
    invoker: &dyn ModelInvoker,
    target: &ReportTarget,
    resume_analysis: &ResumeAnalysis,
    gap_analysis: &GapAnalysis,
) -> Result<InterviewPrep, PipelineError> {
    let stage = Stage::InterviewPrep;
    let resume_json = prompt_json(stage, resume_analysis)?;
    let gap_json = prompt_json(stage, gap_analysis)?;

    let prompt = fill_template(
        INTERVIEW_PREP_PROMPT_TEMPLATE,
        &[
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("shape", InterviewPrep::SHAPE),
            ("target_company", &target.company),
            ("target_role", &target.role),
            ("resume_analysis_json", &resume_json),
            ("gap_analysis_json", &gap_json),
            ("job_description", &target.job_description),
        ],
    );

    invoke_structured(invoker, stage, &prompt, INTERVIEW_PREP_MODEL).await
}

async fn plan_strategy(
    invoker: &dyn ModelInvoker,
    target: &ReportTarget,
    gap_analysis: &GapAnalysis,
) -> Result<StrategyPlan, PipelineError> {
    let stage = Stage::StrategyPlan;
    let gap_json = prompt_json(stage, gap_analysis)?;

    let prompt = fill_template(
        STRATEGY_PLAN_PROMPT_TEMPLATE,
        &[
            ("shape", StrategyPlan::SHAPE),
            ("target_company", &target.company),
            ("target_role", &target.role),
            ("gap_analysis_json", &gap_json),
        ],
    );

    invoke_structured(invoker, stage, &prompt, STRATEGY_PLAN_MODEL).await
}

// ────────────────────────────────────────────────────────────────────────────
// Structured invocation
// ────────────────────────────────────────────────────────────────────────────

/// Calls the model in JSON mode and returns an object that satisfies `T`'s schema.
///
/// One model call. Output goes through the response parser, then serde (types and
/// required fields), then `StageOutput::validate` (ranges, ordering). Never returns a
/// malformed object.
pub async fn invoke_structured<T: StageOutput>(
    invoker: &dyn ModelInvoker,
    stage: Stage,
    prompt: &str,
    settings: ModelSettings,
) -> Result<T, PipelineError> {
    let request = ModelRequest {
        system: JSON_ONLY_SYSTEM,
        prompt,
        settings,
        json_output: true,
    };

    let raw = invoker
        .invoke(&request)
        .await
        .map_err(|source| PipelineError::Generation { stage, source })?;

    let object = parse_json_object(&raw, &stage.to_string())
        .map_err(|source| PipelineError::Parse { stage, source })?;

    let mut output: T =
        serde_json::from_value(Value::Object(object)).map_err(|e| PipelineError::Schema {
            stage,
            reason: e.to_string(),
        })?;

    output.validate().map_err(|v| PipelineError::Schema {
        stage,
        reason: v.0,
    })?;

    Ok(output)
}

fn prompt_json<T: Serialize>(stage: Stage, value: &T) -> Result<String, PipelineError> {
    serde_json::to_string_pretty(value).map_err(|source| PipelineError::Serialize { stage, source })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
