//! Fakes and fixtures shared by unit and router tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::llm_client::{Embedder, LlmError, ModelInvoker, ModelRequest, ModelSettings};
use crate::report::pipeline::ReportRequest;
use crate::report::schema::{
    CoverLetter, EducationEntry, ExperienceEntry, GapAnalysis, InterviewPrep, MonthPlan,
    QuestionAnswer, ResumeAnalysis, SkillSet, StrategyPlan, UpskillingItem, PLAN_MONTHS,
};
use crate::report::synthesizer::{synthesize, CareerReport};
use crate::retrieval::{ChunkMetadata, ContextChunk, StoreError, VectorStore};

// ────────────────────────────────────────────────────────────────────────────
// Vector store
// ────────────────────────────────────────────────────────────────────────────

/// In-memory store returning its chunks in order, capped at the requested count.
pub struct FakeStore {
    chunks: Vec<ContextChunk>,
    fail: bool,
    requested: Mutex<Vec<usize>>,
}

impl FakeStore {
    pub fn with_chunks(chunks: Vec<ContextChunk>) -> Self {
        Self {
            chunks,
            fail: false,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_chunks(Vec::new())
        }
    }

    /// `match_count` of every call, in order.
    pub fn requested_counts(&self) -> Vec<usize> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn match_documents(
        &self,
        _embedding: &[f32],
        match_count: usize,
    ) -> Result<Vec<ContextChunk>, StoreError> {
        self.requested.lock().unwrap().push(match_count);
        if self.fail {
            return Err(StoreError::Api {
                status: 503,
                message: "store unavailable".to_string(),
            });
        }
        Ok(self.chunks.iter().take(match_count).cloned().collect())
    }
}

#[derive(Default)]
pub struct FakeEmbedder {
    queries: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.queries.lock().unwrap().push(text.to_string());
        Ok(vec![0.1; 8])
    }
}

pub fn chunk_for_resume(resume_id: &str, content: &str, similarity: f64) -> ContextChunk {
    ContextChunk {
        content: content.to_string(),
        similarity,
        metadata: ChunkMetadata {
            resume_id: Some(resume_id.to_string()),
            ..Default::default()
        },
    }
}

pub fn chunk_for_user(user_id: &str, content: &str, similarity: f64) -> ContextChunk {
    ContextChunk {
        content: content.to_string(),
        similarity,
        metadata: ChunkMetadata {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorded {
    responses: VecDeque<String>,
    calls: usize,
    prompts: Vec<String>,
    settings: Vec<ModelSettings>,
    json_modes: Vec<bool>,
}

/// Replays canned responses in order and records every request.
pub struct ScriptedInvoker {
    state: Mutex<Recorded>,
    fail_at: Option<usize>,
}

impl ScriptedInvoker {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            state: Mutex::new(Recorded {
                responses: responses.into(),
                ..Default::default()
            }),
            fail_at: None,
        }
    }

    /// The `n`th call (1-based) fails with an API error. It still counts as a call.
    pub fn failing_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.lock().unwrap().prompts.clone()
    }

    pub fn settings(&self) -> Vec<ModelSettings> {
        self.state.lock().unwrap().settings.clone()
    }

    pub fn json_modes(&self) -> Vec<bool> {
        self.state.lock().unwrap().json_modes.clone()
    }
}

#[async_trait]
impl ModelInvoker for ScriptedInvoker {
    async fn invoke(&self, request: &ModelRequest<'_>) -> Result<String, LlmError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        state.prompts.push(request.prompt.to_string());
        state.settings.push(request.settings);
        state.json_modes.push(request.json_output);

        if self.fail_at == Some(state.calls) {
            return Err(LlmError::Api {
                status: 500,
                message: "upstream model failure".to_string(),
            });
        }
        state.responses.pop_front().ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entities
// ────────────────────────────────────────────────────────────────────────────

pub fn sample_resume_analysis() -> ResumeAnalysis {
    ResumeAnalysis {
        summary: "Product-minded engineer with shipped RAG features and B2B SaaS internships."
            .to_string(),
        education: vec![EducationEntry {
            degree: "B.S. Computer Science".to_string(),
            school: "UC Berkeley".to_string(),
            graduation_year: Some("2024".to_string()),
            gpa: Some("3.8".to_string()),
        }],
        experience: vec![ExperienceEntry {
            company: "Acme AI".to_string(),
            role: "Product Engineering Intern".to_string(),
            duration: "Jun 2023 - Sep 2023".to_string(),
            bullets: vec![
                "Launched retrieval assistant used by 4,000 support agents".to_string(),
                "Cut ticket handling time by 22%".to_string(),
            ],
        }],
        skills: SkillSet {
            technical: vec!["Python".to_string(), "SQL".to_string()],
            soft: vec!["Stakeholder communication".to_string()],
            tools: vec!["Figma".to_string(), "Amplitude".to_string()],
        },
        strengths: vec![
            "Ships AI features end to end".to_string(),
            "Comfortable with product analytics".to_string(),
        ],
        gaps: vec!["No formal PM title".to_string()],
        ats_score: 82.0,
        recommendations: vec!["Quantify the Acme launch impact in the headline".to_string()],
    }
}

pub fn sample_gap_analysis() -> GapAnalysis {
    GapAnalysis {
        role_fit_score: 68.0,
        missing_technical_skills: vec!["Eval design for LLM products".to_string()],
        missing_soft_skills: vec!["Executive storytelling".to_string()],
        missing_product_skills: vec!["Roadmap prioritization at scale".to_string()],
        missing_experience: vec!["Owning a launch as the PM of record".to_string()],
        priority_upskilling: vec![UpskillingItem {
            skill: "LLM evaluation".to_string(),
            reason: "APMs at OpenAI define quality bars for model launches".to_string(),
            resources: vec!["Build an eval harness for the Acme assistant".to_string()],
        }],
        overall_recommendation: "Lead with the Acme retrieval launch and close the eval gap."
            .to_string(),
    }
}

pub fn sample_cover_letter() -> CoverLetter {
    CoverLetter {
        company: "OpenAI".to_string(),
        letter: "Dear Hiring Team,\n\nAt Acme AI I launched a retrieval assistant...".to_string(),
        why_this_role: "The APM role sits where model capability meets user need.".to_string(),
        why_this_company: "OpenAI ships research to millions of users.".to_string(),
        closing_call_to_action: "I would welcome a conversation about the APM team.".to_string(),
    }
}

pub fn sample_interview_prep() -> InterviewPrep {
    InterviewPrep {
        behavioral: vec![QuestionAnswer {
            question: "Tell me about a launch you owned.".to_string(),
            answer: "At Acme AI I shipped the retrieval assistant to 4,000 agents.".to_string(),
        }],
        technical: vec![QuestionAnswer {
            question: "How would you evaluate a RAG feature?".to_string(),
            answer: "Offline relevance sets, then online deflection rate.".to_string(),
        }],
        product: vec![QuestionAnswer {
            question: "How would you improve ChatGPT memory?".to_string(),
            answer: "Start from user control and transparency.".to_string(),
        }],
        summary: "Anchor every answer in the Acme launch.".to_string(),
    }
}

pub fn sample_strategy_plan() -> StrategyPlan {
    StrategyPlan {
        six_month_goal: "Land an APM offer at OpenAI.".to_string(),
        monthly_breakdown: (1..=PLAN_MONTHS)
            .map(|month| MonthPlan {
                month,
                focus: format!("Focus area {month}"),
                key_milestones: vec![format!("Milestone for month {month}")],
                actions: vec![format!("Action for month {month}")],
                resources: vec![format!("Resource for month {month}")],
            })
            .collect(),
        final_recommendation: "Keep shipping small AI products in public.".to_string(),
    }
}

/// Model responses for the five report stages, in call order.
pub fn happy_path_responses() -> Vec<String> {
    vec![
        serde_json::to_string(&sample_resume_analysis()).unwrap(),
        // Fenced, as models sometimes return it.
        format!(
            "```json\n{}\n```",
            serde_json::to_string_pretty(&sample_gap_analysis()).unwrap()
        ),
        serde_json::to_string(&sample_cover_letter()).unwrap(),
        format!(
            "Here is the prep:\n{}",
            serde_json::to_string(&sample_interview_prep()).unwrap()
        ),
        serde_json::to_string(&sample_strategy_plan()).unwrap(),
    ]
}

pub fn sample_report() -> CareerReport {
    let target = ReportRequest {
        resume_id: Some("r1".to_string()),
        ..Default::default()
    }
    .validate()
    .unwrap();

    synthesize(
        &target,
        Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap(),
        sample_resume_analysis(),
        sample_gap_analysis(),
        sample_cover_letter(),
        sample_interview_prep(),
        sample_strategy_plan(),
    )
}
