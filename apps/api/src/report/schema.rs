//! Stage outputs: the typed entities each report stage must produce.
//!
//! serde enforces types and required fields; `StageOutput::validate` enforces the rest
//! (score ranges, the six-month sequence). Wire names are camelCase, matching the shapes
//! shown to the model.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// A payload that decoded but broke a range or structural rule.
#[derive(Debug, Error, PartialEq)]
#[error("{0}")]
pub struct SchemaViolation(pub String);

/// Implemented by every entity a stage can return.
pub trait StageOutput: DeserializeOwned + Serialize {
    /// Example JSON shown to the model as the exact expected shape.
    const SHAPE: &'static str;

    /// Checks invariants serde cannot express. May normalise ordering.
    fn validate(&mut self) -> Result<(), SchemaViolation>;
}

pub const PLAN_MONTHS: u8 = 6;

fn check_score(field: &str, score: f64) -> Result<(), SchemaViolation> {
    if (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err(SchemaViolation(format!(
            "{field} must be between 0 and 100, got {score}"
        )))
    }
}

fn check_non_empty(field: &str, value: &str) -> Result<(), SchemaViolation> {
    if value.trim().is_empty() {
        Err(SchemaViolation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resume analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub degree: String,
    pub school: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduation_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub company: String,
    pub role: String,
    pub duration: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSet {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysis {
    pub summary: String,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub skills: SkillSet,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    /// 0 – 100
    pub ats_score: f64,
    pub recommendations: Vec<String>,
}

impl StageOutput for ResumeAnalysis {
    const SHAPE: &'static str = r#"{
  "summary": "One-paragraph executive summary of the candidate",
  "education": [
    {"degree": "B.S. Business Administration", "school": "University", "graduationYear": "2024", "gpa": "3.7"}
  ],
  "experience": [
    {"company": "Company", "role": "Role", "duration": "Jun 2023 - Aug 2023", "bullets": ["Concrete achievement with metric"]}
  ],
  "skills": {"technical": ["skill"], "soft": ["skill"], "tools": ["tool"]},
  "strengths": ["strength"],
  "gaps": ["gap"],
  "atsScore": 0,
  "recommendations": ["recommendation"]
}"#;

    fn validate(&mut self) -> Result<(), SchemaViolation> {
        check_non_empty("summary", &self.summary)?;
        check_score("atsScore", self.ats_score)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gap analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpskillingItem {
    pub skill: String,
    pub reason: String,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapAnalysis {
    /// 0 – 100
    pub role_fit_score: f64,
    pub missing_technical_skills: Vec<String>,
    pub missing_soft_skills: Vec<String>,
    pub missing_product_skills: Vec<String>,
    pub missing_experience: Vec<String>,
    pub priority_upskilling: Vec<UpskillingItem>,
    pub overall_recommendation: String,
}

impl StageOutput for GapAnalysis {
    const SHAPE: &'static str = r#"{
  "roleFitScore": 0,
  "missingTechnicalSkills": ["skill"],
  "missingSoftSkills": ["skill"],
  "missingProductSkills": ["skill"],
  "missingExperience": ["experience gap"],
  "priorityUpskilling": [
    {"skill": "skill", "reason": "why it matters for the role", "resources": ["course, book or project"]}
  ],
  "overallRecommendation": "Overall recommendation"
}"#;

    fn validate(&mut self) -> Result<(), SchemaViolation> {
        check_score("roleFitScore", self.role_fit_score)?;
        check_non_empty("overallRecommendation", &self.overall_recommendation)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cover letter
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetter {
    pub company: String,
    /// Full letter body in markdown.
    pub letter: String,
    pub why_this_role: String,
    pub why_this_company: String,
    pub closing_call_to_action: String,
}

impl StageOutput for CoverLetter {
    const SHAPE: &'static str = r#"{
  "company": "Target company name",
  "letter": "Full 4-paragraph cover letter in markdown",
  "whyThisRole": "Why the candidate fits this role",
  "whyThisCompany": "Why the candidate wants this company",
  "closingCallToAction": "Closing call-to-action"
}"#;

    fn validate(&mut self) -> Result<(), SchemaViolation> {
        check_non_empty("letter", &self.letter)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Interview prep
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

/// Older prompts named the summary `metaSummary` or `mockInterviewSummary`; any of the
/// three keys is accepted, and `summary` wins when several are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "InterviewPrepWire")]
pub struct InterviewPrep {
    pub behavioral: Vec<QuestionAnswer>,
    pub technical: Vec<QuestionAnswer>,
    #[serde(default)]
    pub product: Vec<QuestionAnswer>,
    pub summary: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InterviewPrepWire {
    behavioral: Vec<QuestionAnswer>,
    technical: Vec<QuestionAnswer>,
    #[serde(default)]
    product: Vec<QuestionAnswer>,
    summary: Option<String>,
    meta_summary: Option<String>,
    mock_interview_summary: Option<String>,
}

impl TryFrom<InterviewPrepWire> for InterviewPrep {
    type Error = String;

    fn try_from(wire: InterviewPrepWire) -> Result<Self, Self::Error> {
        let summary = wire
            .summary
            .or(wire.meta_summary)
            .or(wire.mock_interview_summary)
            .ok_or_else(|| "missing field `summary`".to_string())?;
        Ok(Self {
            behavioral: wire.behavioral,
            technical: wire.technical,
            product: wire.product,
            summary,
        })
    }
}

impl InterviewPrep {
    pub fn question_count(&self) -> usize {
        self.behavioral.len() + self.technical.len() + self.product.len()
    }
}

impl StageOutput for InterviewPrep {
    const SHAPE: &'static str = r#"{
  "behavioral": [{"question": "...", "answer": "STAR-format answer using the candidate's real experience"}],
  "technical": [{"question": "...", "answer": "Detailed answer grounded in real projects"}],
  "product": [{"question": "...", "answer": "..."}],
  "summary": "Overall interview strategy summary"
}"#;

    fn validate(&mut self) -> Result<(), SchemaViolation> {
        if self.question_count() == 0 {
            return Err(SchemaViolation(
                "interview prep must contain at least one question".to_string(),
            ));
        }
        let all = self
            .behavioral
            .iter()
            .chain(&self.technical)
            .chain(&self.product);
        for qa in all {
            check_non_empty("question", &qa.question)?;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Strategy plan
// ────────────────────────────────────────────────────────────────────────────

/// `weeklyActions` is read as `actions`; `actions` wins when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "MonthPlanWire")]
pub struct MonthPlan {
    /// 1 – 6
    pub month: u8,
    pub focus: String,
    pub key_milestones: Vec<String>,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonthPlanWire {
    month: u8,
    focus: String,
    key_milestones: Vec<String>,
    actions: Option<Vec<String>>,
    weekly_actions: Option<Vec<String>>,
    resources: Vec<String>,
}

impl TryFrom<MonthPlanWire> for MonthPlan {
    type Error = String;

    fn try_from(wire: MonthPlanWire) -> Result<Self, Self::Error> {
        let actions = wire
            .actions
            .or(wire.weekly_actions)
            .ok_or_else(|| "missing field `actions`".to_string())?;
        Ok(Self {
            month: wire.month,
            focus: wire.focus,
            key_milestones: wire.key_milestones,
            actions,
            resources: wire.resources,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyPlan {
    pub six_month_goal: String,
    pub monthly_breakdown: Vec<MonthPlan>,
    pub final_recommendation: String,
}

impl StageOutput for StrategyPlan {
    const SHAPE: &'static str = r#"{
  "sixMonthGoal": "Clear goal statement",
  "monthlyBreakdown": [
    {"month": 1, "focus": "Focus area for month 1", "keyMilestones": ["milestone"], "actions": ["action"], "resources": ["resource"]},
    {"month": 2, "focus": "Focus area for month 2", "keyMilestones": ["milestone"], "actions": ["action"], "resources": ["resource"]},
    {"month": 3, "focus": "Focus area for month 3", "keyMilestones": ["milestone"], "actions": ["action"], "resources": ["resource"]},
    {"month": 4, "focus": "Focus area for month 4", "keyMilestones": ["milestone"], "actions": ["action"], "resources": ["resource"]},
    {"month": 5, "focus": "Focus area for month 5", "keyMilestones": ["milestone"], "actions": ["action"], "resources": ["resource"]},
    {"month": 6, "focus": "Focus area for month 6", "keyMilestones": ["milestone"], "actions": ["action"], "resources": ["resource"]}
  ],
  "finalRecommendation": "Final recommendation summary"
}"#;

    /// Sorts the breakdown by month, then requires exactly months 1 through 6.
    fn validate(&mut self) -> Result<(), SchemaViolation> {
        check_non_empty("sixMonthGoal", &self.six_month_goal)?;

        self.monthly_breakdown.sort_by_key(|m| m.month);
        let months: Vec<u8> = self.monthly_breakdown.iter().map(|m| m.month).collect();
        let expected: Vec<u8> = (1..=PLAN_MONTHS).collect();

        if months != expected {
            return Err(SchemaViolation(format!(
                "monthlyBreakdown must contain months 1 through {PLAN_MONTHS} exactly once, got {months:?}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_gap_analysis, sample_resume_analysis, sample_strategy_plan};
    use serde_json::json;

    #[test]
    fn test_resume_analysis_deserializes_full_shape() {
        let value = json!({
            "summary": "Business + AI graduate with RAG product experience",
            "education": [{"degree": "B.S. Business", "school": "USC", "graduationYear": "2024"}],
            "experience": [{
                "company": "Acme",
                "role": "PM Intern",
                "duration": "Summer 2023",
                "bullets": ["Launched onboarding flow used by 5,000+ users"]
            }],
            "skills": {"technical": ["Python"], "soft": ["Communication"], "tools": ["Figma"]},
            "strengths": ["Shipping AI features"],
            "gaps": [],
            "atsScore": 81,
            "recommendations": ["Quantify impact"]
        });

        let mut analysis: ResumeAnalysis = serde_json::from_value(value).unwrap();
        assert!(analysis.validate().is_ok());
        assert_eq!(analysis.education[0].gpa, None);
        assert_eq!(analysis.experience[0].bullets.len(), 1);
        assert!(analysis.gaps.is_empty());
    }

    #[test]
    fn test_resume_analysis_requires_arrays_to_be_present() {
        let value = json!({
            "summary": "x",
            "education": [],
            "experience": [],
            "skills": {"technical": [], "soft": [], "tools": []},
            "strengths": [],
            "atsScore": 50,
            "recommendations": []
        });
        assert!(serde_json::from_value::<ResumeAnalysis>(value).is_err());
    }

    #[test]
    fn test_score_above_range_is_rejected() {
        let mut analysis = sample_resume_analysis();
        analysis.ats_score = 140.0;
        let err = analysis.validate().unwrap_err();
        assert_eq!(err.0, "atsScore must be between 0 and 100, got 140");
    }

    #[test]
    fn test_negative_role_fit_is_rejected() {
        let mut gap = sample_gap_analysis();
        gap.role_fit_score = -1.0;
        assert!(gap.validate().is_err());
    }

    #[test]
    fn test_score_bounds_are_inclusive() {
        let mut gap = sample_gap_analysis();
        gap.role_fit_score = 0.0;
        assert!(gap.validate().is_ok());
        gap.role_fit_score = 100.0;
        assert!(gap.validate().is_ok());
    }

    #[test]
    fn test_interview_prep_accepts_legacy_summary_names() {
        let value = json!({
            "behavioral": [{"question": "Tell me about a conflict", "answer": "S/T/A/R"}],
            "technical": [],
            "metaSummary": "Lead with the RAG project"
        });
        let mut prep: InterviewPrep = serde_json::from_value(value).unwrap();
        assert!(prep.validate().is_ok());
        assert!(prep.product.is_empty());
        assert_eq!(prep.summary, "Lead with the RAG project");

        let value = json!({
            "behavioral": [],
            "technical": [{"question": "Design a retriever", "answer": "..."}],
            "mockInterviewSummary": "Practice system design"
        });
        let prep: InterviewPrep = serde_json::from_value(value).unwrap();
        assert_eq!(prep.summary, "Practice system design");
    }

    #[test]
    fn test_interview_prep_with_both_summary_names_prefers_summary() {
        let value = json!({
            "behavioral": [{"question": "Tell me about a conflict", "answer": "S/T/A/R"}],
            "technical": [],
            "summary": "Lead with impact",
            "metaSummary": "Lead with the RAG project",
            "mockInterviewSummary": "Practice system design"
        });
        let prep: InterviewPrep = serde_json::from_value(value).unwrap();
        assert_eq!(prep.summary, "Lead with impact");
    }

    #[test]
    fn test_interview_prep_without_any_summary_is_rejected() {
        let value = json!({
            "behavioral": [{"question": "Tell me about a conflict", "answer": "S/T/A/R"}],
            "technical": []
        });
        let err = serde_json::from_value::<InterviewPrep>(value).unwrap_err();
        assert!(err.to_string().contains("summary"), "{err}");
    }

    #[test]
    fn test_interview_prep_without_questions_is_rejected() {
        let mut prep = InterviewPrep {
            behavioral: vec![],
            technical: vec![],
            product: vec![],
            summary: "nothing".to_string(),
        };
        assert!(prep.validate().is_err());
    }

    #[test]
    fn test_strategy_plan_sorts_months() {
        let mut plan = sample_strategy_plan();
        plan.monthly_breakdown.reverse();
        assert!(plan.validate().is_ok());
        let months: Vec<u8> = plan.monthly_breakdown.iter().map(|m| m.month).collect();
        assert_eq!(months, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_strategy_plan_with_five_months_is_rejected() {
        let mut plan = sample_strategy_plan();
        plan.monthly_breakdown.pop();
        let err = plan.validate().unwrap_err();
        assert!(err.0.contains("months 1 through 6"));
    }

    #[test]
    fn test_strategy_plan_with_duplicate_month_is_rejected() {
        let mut plan = sample_strategy_plan();
        plan.monthly_breakdown[5].month = 5;
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_month_plan_accepts_weekly_actions_alias() {
        let value = json!({
            "month": 3,
            "focus": "Portfolio",
            "keyMilestones": ["Ship demo"],
            "weeklyActions": ["Write spec"],
            "resources": []
        });
        let month: MonthPlan = serde_json::from_value(value).unwrap();
        assert_eq!(month.actions, vec!["Write spec".to_string()]);
    }

    #[test]
    fn test_month_plan_with_both_action_names_prefers_actions() {
        let value = json!({
            "month": 3,
            "focus": "Portfolio",
            "keyMilestones": ["Ship demo"],
            "actions": ["Publish case study"],
            "weeklyActions": ["Write spec"],
            "resources": []
        });
        let month: MonthPlan = serde_json::from_value(value).unwrap();
        assert_eq!(month.actions, vec!["Publish case study".to_string()]);
    }

    #[test]
    fn test_month_plan_without_actions_is_rejected() {
        let value = json!({
            "month": 3,
            "focus": "Portfolio",
            "keyMilestones": ["Ship demo"],
            "resources": []
        });
        assert!(serde_json::from_value::<MonthPlan>(value).is_err());
    }

    #[test]
    fn test_shapes_are_valid_json() {
        for shape in [
            ResumeAnalysis::SHAPE,
            GapAnalysis::SHAPE,
            CoverLetter::SHAPE,
            InterviewPrep::SHAPE,
            StrategyPlan::SHAPE,
        ] {
            assert!(serde_json::from_str::<serde_json::Value>(shape).is_ok());
        }
    }

    #[test]
    fn test_strategy_shape_satisfies_its_own_schema() {
        let mut plan: StrategyPlan = serde_json::from_str(StrategyPlan::SHAPE).unwrap();
        assert!(plan.validate().is_ok());
    }
}
