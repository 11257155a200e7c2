//! Report Synthesizer: assembles validated stage outputs into the final report.
//!
//! Pure: no I/O and no failure modes. Two targets: the `CareerReport` aggregate
//! (served as JSON) and a single markdown document with a fixed section order.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::report::pipeline::ReportTarget;
use crate::report::schema::{
    CoverLetter, GapAnalysis, InterviewPrep, QuestionAnswer, ResumeAnalysis, StrategyPlan,
};

const EMPTY_LIST: &str = "_None identified._";
const FOOTER: &str = "*Report generated by AI Career Coach, grounded in your resume via retrieval.*";

/// The terminal artifact of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerReport {
    pub generated_at: DateTime<Utc>,
    pub target_company: String,
    pub target_role: String,
    pub resume_analysis: ResumeAnalysis,
    pub gap_analysis: GapAnalysis,
    pub cover_letter: CoverLetter,
    pub interview_prep: InterviewPrep,
    pub strategy_plan: StrategyPlan,
}

pub fn synthesize(
    target: &ReportTarget,
    generated_at: DateTime<Utc>,
    resume_analysis: ResumeAnalysis,
    gap_analysis: GapAnalysis,
    cover_letter: CoverLetter,
    interview_prep: InterviewPrep,
    strategy_plan: StrategyPlan,
) -> CareerReport {
    CareerReport {
        generated_at,
        target_company: target.company.clone(),
        target_role: target.role.clone(),
        resume_analysis,
        gap_analysis,
        cover_letter,
        interview_prep,
        strategy_plan,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Markdown
// ────────────────────────────────────────────────────────────────────────────

/// Renders the report. Section order is fixed:
/// Resume Summary → Fit/Gap → Cover Letter → Interview Prep → Strategy Plan.
pub fn render_markdown(report: &CareerReport) -> String {
    let mut md = String::new();
    let target = format!("{} {}", report.target_company, report.target_role);

    line(&mut md, &format!("# Career Report → {target}"));
    line(
        &mut md,
        &format!("_Generated {}_", report.generated_at.format("%Y-%m-%d %H:%M UTC")),
    );

    render_resume_summary(&mut md, &report.resume_analysis);
    render_fit(&mut md, &target, &report.gap_analysis);
    render_cover_letter(&mut md, &report.cover_letter);
    render_interview_prep(&mut md, &report.interview_prep);
    render_strategy(&mut md, &report.strategy_plan);

    line(&mut md, "---");
    md.push_str(FOOTER);
    md.push('\n');
    md
}

fn render_resume_summary(md: &mut String, analysis: &ResumeAnalysis) {
    line(md, "## 1. Resume Summary");
    line(md, &analysis.summary);
    line(md, &format!("**ATS Score:** {}/100", analysis.ats_score));

    heading(md, "Key Strengths");
    bullets(md, &analysis.strengths);

    heading(md, "Experience");
    if analysis.experience.is_empty() {
        line(md, EMPTY_LIST);
    }
    for job in &analysis.experience {
        line(
            md,
            &format!("**{}**, {} ({})", job.role, job.company, job.duration),
        );
        bullets(md, &job.bullets);
    }

    heading(md, "Education");
    let education: Vec<String> = analysis
        .education
        .iter()
        .map(|e| {
            let mut entry = format!("{}, {}", e.degree, e.school);
            if let Some(year) = &e.graduation_year {
                let _ = write!(entry, " ({year})");
            }
            if let Some(gpa) = &e.gpa {
                let _ = write!(entry, ", GPA {gpa}");
            }
            entry
        })
        .collect();
    bullets(md, &education);

    heading(md, "Technical Skills");
    bullets(md, &analysis.skills.technical);
    heading(md, "Soft Skills");
    bullets(md, &analysis.skills.soft);
    heading(md, "Tools");
    bullets(md, &analysis.skills.tools);

    heading(md, "Resume Gaps");
    bullets(md, &analysis.gaps);

    heading(md, "Resume Recommendations");
    bullets(md, &analysis.recommendations);
}

fn render_fit(md: &mut String, target: &str, gap: &GapAnalysis) {
    line(md, &format!("## 2. Fit vs. {target}"));
    line(md, &format!("**Role Fit Score:** {}/100", gap.role_fit_score));

    heading(md, "Missing Technical Skills");
    bullets(md, &gap.missing_technical_skills);
    heading(md, "Missing Soft Skills");
    bullets(md, &gap.missing_soft_skills);
    heading(md, "Missing Product Skills");
    bullets(md, &gap.missing_product_skills);
    heading(md, "Experience Gaps");
    bullets(md, &gap.missing_experience);

    heading(md, "Priority Upskilling");
    if gap.priority_upskilling.is_empty() {
        line(md, EMPTY_LIST);
    }
    for (rank, item) in gap.priority_upskilling.iter().enumerate() {
        line(md, &format!("#### {}. {}", rank + 1, item.skill));
        line(md, &item.reason);
        bullets(md, &item.resources);
    }

    heading(md, "Overall Recommendation");
    line(md, &gap.overall_recommendation);
}

fn render_cover_letter(md: &mut String, letter: &CoverLetter) {
    line(md, "## 3. Tailored Cover Letter");
    line(md, letter.letter.trim());

    heading(md, "Why This Role");
    line(md, &letter.why_this_role);
    heading(md, &format!("Why {}", letter.company));
    line(md, &letter.why_this_company);
    heading(md, "Closing Call to Action");
    line(md, &letter.closing_call_to_action);
}

fn render_interview_prep(md: &mut String, prep: &InterviewPrep) {
    line(md, "## 4. Interview Prep");

    heading(md, "Behavioral Questions");
    questions(md, &prep.behavioral);
    heading(md, "Technical Questions");
    questions(md, &prep.technical);
    if !prep.product.is_empty() {
        heading(md, "Product Questions");
        questions(md, &prep.product);
    }

    heading(md, "Interview Strategy Summary");
    line(md, &prep.summary);
}

fn render_strategy(md: &mut String, plan: &StrategyPlan) {
    line(md, "## 5. 6-Month Strategy Plan");

    heading(md, "Goal");
    line(md, &plan.six_month_goal);

    heading(md, "Monthly Breakdown");
    for month in &plan.monthly_breakdown {
        line(md, &format!("#### Month {}: {}", month.month, month.focus));
        line(md, "**Milestones**");
        bullets(md, &month.key_milestones);
        line(md, "**Actions**");
        bullets(md, &month.actions);
        line(md, "**Resources**");
        bullets(md, &month.resources);
    }

    heading(md, "Final Recommendation");
    line(md, &plan.final_recommendation);
}

/// A block followed by a blank line.
fn line(md: &mut String, text: &str) {
    md.push_str(text);
    md.push_str("\n\n");
}

fn heading(md: &mut String, title: &str) {
    line(md, &format!("### {title}"));
}

/// One `- item` per element; an empty list renders a placeholder, never a bullet.
fn bullets(md: &mut String, items: &[String]) {
    if items.is_empty() {
        line(md, EMPTY_LIST);
        return;
    }
    for item in items {
        let _ = writeln!(md, "- {}", item.trim());
    }
    md.push('\n');
}

fn questions(md: &mut String, pairs: &[QuestionAnswer]) {
    if pairs.is_empty() {
        line(md, EMPTY_LIST);
    }
    for qa in pairs {
        line(md, &format!("**Q:** {}", qa.question));
        line(md, &format!("**A:** {}", qa.answer));
    }
}
