// All LLM prompt templates and model settings for the career report.
// Shared fragments (system prompts, grounding rules) come from llm_client::prompts.
// Placeholders are filled in one pass by `fill_template`, so substituted text (user
// input, prior stage JSON, retrieved chunks) is never scanned for placeholders again.

use crate::llm_client::ModelSettings;

pub const RESUME_ANALYSIS_MODEL: ModelSettings = ModelSettings {
    model: "gpt-4o-mini",
    temperature: 0.0,
};
pub const GAP_ANALYSIS_MODEL: ModelSettings = ModelSettings {
    model: "gpt-4o-mini",
    temperature: 0.2,
};
pub const COVER_LETTER_MODEL: ModelSettings = ModelSettings {
    model: "gpt-4o",
    temperature: 0.3,
};
pub const INTERVIEW_PREP_MODEL: ModelSettings = ModelSettings {
    model: "gpt-4o",
    temperature: 0.2,
};
pub const STRATEGY_PLAN_MODEL: ModelSettings = ModelSettings {
    model: "gpt-4o-mini",
    temperature: 0.2,
};
pub const QUERY_MODEL: ModelSettings = ModelSettings {
    model: "gpt-4o-mini",
    temperature: 0.2,
};

/// Resume analysis. Replace: {grounding_instruction}, {specificity_instruction}, {shape},
/// {target_company}, {target_role}, {uploaded_text}, {context}
pub const RESUME_ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an elite AI career coach analyzing a candidate applying to {target_company} for the {target_role} role.
{uploaded_text}
CONTEXT FROM RESUME (retrieved_chunks):
{context}

SKILL & EDUCATION EXTRACTION RULES:
- Extract ALL skills listed anywhere in the resume's skills section verbatim into the matching skills arrays.
- Extract ALL majors, minors, and certifications into the education array.
- When an item is both a course and a skill (e.g. "Machine Learning Fundamentals"), list it in education and add the skill token to skills.

{grounding_instruction}

{specificity_instruction}

atsScore is an integer from 0 to 100 estimating how well the resume passes applicant tracking systems.
Where data is genuinely unavailable, use "insufficient data" or an empty array. Every array must be present.

Return a JSON object with this EXACT structure (no extra fields):
{shape}"#;

/// Inserted into the resume analysis prompt when the caller uploads free text.
/// Replace: {resume_text}
pub const UPLOADED_TEXT_SECTION: &str = r#"
CONTEXT FROM RESUME (free-text upload):
{resume_text}
"#;

/// Gap analysis. Replace: {grounding_instruction}, {shape}, {target_company}, {target_role},
/// {resume_analysis_json}, {job_description}
pub const GAP_ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an AI career coach analyzing fit between a candidate and the {target_role} role at {target_company}.

Candidate Resume Analysis:
{resume_analysis_json}

Target Role: {target_role} at {target_company}
Job Description: {job_description}

{grounding_instruction}

roleFitScore is an integer from 0 to 100. Order priorityUpskilling from most to least important.

Return a JSON object with this EXACT structure (no extra fields):
{shape}"#;

/// Cover letter. Replace: {grounding_instruction}, {specificity_instruction}, {shape},
/// {target_company}, {target_role}, {resume_analysis_json}, {gap_analysis_json}
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"You are a world-class AI career coach writing a cover letter for a candidate applying to {target_company} for the {target_role} role.

Structured resume analysis:
{resume_analysis_json}

Structured gap analysis:
{gap_analysis_json}

{grounding_instruction}

{specificity_instruction}

STRUCTURE (4 paragraphs, markdown, in the "letter" field):
1. Hook: one bold opening sentence tying the candidate's real experience to {target_company}'s mission.
2. Story: 1-2 specific projects with real names and metrics from the resume analysis.
3. Bridge: address true gaps from the gap analysis with concrete upskilling actions.
4. Close: a specific call-to-action and gratitude.
Tone: confident, warm, technical but accessible. Never generic.

Return a JSON object with this EXACT structure (no extra fields):
{shape}"#;

/// Interview prep. Replace: {grounding_instruction}, {shape}, {target_company}, {target_role},
/// {resume_analysis_json}, {gap_analysis_json}, {job_description}
pub const INTERVIEW_PREP_PROMPT_TEMPLATE: &str = r#"You are an elite AI interview coach preparing a candidate for the {target_role} interview at {target_company}.

Resume Analysis:
{resume_analysis_json}

Gap Analysis:
{gap_analysis_json}

Job Description:
{job_description}

{grounding_instruction}

Generate 3-5 behavioral questions with STAR-format answers, 3-5 technical questions, and 3-4 product questions.
Every answer must reference real projects, companies, tools, and metrics from the resume analysis.

Return a JSON object with this EXACT structure (no extra fields):
{shape}"#;

/// Strategy plan. Replace: {shape}, {target_company}, {target_role}, {gap_analysis_json}
pub const STRATEGY_PLAN_PROMPT_TEMPLATE: &str = r#"You are an AI career coach creating a 6-month strategy plan for a candidate targeting the {target_role} role at {target_company}.

Gap Analysis:
{gap_analysis_json}

Create a detailed plan with EXACTLY six monthlyBreakdown entries, months numbered 1 through 6 in order.

Return a JSON object with this EXACT structure (no extra fields):
{shape}"#;

/// Ad-hoc question answered from retrieved chunks. Replace: {grounding_instruction},
/// {specificity_instruction}, {context}, {query}
pub const QUERY_PROMPT_TEMPLATE: &str = r#"CONTEXT FROM RESUME (retrieved_chunks):
{context}

{grounding_instruction}

{specificity_instruction}

OUTPUT FORMAT:
- Answer the user's question below in clear markdown.
- Use short sections or bullet points where helpful.
- Where appropriate, briefly indicate your confidence (high/medium/low) based on how directly the context supports your claims.

USER QUESTION:
{query}

Now provide a concise, professional, and confident answer grounded strictly in the context."#;

/// Replaces each `{name}` in `template` with its value. Unknown `{...}` sequences are kept.
/// Substituted values are copied verbatim and never re-scanned.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];

        let hit = vars.iter().find_map(|(name, value)| {
            tail.strip_prefix(name)?
                .strip_prefix('}')
                .map(|remaining| (*value, remaining))
        });

        match hit {
            Some((value, remaining)) => {
                out.push_str(value);
                rest = remaining;
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}
