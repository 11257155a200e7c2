//! Ad-hoc questions answered from retrieved resume chunks: one retrieval, one
//! free-text model call. Not part of the report pipeline.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::llm_client::prompts::{COACH_SYSTEM, GROUNDING_INSTRUCTION, SPECIFICITY_INSTRUCTION};
use crate::llm_client::{ModelInvoker, ModelRequest};
use crate::report::pipeline::{PipelineError, Stage};
use crate::report::prompts::{fill_template, QUERY_MODEL, QUERY_PROMPT_TEMPLATE};
use crate::retrieval::{join_context, ContextRetriever, OwnerFilter};

pub const QUERY_MAX_CHUNKS: usize = 6;
pub const NO_MATCH_ANSWER: &str = "No relevant experience found.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: Option<String>,
    pub resume_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySource {
    pub content: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryAnswer {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<QuerySource>>,
}

/// Answers `request.query` from the most similar chunks, scoped to `resumeId` when given.
///
/// An empty retrieval is answered with `NO_MATCH_ANSWER` and no model call.
pub async fn answer_query(
    retriever: &ContextRetriever,
    invoker: &dyn ModelInvoker,
    request: QueryRequest,
) -> Result<QueryAnswer, PipelineError> {
    let query = request
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or(PipelineError::Validation("query"))?;
    let owner = request
        .resume_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .map(OwnerFilter::ResumeId);

    let chunks = retriever
        .search(&query, owner.as_ref(), QUERY_MAX_CHUNKS)
        .await?;

    if chunks.is_empty() {
        info!("Query: no matching chunks (owner filter: {:?})", owner);
        return Ok(QueryAnswer {
            answer: NO_MATCH_ANSWER.to_string(),
            sources: None,
        });
    }

    let context = join_context(&chunks);
    let prompt = fill_template(
        QUERY_PROMPT_TEMPLATE,
        &[
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("specificity_instruction", SPECIFICITY_INSTRUCTION),
            ("context", &context),
            ("query", &query),
        ],
    );

    let answer = invoker
        .invoke(&ModelRequest {
            system: COACH_SYSTEM,
            prompt: &prompt,
            settings: QUERY_MODEL,
            json_output: false,
        })
        .await
        .map_err(|source| PipelineError::Generation {
            stage: Stage::Answer,
            source,
        })?;

    info!("Query: answered from {} chunks", chunks.len());

    Ok(QueryAnswer {
        answer: answer.trim().to_string(),
        sources: Some(
            chunks
                .into_iter()
                .map(|c| QuerySource {
                    content: c.content,
                    similarity: c.similarity,
                })
                .collect(),
        ),
    })
}
