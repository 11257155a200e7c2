//! Context Retriever: fetches resume chunks from the external vector store.
//!
//! The store does the similarity search; this module embeds the query, over-fetches,
//! filters by owner id client-side and truncates, keeping the store's ranking.
//!
//! `AppState` holds one `ContextRetriever`, wrapping an `Arc<dyn VectorStore>` chosen at
//! startup (`SupabaseStore` or `PgVectorStore`).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::{Embedder, LlmError};

pub mod postgres;
pub mod supabase;

/// Query used when the caller wants a representative sample of one resume,
/// not an answer to a question.
pub const NEUTRAL_QUERY: &str = "full resume overview";

/// Lower bound on rows requested when results will be filtered client-side.
const MIN_FILTERED_FETCH: usize = 20;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Owner keys stored in each chunk's metadata. Unknown keys are preserved.
/// A non-string owner key reads as absent, so the chunk matches no owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub resume_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One stored fragment of a resume, as ranked by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub similarity: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ChunkMetadata,
}

/// Which metadata key must equal the given id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerFilter {
    ResumeId(String),
    UserId(String),
}

impl OwnerFilter {
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        match self {
            OwnerFilter::ResumeId(id) => metadata.resume_id.as_deref() == Some(id.as_str()),
            OwnerFilter::UserId(id) => metadata.user_id.as_deref() == Some(id.as_str()),
        }
    }
}

impl fmt::Display for OwnerFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerFilter::ResumeId(id) => write!(f, "resumeId: {id}"),
            OwnerFilter::UserId(id) => write!(f, "userId: {id}"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("No documents found for {0}")]
    NotFound(OwnerFilter),

    #[error("Failed to embed retrieval query: {0}")]
    Embedding(#[from] LlmError),

    #[error("Failed to retrieve documents: {0}")]
    Store(#[from] StoreError),
}

// ────────────────────────────────────────────────────────────────────────────
// Store trait
// ────────────────────────────────────────────────────────────────────────────

/// The external similarity-search function. Implement this to swap backends
/// without touching the retriever or its callers.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns up to `match_count` chunks ranked by similarity to `embedding`.
    async fn match_documents(
        &self,
        embedding: &[f32],
        match_count: usize,
    ) -> Result<Vec<ContextChunk>, StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Retriever
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ContextRetriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl ContextRetriever {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Representative chunks for one owner, using the neutral query.
    /// Fails with `NotFound` when nothing matches the owner.
    pub async fn retrieve(
        &self,
        owner: &OwnerFilter,
        max_chunks: usize,
    ) -> Result<Vec<ContextChunk>, RetrievalError> {
        let chunks = self.search(NEUTRAL_QUERY, Some(owner), max_chunks).await?;
        if chunks.is_empty() {
            return Err(RetrievalError::NotFound(owner.clone()));
        }
        Ok(chunks)
    }

    /// Chunks most similar to `query`, optionally restricted to one owner.
    /// An empty result is not an error here.
    pub async fn search(
        &self,
        query: &str,
        owner: Option<&OwnerFilter>,
        max_chunks: usize,
    ) -> Result<Vec<ContextChunk>, RetrievalError> {
        let embedding = self.embedder.embed_query(query).await?;
        let match_count = fetch_count(max_chunks, owner.is_some());

        let documents = self.store.match_documents(&embedding, match_count).await?;
        let fetched = documents.len();
        let chunks = select_chunks(documents, owner, max_chunks);

        debug!(
            "Retrieved {} of {} fetched chunks (requested {}, owner filter: {:?})",
            chunks.len(),
            fetched,
            match_count,
            owner
        );

        Ok(chunks)
    }
}

/// Rows to request from the store. Filtering happens client-side, so filtered
/// requests over-fetch: 12 → 30, 6 → 20, 20 → 50.
pub fn fetch_count(max_chunks: usize, filtered: bool) -> usize {
    if filtered {
        (max_chunks * 5).div_ceil(2).max(MIN_FILTERED_FETCH)
    } else {
        max_chunks
    }
}

/// Keeps chunks owned by `owner` (all chunks when `None`), in store order, up to `max_chunks`.
pub fn select_chunks(
    documents: Vec<ContextChunk>,
    owner: Option<&OwnerFilter>,
    max_chunks: usize,
) -> Vec<ContextChunk> {
    documents
        .into_iter()
        .filter(|doc| owner.map_or(true, |o| o.matches(&doc.metadata)))
        .take(max_chunks)
        .collect()
}

/// Joins chunk contents into one prompt context block.
pub fn join_context(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Decodes raw store rows into chunks. The store returns rows of every owner, so a
/// row that cannot be decoded is skipped with a warning instead of failing the batch.
pub fn decode_rows(rows: Vec<Value>) -> Vec<ContextChunk> {
    let total = rows.len();
    let chunks: Vec<ContextChunk> = rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<ContextChunk>(row) {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                warn!("Skipping undecodable store row: {e}");
                None
            }
        })
        .collect();

    if chunks.len() < total {
        warn!("Skipped {} of {} store rows", total - chunks.len(), total);
    }
    chunks
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
