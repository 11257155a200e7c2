//! `match_documents` called directly over PostgreSQL (pgvector).

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::{FromRow, PgPool};

use super::{decode_rows, ContextChunk, StoreError, VectorStore};

const MATCH_QUERY: &str =
    "SELECT content, metadata, similarity FROM match_documents($1::vector, $2)";

/// Columns are nullable; rows are decoded with the same rules as the RPC backend.
#[derive(Debug, FromRow)]
struct MatchRow {
    content: Option<String>,
    metadata: Option<Value>,
    similarity: Option<f64>,
}

impl From<MatchRow> for Value {
    fn from(row: MatchRow) -> Self {
        json!({
            "content": row.content,
            "metadata": row.metadata,
            "similarity": row.similarity,
        })
    }
}

#[derive(Clone)]
pub struct PgVectorStore {
    pool: PgPool,
}

impl PgVectorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn match_documents(
        &self,
        embedding: &[f32],
        match_count: usize,
    ) -> Result<Vec<ContextChunk>, StoreError> {
        let rows = sqlx::query_as::<_, MatchRow>(MATCH_QUERY)
            .bind(embedding.to_vec())
            .bind(i32::try_from(match_count).unwrap_or(i32::MAX))
            .fetch_all(&self.pool)
            .await?;

        Ok(decode_rows(rows.into_iter().map(Value::from).collect()))
    }
}
