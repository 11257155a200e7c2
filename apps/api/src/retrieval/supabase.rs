//! `match_documents` over the hosted REST endpoint (`/rest/v1/rpc/...`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::{decode_rows, ContextChunk, StoreError, VectorStore};

const MATCH_FUNCTION: &str = "match_documents";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct MatchRequest<'a> {
    query_embedding: &'a [f32],
    match_count: usize,
}

#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    rpc_url: String,
    anon_key: String,
}

impl SupabaseStore {
    pub fn new(url: &str, anon_key: String) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            rpc_url: rpc_url(url),
            anon_key,
        })
    }
}

#[async_trait]
impl VectorStore for SupabaseStore {
    async fn match_documents(
        &self,
        embedding: &[f32],
        match_count: usize,
    ) -> Result<Vec<ContextChunk>, StoreError> {
        let response = self
            .client
            .post(&self.rpc_url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&MatchRequest {
                query_embedding: embedding,
                match_count,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let rows = response.json::<Vec<Value>>().await?;
        Ok(decode_rows(rows))
    }
}

fn rpc_url(base: &str) -> String {
    format!("{}/rest/v1/rpc/{MATCH_FUNCTION}", base.trim_end_matches('/'))
}
