mod config;
mod db;
mod errors;
mod llm_client;
mod report;
mod retrieval;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreConfig};
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::retrieval::postgres::PgVectorStore;
use crate::retrieval::supabase::SupabaseStore;
use crate::retrieval::{ContextRetriever, VectorStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Coach API v{}", env!("CARGO_PKG_VERSION"));

    // One client serves both chat completions and query embeddings
    let llm = Arc::new(LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    )?);
    info!("LLM client initialized ({})", config.openai_base_url);

    let store = build_store(&config.store).await?;
    let retriever = ContextRetriever::new(store, llm.clone());

    let state = AppState {
        retriever,
        invoker: llm,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Picks the vector store backend: direct PostgreSQL when `DATABASE_URL` is set,
/// the hosted RPC endpoint otherwise.
async fn build_store(store: &StoreConfig) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match store {
        StoreConfig::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            info!("Vector store: PostgreSQL match_documents");
            Arc::new(PgVectorStore::new(pool))
        }
        StoreConfig::Supabase { url, anon_key } => {
            info!("Vector store: {url} (RPC match_documents)");
            Arc::new(SupabaseStore::new(url, anon_key.clone())?)
        }
    };
    Ok(store)
}
