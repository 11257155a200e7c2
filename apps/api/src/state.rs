use std::sync::Arc;

use crate::llm_client::ModelInvoker;
use crate::retrieval::ContextRetriever;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub retriever: ContextRetriever,
    /// Pluggable text-generation backend. Production: `LlmClient`.
    pub invoker: Arc<dyn ModelInvoker>,
}
