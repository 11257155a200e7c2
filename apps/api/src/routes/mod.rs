pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::report::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Career report
        .route("/api/v1/agents/report", post(handlers::handle_generate_report))
        .route("/api/v1/agents/resume", post(handlers::handle_analyze_resume))
        // Ad-hoc questions
        .route("/api/v1/query", post(handlers::handle_query))
        .with_state(state)
}
