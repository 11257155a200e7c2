pub mod handlers;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod query;
pub mod schema;
pub mod synthesizer;
