use anyhow::{Context, Result};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Where chunk retrieval runs `match_documents`.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// Direct PostgreSQL connection (pgvector).
    Postgres { database_url: String },
    /// Hosted REST endpoint exposing the function as an RPC.
    Supabase { url: String, anon_key: String },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub store: StoreConfig,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let store = match optional_env("DATABASE_URL") {
            Some(database_url) => StoreConfig::Postgres { database_url },
            None => StoreConfig::Supabase {
                url: require_env_either("SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL")?,
                anon_key: require_env_either("SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY")?,
            },
        };

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            store,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Accepts either the server-side name or the legacy public one.
fn require_env_either(primary: &str, fallback: &str) -> Result<String> {
    optional_env(primary)
        .or_else(|| optional_env(fallback))
        .with_context(|| {
            format!("Required environment variable '{primary}' (or '{fallback}') is not set")
        })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
