use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::matching::scorer::{EligibilityGate, ScoreWeights};

/// Application configuration loaded from environment variables.
/// Fails startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub embedding_api_url: String,
    pub embedding_api_key: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub index_dir: PathBuf,
    /// The four match weights as one atomic vector; never set individually.
    pub weights: ScoreWeights,
    pub gate: EligibilityGate,
    pub top_k_candidates: usize,
    pub qa_top_k: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let weights = match std::env::var("MATCH_WEIGHTS") {
            Ok(raw) => ScoreWeights::parse(&raw).context("MATCH_WEIGHTS is invalid")?,
            Err(_) => ScoreWeights::default(),
        };

        let gate = EligibilityGate {
            skill_threshold: optional_env("SKILL_THRESHOLD", 0.3)?,
            experience_threshold: optional_env("EXPERIENCE_THRESHOLD", 0.5)?,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            embedding_api_url: std::env::var("EMBEDDING_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            embedding_api_key: require_env("EMBEDDING_API_KEY")?,
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embedding_dimensions: optional_env("EMBEDDING_DIMENSIONS", 384)?,
            index_dir: PathBuf::from(
                std::env::var("INDEX_DIR").unwrap_or_else(|_| "vector_index".to_string()),
            ),
            weights,
            gate,
            top_k_candidates: optional_env("TOP_K_CANDIDATES", 5)?,
            qa_top_k: optional_env("QA_TOP_K", 5)?,
            port: optional_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid value")),
        Err(_) => Ok(default),
    }
}
