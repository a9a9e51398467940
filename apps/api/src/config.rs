use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::conversation::ConversationMode;
use crate::llm_client::{DEFAULT_API_URL, DEFAULT_MODEL};

/// Application configuration loaded from environment variables.
/// Secrets are optional at startup; a missing model key surfaces as a
/// hard failure on the first language-model call instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub mistral_api_key: Option<String>,
    pub mistral_model: String,
    pub mistral_api_url: String,
    pub llm_timeout: Duration,
    pub google_places_api_key: Option<String>,
    pub conversation_mode: ConversationMode,
    pub session_idle_ttl: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            mistral_api_key: optional_env("MISTRAL_API_KEY"),
            mistral_model: optional_env("MISTRAL_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            mistral_api_url: optional_env("MISTRAL_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            llm_timeout: Duration::from_secs(
                optional_env("LLM_TIMEOUT_SECS")
                    .unwrap_or_else(|| "60".to_string())
                    .parse::<u64>()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            google_places_api_key: optional_env("GOOGLE_PLACES_API_KEY"),
            conversation_mode: optional_env("CONVERSATION_MODE")
                .map(|m| m.parse::<ConversationMode>())
                .transpose()
                .map_err(|e| anyhow!(e))
                .context("CONVERSATION_MODE must be 'scripted' or 'adaptive'")?
                .unwrap_or_default(),
            session_idle_ttl: Duration::from_secs(
                optional_env("SESSION_IDLE_TTL_SECS")
                    .unwrap_or_else(|| "7200".to_string())
                    .parse::<u64>()
                    .context("SESSION_IDLE_TTL_SECS must be a whole number of seconds")?,
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
