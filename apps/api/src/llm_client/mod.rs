/// LLM client: the language-model port and its Mistral chat-completions adapter.
///
/// ARCHITECTURAL RULE: conversation and assessment code depend only on the
/// `LanguageModel` trait. Only `LlmClient` talks to the provider over HTTP.
///
/// One `generate` call is exactly one HTTP request. There is no transport
/// retry loop; the assessment use case owns the single repair round-trip.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

pub mod prompts;
#[cfg(test)]
pub mod testing;

pub const DEFAULT_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "mistral-large-latest";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("language model is not configured (missing MISTRAL_API_KEY)")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Message records
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat turn, as sent to the model and as kept in conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Port
// ────────────────────────────────────────────────────────────────────────────

/// The language-model port. Returns raw text that callers must not assume
/// is valid JSON.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Mistral adapter
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

/// HTTP-backed language model. Constructed even without an API key so the
/// service can start; every call then fails with `LlmError::NotConfigured`.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: Option<String>, api_url: String, model: String, timeout: Duration) -> Self {
        if api_key.is_none() {
            error!("Mistral API key is missing; assessments will fail until it is set");
        }
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            api_url,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::NotConfigured)?;

        let request_body = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("LLM API returned {}: {}", status, body);
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let chat: ChatResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat.text()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Narrows model output to the outermost `{ ... }`: trims whitespace, then
/// slices from the first `{` and to the last `}` when the text does not
/// already start or end with them. Code fences and chatter around the object
/// fall away.
pub fn extract_json_object(text: &str) -> &str {
    let mut text = text.trim();
    if !text.starts_with('{') {
        if let Some(start) = text.find('{') {
            text = &text[start..];
        }
    }
    if !text.ends_with('}') {
        if let Some(end) = text.rfind('}') {
            text = &text[..=end];
        }
    }
    text
}
