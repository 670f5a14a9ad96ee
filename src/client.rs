//! Chat-completions client (OpenRouter or any OpenAI-compatible endpoint)
//!
//! One request, one reply, no retries. The narrative layer decides what a
//! failure means for the session.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::GeneratorError;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

/// Anything that can turn a message list into reply text
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, GeneratorError>;
}

/// HTTP generator for an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenRouter {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenRouter {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl Generator for OpenRouter {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, GeneratorError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
        };

        let response = self
            .http
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "Text Adventure Game")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(&request)
            .send()
            .await
            .map_err(|e| GeneratorError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Status { status: status.as_u16(), body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeneratorError::Transport(e.to_string()))?;

        extract_content(&body)
    }
}

/// Pull the first choice's message content out of a completion body
pub fn extract_content(body: &str) -> Result<String, GeneratorError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| GeneratorError::Malformed {
        raw: body.to_string(),
        reason: format!("unexpected completion envelope: {}", e),
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| GeneratorError::EmptyReply { raw: body.to_string() })
}

/// Check connectivity to the endpoint
pub async fn check_connectivity(base_url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    client
        .get(format!("{}/models", base_url.trim_end_matches('/')))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .with_context(|| format!("Failed to connect to {}", base_url))?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════
// API Types
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}
