//! Chat completion backend
//!
//! The [`ChatBackend`] trait is the seam between the classification pipeline
//! and the inference provider: the pipeline composes a schema-constrained
//! request, the backend returns the raw assistant text. [`OpenAiBackend`]
//! targets any OpenAI-compatible `/chat/completions` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A completion request with a structured-output constraint
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,

    /// Sampling temperature (0.0 for deterministic sampling)
    pub temperature: f32,

    /// System + user message pair
    pub messages: Vec<ChatMessage>,

    /// `response_format` envelope constraining the output shape
    pub response_schema: Value,
}

/// Trait for chat completion backends
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Execute the completion and return the raw assistant text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Get the backend name
    fn name(&self) -> &str;
}

/// OpenAI-compatible chat completions backend
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiBackend {
    /// Create a backend against the given base URL (e.g. `https://api.openai.com/v1`).
    ///
    /// The per-request timeout bounds total wall-clock time per classification
    /// at `timeout x max_attempts`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Sending completion request to {}", url);

        let body = serde_json::json!({
            "model": request.model,
            "temperature": request.temperature,
            "messages": request.messages,
            "response_format": request.response_schema,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            debug!("Provider returned {}: {}", status, detail);
            return Err(Error::backend(format!("provider returned status {status}")));
        }

        let envelope: CompletionResponse = response.json().await?;
        envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::backend("provider response contained no assistant content"))
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// =============================================================================
// Provider response structures
// =============================================================================

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
