//! Chat-completion backend.
//!
//! [`CompletionBackend`] is the seam between the generator and the network.
//! [`HttpBackend`] talks to an OpenAI-compatible `/chat/completions` endpoint
//! with a blocking client and a fixed per-request timeout.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::prompt::Prompt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Timeout applied to every backend request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system` or `user`
    pub role: String,
    /// Message text
    pub content: String,
}

/// Request body for a chat completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Ceiling on generated tokens
    pub max_tokens: u32,
    /// System message followed by user message
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Builds a request from the settings and a rendered prompt.
    #[must_use]
    pub fn new(settings: &Settings, prompt: Prompt) -> Self {
        Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user,
                },
            ],
        }
    }
}

/// Sends a chat request and returns the primary message content.
pub trait CompletionBackend {
    /// Performs one blocking completion call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Backend`] when the call fails and
    /// [`Error::MalformedResponse`] when the reply has no message content.
    fn complete(&self, request: &ChatRequest) -> Result<String>;
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Blocking HTTP client for an OpenAI-compatible chat endpoint.
pub struct HttpBackend {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl HttpBackend {
    /// Creates a client bound to `endpoint` and authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::backend(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

impl CompletionBackend for HttpBackend {
    fn complete(&self, request: &ChatRequest) -> Result<String> {
        debug!("POST {} (model {})", self.endpoint, request.model);

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(|e| Error::backend(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::backend(format!("server returned HTTP {status}")));
        }

        let body: ChatResponse = resp
            .json()
            .map_err(|e| Error::malformed(format!("failed to parse completion: {e}")))?;

        extract_content(body)
    }
}

fn extract_content(body: ChatResponse) -> Result<String> {
    body.choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| Error::malformed("response has no choices"))
}
