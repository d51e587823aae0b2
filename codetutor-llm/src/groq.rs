use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

/// Default OpenAI-compatible endpoint (Groq).
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

/// Chat-completion provider for OpenAI-compatible endpoints, configured for
/// Groq by default.
///
/// One request per [`chat`](LlmProvider::chat) call; no retries, no
/// streaming. A 429 surfaces as [`LlmError::RateLimited`] and every other
/// non-success status as an error carrying the status code.
pub struct GroqProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl fmt::Debug for GroqProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl GroqProvider {
    pub fn new(api_key: String, mut base_url: String, model: String, max_tokens: u32) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url,
            model,
            max_tokens,
        }
    }

    /// Build a provider for the given model, taking the API key from the
    /// hosting environment (`GROQ_API_KEY`).
    pub fn from_env(base_url: String, model: String, max_tokens: u32) -> Result<Self, LlmError> {
        let api_key =
            std::env::var(API_KEY_VAR).map_err(|_| LlmError::MissingApiKey { var: API_KEY_VAR })?;
        Ok(Self::new(api_key, base_url, model, max_tokens))
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    async fn send_request(&self, messages: &[Message]) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.map_err(LlmError::Http)?;

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }

        if !status.is_success() {
            tracing::error!("chat completion API error {status}: {text}");
            return Err(LlmError::Other(format!(
                "chat completion request failed (status {status})"
            )));
        }

        let resp: ChatCompletionResponse = serde_json::from_str(&text)?;

        resp.choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or(LlmError::EmptyResponse { provider: "groq" })
    }
}

impl LlmProvider for GroqProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.send_request(messages).await
    }

    fn name(&self) -> &str {
        "groq"
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}
