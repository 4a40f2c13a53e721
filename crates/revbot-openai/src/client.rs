//! Chat completions client
//!
//! Talks to the OpenAI chat completions API (or anything wire-compatible
//! with it). Uses the secrecy crate to protect the API key in memory.

use revbot_core::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Default timeout for completion requests
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Completions API client
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: SecretString,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client with default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(api_key, OpenAiClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(api_key: impl Into<String>, config: OpenAiClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            api_key: SecretString::new(api_key.into()),
            base_url: config.base_url,
            model: config.model,
            client,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Requests a completion for a single user prompt.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 1.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(Error::Completion(format!("API error ({status}): {error}")));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Completion("response contained no choices".to_string()))
    }

    /// Like [`complete`](Self::complete), but collapses failures to an empty
    /// string after logging them. Review flows treat a missing suggestion as
    /// tolerable.
    pub async fn complete_or_empty(&self, prompt: &str) -> String {
        match self.complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Completion request failed, continuing with empty suggestion");
                String::new()
            }
        }
    }
}

/// Configuration for the completions client
pub struct OpenAiClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Model requested for every completion
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for OpenAiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    content: String,
}
