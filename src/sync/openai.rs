//! Chat-completions provider
//!
//! Sends rendered prompts to an OpenAI-compatible `/chat/completions`
//! endpoint and returns the assistant message as the raw reply.
//!
//! # Authentication
//!
//! The provider loads the API key from the `OPENAI_API_KEY` environment
//! variable. `OPENAI_MODEL` and `OPENAI_BASE_URL` optionally override the
//! model (default `gpt-4o`) and the endpoint.
//!
//! # Example
//!
//! ```ignore
//! let provider = OpenAiProvider::from_env()?;
//! let raw = provider.complete(&prompt).await?;
//! let parsed = parse_response(&raw);
//! ```

use crate::sync::error::{SyncError, SyncResult};
use crate::sync::prompt::PromptSpec;
use crate::sync::translator::TranslationProvider;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Clone)]
pub struct OpenAiProvider {
    /// API key for bearer authentication
    api_key: String,
    /// HTTP client for async requests
    client: reqwest::Client,
    /// Base URL of the API, without the `/chat/completions` suffix
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    /// Maximum characters of input text accepted in one prompt
    const MAX_INPUT_CHARS: usize = 30_000;

    /// Create a new chat-completions provider
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token for the API
    ///
    /// # Returns
    ///
    /// A provider using the default model and base URL, or
    /// `SyncError::ConfigError` if the key is blank.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let provider = OpenAiProvider::new("sk-...".to_string())?
    ///     .with_model("gpt-4o-mini");
    /// ```
    pub fn new(api_key: String) -> SyncResult<Self> {
        if api_key.trim().is_empty() {
            return Err(SyncError::ConfigError("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Create a provider from `OPENAI_API_KEY`, `OPENAI_MODEL` and `OPENAI_BASE_URL`
    ///
    /// Only the key is required; the other two override the defaults when set.
    pub fn from_env() -> SyncResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            SyncError::ConfigError("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let mut provider = Self::new(api_key)?;
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            provider = provider.with_model(model);
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            provider = provider.with_base_url(base_url);
        }
        Ok(provider)
    }

    /// Use a different chat model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point at another OpenAI-compatible server; a trailing `/` is dropped
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(&self, prompt: &PromptSpec) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt.render() }],
        })
    }

    /// Pull the assistant text out of a chat-completions response
    fn extract_content(json: &serde_json::Value) -> SyncResult<String> {
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                SyncError::ProviderError(
                    "Invalid API response: missing 'choices[0].message.content'".to_string(),
                )
            })
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl TranslationProvider for OpenAiProvider {
    async fn complete(&self, prompt: &PromptSpec) -> SyncResult<String> {
        if prompt.input().chars().count() > Self::MAX_INPUT_CHARS {
            return Err(SyncError::ProviderError(format!(
                "Text exceeds maximum length of {} characters",
                Self::MAX_INPUT_CHARS
            )));
        }

        debug!(model = %self.model, single_word = prompt.is_single_word(), "sending prompt");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => SyncError::RateLimited(error_text),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    SyncError::ConfigError(format!("API rejected credentials ({}): {}", status, error_text))
                }
                _ => SyncError::ProviderError(format!("API error ({}): {}", status, error_text)),
            });
        }

        let json: serde_json::Value = response.json().await.map_err(|e| {
            SyncError::ProviderError(format!("Failed to parse API response: {}", e))
        })?;

        Self::extract_content(&json)
    }

    fn provider_name(&self) -> &str {
        "OpenAI Chat Completions"
    }
}
