//! Hosted language model clients.
//!
//! Services talk to a `LanguageModel`; which provider answers is decided
//! once at startup from `AiSettings`.

mod anthropic;
mod openai;
pub mod prompts;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AiProvider, Config, AI_REQUEST_TIMEOUT_SECONDS};
use crate::domain::ChatMessage;
use crate::errors::{AppError, AppResult};

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// A single non-streaming completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, messages: Vec<ChatMessage>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            messages,
            max_tokens,
            temperature: 0.7,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Return the assistant's text reply
    async fn complete(&self, request: CompletionRequest) -> AppResult<String>;
}

/// Build the configured client, or `None` when no API key is set.
pub fn build_language_model(config: &Config) -> AppResult<Option<Arc<dyn LanguageModel>>> {
    let Some(settings) = config.ai.as_ref() else {
        return Ok(None);
    };

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(AI_REQUEST_TIMEOUT_SECONDS))
        .build()?;

    let model: Arc<dyn LanguageModel> = match settings.provider {
        AiProvider::OpenAi => Arc::new(OpenAiClient::new(http, settings)),
        AiProvider::Anthropic => Arc::new(AnthropicClient::new(http, settings)),
    };

    tracing::info!(
        provider = ?settings.provider,
        model = %settings.model,
        "Language model configured"
    );
    Ok(Some(model))
}

/// Turn a non-success provider response into an error carrying its body
async fn provider_error(provider: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    AppError::ai(format!("{} returned {}: {}", provider, status, body))
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiSettings;

    #[test]
    fn test_endpoint_joins_cleanly() {
        assert_eq!(
            endpoint("https://api.openai.com/", "/v1/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint("http://localhost:8080", "/v1/messages"),
            "http://localhost:8080/v1/messages"
        );
    }

    #[test]
    fn test_no_settings_means_no_model() {
        let config = Config::with_secret("a-test-secret-that-is-long-enough!!");
        assert!(build_language_model(&config).unwrap().is_none());
    }

    #[test]
    fn test_settings_build_a_model() {
        let mut config = Config::with_secret("a-test-secret-that-is-long-enough!!");
        config.ai = Some(AiSettings::new(AiProvider::Anthropic, "key", "model"));
        assert!(build_language_model(&config).unwrap().is_some());
    }
}
