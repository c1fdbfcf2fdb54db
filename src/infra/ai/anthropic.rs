//! Anthropic Messages API client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{endpoint, provider_error, CompletionRequest, LanguageModel};
use crate::config::{AiSettings, ANTHROPIC_VERSION};
use crate::errors::{AppError, AppResult};

pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl AnthropicClient {
    pub fn new(http: reqwest::Client, settings: &AiSettings) -> Self {
        Self {
            http,
            api_key: settings.api_key().to_string(),
            model: settings.model.clone(),
            url: endpoint(&settings.base_url, "/v1/messages"),
        }
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct MessagesReply {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

fn build_body<'a>(model: &'a str, request: &'a CompletionRequest) -> MessagesBody<'a> {
    MessagesBody {
        model,
        system: &request.system,
        messages: request
            .messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
    }
}

/// Concatenate the text blocks of a reply
fn reply_text(reply: MessagesReply) -> String {
    reply
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("")
}

#[async_trait]
impl LanguageModel for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> AppResult<String> {
        let response = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&build_body(&self.model, &request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error("Anthropic", response).await);
        }

        let text = reply_text(response.json().await?);
        if text.trim().is_empty() {
            return Err(AppError::ai("Anthropic reply contained no text"));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChatMessage;

    #[test]
    fn test_body_keeps_system_separate() {
        let request = CompletionRequest::new("rules", vec![ChatMessage::user("hi")], 64);
        let body = serde_json::to_value(build_body("claude-test", &request)).unwrap();

        assert_eq!(body["system"], "rules");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn test_reply_text_joins_text_blocks() {
        let reply: MessagesReply = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"Hello "},{"type":"tool_use","id":"t"},{"type":"text","text":"there"}]}"#,
        )
        .unwrap();
        assert_eq!(reply_text(reply), "Hello there");
    }
}
