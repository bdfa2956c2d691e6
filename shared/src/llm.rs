//! Chat-completion client for the text-generation service.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::{Config, Error, Result};

/// Anything that can turn a system preface plus instruction into raw text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiChatClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(http_client: reqwest::Client, config: &Config, api_key: Option<String>) -> Self {
        Self {
            http_client,
            endpoint: format!("{}/chat/completions", config.openai_api_base),
            api_key,
            model: config.openai_model.clone(),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiChatClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("OpenAI API key not configured".to_string()))?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.7,
            max_tokens: 1000,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!("chat completion failed: {}", status)));
        }

        let payload: Value = response.json().await?;
        Ok(assistant_text(&payload))
    }
}

/// `choices[0].message.content`, or an empty string when absent.
pub(crate) fn assistant_text(payload: &Value) -> String {
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
