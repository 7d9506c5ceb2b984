//! OpenAI-compatible chat completions provider.
//!
//! DeepSeek, OpenAI and most hosted gateways accept the same
//! `/chat/completions` request shape, so one provider covers them all.

use async_trait::async_trait;
use recap_core::{Message, Role};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::provider::{LLMError, LLMProvider, Result};

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

/// Build a non-streaming chat completions request body.
pub fn build_request_body(model: &str, messages: &[Message]) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|m| {
            json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        })
        .collect();

    json!({
        "model": model,
        "messages": messages,
    })
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    role: Role,
    content: Option<String>,
}

fn parse_response(body: &str) -> Result<Message> {
    let response: ChatCompletionResponse = serde_json::from_str(body)?;
    let message = response
        .choices
        .into_iter()
        .next()
        .ok_or(LLMError::EmptyResponse)?
        .message;

    let content = message.content.ok_or(LLMError::EmptyResponse)?;
    Ok(Message {
        role: message.role,
        content: content.trim().to_string(),
    })
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat_completion(&self, messages: &[Message], model: Option<&str>) -> Result<Message> {
        // Use provided model or fall back to default
        let model_to_use = model.unwrap_or(&self.model);

        if model.is_some() {
            log::debug!(
                "OpenAI provider using override model '{}' (default: '{}')",
                model_to_use,
                self.model
            );
        }

        let body = build_request_body(model_to_use, messages);
        log::debug!("Request body messages count: {}", messages.len());

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await?;
            log::warn!("Chat completion failed with HTTP {}", status);
            return Err(LLMError::Api(format!("HTTP {}: {}", status, text)));
        }

        let text = response.text().await?;
        parse_response(&text)
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}
