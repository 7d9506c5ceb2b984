use std::sync::Arc;

use async_trait::async_trait;
use recap_core::{Message, RecapError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Empty response from model")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, LLMError>;

impl From<LLMError> for RecapError {
    fn from(err: LLMError) -> Self {
        RecapError::Backend(err.to_string())
    }
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Run one chat completion and return the model's reply.
    ///
    /// # Arguments
    /// * `messages` - Ordered chat messages
    /// * `model` - Optional model override. If None, uses the provider's default model
    ///
    /// A failed call is returned as is; nothing is retried.
    async fn chat_completion(&self, messages: &[Message], model: Option<&str>) -> Result<Message>;

    /// Model used when no override is given.
    fn default_model(&self) -> &str;
}

pub type SharedProvider = Arc<dyn LLMProvider>;
