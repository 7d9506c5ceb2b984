use thiserror::Error;

use crate::types::ChatId;

/// Every outcome the summarization and chat pipelines can report besides success.
///
/// Expected outcomes (already processed, not a video link, too expensive) are
/// variants here rather than panics, so callers see them in the signature.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecapError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid token budget: {max_tokens} tokens leave no room for content after a {prompt_tokens}-token prompt")]
    InvalidBudget { max_tokens: usize, prompt_tokens: usize },

    #[error("Request is too expensive: {cost} (limit {limit})")]
    BudgetExceeded { cost: u64, limit: u64 },

    #[error("No price known for model: {0}")]
    UnknownModel(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Conversation is too long: {tokens} tokens (limit {limit})")]
    ConversationTooLong { tokens: usize, limit: usize },

    #[error("Resource {resource_id} was already processed in chat {chat_id}")]
    AlreadyProcessed { chat_id: ChatId, resource_id: String },

    #[error("No content available: {0}")]
    NoContent(String),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Access denied for user {user_id} in chat {chat_id}")]
    AccessDenied { user_id: i64, chat_id: ChatId },
}

pub type Result<T> = std::result::Result<T, RecapError>;
