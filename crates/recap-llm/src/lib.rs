pub mod provider;
pub mod providers;

pub use provider::{LLMError, LLMProvider, Result, SharedProvider};
pub use providers::OpenAIProvider;
