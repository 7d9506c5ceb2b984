//! Free chat over reply chains.

use dashmap::DashMap;
use recap_core::{ChatId, Message, MessageId, RecapError, Result, SharedTokenizer, ThreadReconstructor};
use recap_llm::SharedProvider;

/// Answers chat messages using the reply chain they belong to as history.
pub struct ChatService {
    provider: SharedProvider,
    threads: ThreadReconstructor,
    tokenizer: SharedTokenizer,
    model: String,
    system_prompts: DashMap<ChatId, String>,
}

impl ChatService {
    pub fn new(
        provider: SharedProvider,
        threads: ThreadReconstructor,
        tokenizer: SharedTokenizer,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            threads,
            tokenizer,
            model: model.into(),
            system_prompts: DashMap::new(),
        }
    }

    /// Set the system prompt sent ahead of every thread in `chat_id`.
    /// An empty prompt clears it.
    pub fn set_system_prompt(&self, chat_id: ChatId, prompt: &str) {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            self.system_prompts.remove(&chat_id);
        } else {
            tracing::info!("System prompt set for chat {}", chat_id);
            self.system_prompts.insert(chat_id, prompt.to_string());
        }
    }

    pub fn system_prompt(&self, chat_id: ChatId) -> Option<String> {
        self.system_prompts.get(&chat_id).map(|p| p.value().clone())
    }

    /// Log the message and answer it with its reply chain as history.
    ///
    /// Fails with [`RecapError::ConversationTooLong`] when the chain plus the
    /// system prompt no longer fits; the caller should start a new thread.
    pub async fn reply(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<Message> {
        let system_prompt = self.system_prompt(chat_id);
        let reserved = system_prompt
            .as_deref()
            .map(|p| self.tokenizer.count(p))
            .unwrap_or(0);

        let thread = self
            .threads
            .build_thread_with_reserve(chat_id, message_id, text, reply_to, reserved)?;

        let mut messages = Vec::with_capacity(thread.len() + 1);
        if let Some(prompt) = system_prompt {
            messages.push(Message::system(prompt));
        }
        messages.extend(thread.messages());

        let reply = self
            .provider
            .chat_completion(&messages, Some(&self.model))
            .await
            .map_err(|e| {
                tracing::error!("Chat completion failed in chat {}: {}", chat_id, e);
                RecapError::from(e)
            })?;

        Ok(Message::assistant(reply.content.trim()))
    }

    /// Log a delivered reply so that answering it continues the chain.
    pub fn record_reply(&self, chat_id: ChatId, reply_id: MessageId, content: &str, parent_id: MessageId) {
        self.threads.record_reply(chat_id, reply_id, content, parent_id);
    }
}
