use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::types::{ChatId, Message, MessageId};

/// A message as kept in a chat's conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedMessage {
    pub id: MessageId,
    pub message: Message,
    /// The message this one replies to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_reply_id: Option<MessageId>,
}

impl LoggedMessage {
    pub fn new(id: MessageId, message: Message, parent_reply_id: Option<MessageId>) -> Self {
        Self {
            id,
            message,
            parent_reply_id,
        }
    }
}

/// Append-only storage of conversation logs, keyed by chat.
///
/// Implementations must make `append` atomic per chat so that concurrent
/// requests in one chat never lose each other's entries.
pub trait ConversationStore: Send + Sync {
    /// Add (or replace) a message in the chat's log.
    fn append(&self, chat_id: ChatId, entry: LoggedMessage);

    /// Look up a message by id.
    fn get(&self, chat_id: ChatId, message_id: MessageId) -> Option<LoggedMessage>;

    /// Number of messages logged for a chat.
    fn len(&self, chat_id: ChatId) -> usize;
}

pub type SharedConversationStore = Arc<dyn ConversationStore>;

/// Process-lifetime store. Nothing is ever evicted.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    chats: DashMap<ChatId, HashMap<MessageId, LoggedMessage>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn append(&self, chat_id: ChatId, entry: LoggedMessage) {
        // The entry guard holds the shard lock for this chat while inserting.
        self.chats.entry(chat_id).or_default().insert(entry.id, entry);
    }

    fn get(&self, chat_id: ChatId, message_id: MessageId) -> Option<LoggedMessage> {
        self.chats
            .get(&chat_id)
            .and_then(|log| log.get(&message_id).cloned())
    }

    fn len(&self, chat_id: ChatId) -> usize {
        self.chats.get(&chat_id).map_or(0, |log| log.len())
    }
}
