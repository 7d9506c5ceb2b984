use std::collections::HashSet;

use crate::conversation::store::{LoggedMessage, SharedConversationStore};
use crate::error::{RecapError, Result};
use crate::tokenizer::SharedTokenizer;
use crate::types::{ChatId, Message, MessageId};

/// A reply chain in chronological order (oldest first).
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    pub entries: Vec<LoggedMessage>,
    /// Tokens of all contents joined with spaces
    pub token_count: usize,
}

impl Thread {
    /// Messages to send to the chat-completion backend, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rebuilds conversation history by following reply pointers.
///
/// # Algorithm
///
/// 1. Append the new message to the chat's log
/// 2. Follow `parent_reply_id` until it points outside the log, or back at
///    a message already visited (a malformed cyclic graph is cut there)
/// 3. Reverse to oldest-first order
/// 4. Reject the thread when its joined contents exceed the token budget
pub struct ThreadReconstructor {
    store: SharedConversationStore,
    tokenizer: SharedTokenizer,
    max_tokens: usize,
}

impl ThreadReconstructor {
    pub fn new(store: SharedConversationStore, tokenizer: SharedTokenizer, max_tokens: usize) -> Self {
        Self {
            store,
            tokenizer,
            max_tokens,
        }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Log a user message and return the thread ending with it.
    pub fn build_thread(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        content: &str,
        reply_to: Option<MessageId>,
    ) -> Result<Thread> {
        self.build_thread_with_reserve(chat_id, message_id, content, reply_to, 0)
    }

    /// Like [`build_thread`](Self::build_thread), with `reserved_tokens`
    /// taken out of the budget for content sent alongside the thread.
    pub fn build_thread_with_reserve(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        content: &str,
        reply_to: Option<MessageId>,
        reserved_tokens: usize,
    ) -> Result<Thread> {
        let entry = LoggedMessage::new(message_id, Message::user(content), reply_to);
        self.store.append(chat_id, entry.clone());

        let mut entries = vec![entry];
        let mut visited = HashSet::from([message_id]);
        let mut next = reply_to;

        while let Some(parent_id) = next {
            if !visited.insert(parent_id) {
                tracing::warn!(
                    "Reply cycle in chat {} at message {}, treating it as the root",
                    chat_id,
                    parent_id
                );
                break;
            }
            let Some(parent) = self.store.get(chat_id, parent_id) else {
                break;
            };
            next = parent.parent_reply_id;
            entries.push(parent);
        }

        entries.reverse();

        let joined = entries
            .iter()
            .map(|e| e.message.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let token_count = self.tokenizer.count(&joined);
        let limit = self.max_tokens.saturating_sub(reserved_tokens);

        tracing::info!("The length is {}", token_count);
        if token_count > limit {
            return Err(RecapError::ConversationTooLong {
                tokens: token_count,
                limit,
            });
        }

        Ok(Thread {
            entries,
            token_count,
        })
    }

    /// Log a delivered assistant reply so later messages can reply to it.
    pub fn record_reply(
        &self,
        chat_id: ChatId,
        reply_id: MessageId,
        content: &str,
        parent_id: MessageId,
    ) {
        self.store.append(
            chat_id,
            LoggedMessage::new(reply_id, Message::assistant(content), Some(parent_id)),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::conversation::store::{ConversationStore, InMemoryConversationStore};
    use crate::tokenizer::CharTokenizer;
    use crate::types::Role;

    fn reconstructor(max_tokens: usize) -> (Arc<InMemoryConversationStore>, ThreadReconstructor) {
        let store = Arc::new(InMemoryConversationStore::new());
        let threads = ThreadReconstructor::new(store.clone(), Arc::new(CharTokenizer::new()), max_tokens);
        (store, threads)
    }

    fn contents(thread: &Thread) -> Vec<&str> {
        thread.entries.iter().map(|e| e.message.content.as_str()).collect()
    }

    #[test]
    fn follows_reply_chain_oldest_first() {
        let (store, threads) = reconstructor(1_000);
        store.append(1, LoggedMessage::new(1, Message::user("A"), None));
        store.append(1, LoggedMessage::new(2, Message::user("B"), Some(1)));
        store.append(1, LoggedMessage::new(3, Message::user("C"), Some(2)));

        let thread = threads.build_thread(1, 4, "D", Some(3)).unwrap();

        assert_eq!(contents(&thread), vec!["A", "B", "C", "D"]);
        // "A B C D"
        assert_eq!(thread.token_count, 7);
    }

    #[test]
    fn new_message_without_reply_starts_a_thread() {
        let (store, threads) = reconstructor(1_000);
        store.append(1, LoggedMessage::new(1, Message::user("older"), None));

        let thread = threads.build_thread(1, 2, "fresh", None).unwrap();

        assert_eq!(contents(&thread), vec!["fresh"]);
        assert_eq!(store.len(1), 2);
    }

    #[test]
    fn missing_parent_is_treated_as_root() {
        let (_store, threads) = reconstructor(1_000);
        let thread = threads.build_thread(1, 5, "reply to unknown", Some(42)).unwrap();
        assert_eq!(thread.len(), 1);
    }

    #[test]
    fn reply_cycle_terminates() {
        let (store, threads) = reconstructor(1_000);
        store.append(1, LoggedMessage::new(1, Message::user("A"), Some(2)));
        store.append(1, LoggedMessage::new(2, Message::user("B"), Some(1)));

        let thread = threads.build_thread(1, 3, "C", Some(2)).unwrap();

        assert_eq!(contents(&thread), vec!["A", "B", "C"]);
    }

    #[test]
    fn self_reply_terminates() {
        let (_store, threads) = reconstructor(1_000);
        let thread = threads.build_thread(1, 9, "me", Some(9)).unwrap();
        assert_eq!(contents(&thread), vec!["me"]);
    }

    #[test]
    fn assistant_replies_keep_their_role() {
        let (_store, threads) = reconstructor(1_000);
        threads.build_thread(1, 1, "question", None).unwrap();
        threads.record_reply(1, 2, "answer", 1);

        let thread = threads.build_thread(1, 3, "follow-up", Some(2)).unwrap();
        let roles: Vec<Role> = thread.messages().iter().map(|m| m.role).collect();

        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
    }

    #[test]
    fn too_long_thread_is_rejected_with_its_size() {
        let (store, threads) = reconstructor(10);
        store.append(1, LoggedMessage::new(1, Message::user("abcdef"), None));

        let err = threads.build_thread(1, 2, "ghij", Some(1)).unwrap_err();

        // "abcdef ghij" = 11 chars
        assert_eq!(err, RecapError::ConversationTooLong { tokens: 11, limit: 10 });
        // The message is still logged, as the caller may reply to it later
        assert!(store.get(1, 2).is_some());
    }

    #[test]
    fn reserve_shrinks_the_budget() {
        let (_store, threads) = reconstructor(10);
        assert!(threads.build_thread_with_reserve(1, 1, "abcdef", None, 0).is_ok());

        let err = threads
            .build_thread_with_reserve(1, 2, "abcdef", None, 5)
            .unwrap_err();
        assert!(matches!(err, RecapError::ConversationTooLong { tokens: 6, limit: 5 }));
    }
}
