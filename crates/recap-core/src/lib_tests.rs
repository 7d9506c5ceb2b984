#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        CharTokenizer, ConversationStore, DedupCache, InMemoryConversationStore, LoggedMessage,
        Message, RecapError, Role, TextChunker, ThreadReconstructor, Tokenizer,
    };

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("Hello");
        assert_eq!(msg.content, "Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(Message::system("s").role.as_str(), "system");
        assert_eq!(Message::assistant("a").role.as_str(), "assistant");
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_value(Message::assistant("Hi")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "Hi");
    }

    #[test]
    fn test_logged_message_omits_missing_parent() {
        let entry = LoggedMessage::new(1, Message::user("root"), None);
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("parent_reply_id").is_none());
    }

    #[test]
    fn test_chunks_rejoin_for_many_budgets() {
        let tokenizer = CharTokenizer::new();
        let chunker = TextChunker::new(&tokenizer);
        let text = "1\n00:00:00,000 --> 00:00:02,000\nПривет, мир!\n\n".repeat(13);

        for budget in 1..60 {
            let chunks = chunker.split(&text, "", budget).unwrap();
            let total: usize = chunks.iter().map(|c| tokenizer.count(&c.text)).sum();
            let rejoined: String = chunks.iter().map(|c| c.text.as_str()).collect();

            assert_eq!(total, tokenizer.count(&text), "budget {budget}");
            assert_eq!(rejoined, text, "budget {budget}");
        }
    }

    #[test]
    fn test_thread_from_reply_graph() {
        let store = Arc::new(InMemoryConversationStore::new());
        store.append(1, LoggedMessage::new(1, Message::user("A"), None));
        store.append(1, LoggedMessage::new(2, Message::user("B"), Some(1)));
        store.append(1, LoggedMessage::new(3, Message::user("C"), Some(2)));
        let threads = ThreadReconstructor::new(store, Arc::new(CharTokenizer::new()), 100);

        let thread = threads.build_thread(1, 4, "D", Some(3)).unwrap();
        let contents: Vec<String> = thread.messages().into_iter().map(|m| m.content).collect();

        assert_eq!(contents, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_dedup_once_then_reject_then_override() {
        let cache = DedupCache::default();

        let claim = cache.claim(1, "v1", false).expect("first request passes");
        claim.commit(chrono::Utc::now());

        assert!(matches!(
            cache.check_and_maybe_reject(1, "v1", false),
            Err(RecapError::AlreadyProcessed { .. })
        ));
        assert!(cache.check_and_maybe_reject(1, "v1", true).is_ok());
    }
}
