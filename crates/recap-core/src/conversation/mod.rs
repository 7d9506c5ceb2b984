//! Per-chat conversation logs and reply-chain reconstruction.
//!
//! Messages are linked to the message they reply to. A new request is
//! answered with the whole chain above it as history, oldest first.

pub mod store;
pub mod thread;

pub use store::{ConversationStore, InMemoryConversationStore, LoggedMessage, SharedConversationStore};
pub use thread::{Thread, ThreadReconstructor};
