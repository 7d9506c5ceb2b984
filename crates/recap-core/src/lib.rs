pub mod budget;
pub mod captions;
pub mod conversation;
pub mod dedup;
pub mod error;
pub mod source;
pub mod tokenizer;
pub mod types;

pub use budget::{
    CostEstimate, CostEstimator, ModelLimitsRegistry, PriceTable, TextChunk,
    TextChunker,
};
pub use captions::{CaptionSegment, Transcript};
pub use conversation::{
    ConversationStore, InMemoryConversationStore, LoggedMessage, Thread, ThreadReconstructor,
};
pub use dedup::{DedupCache, DedupClaim, InMemorySeenStore, SeenStore};
pub use error::{RecapError, Result};
pub use source::{extract_video_id, extract_video_url};
pub use tokenizer::{BpeTokenizer, CharTokenizer, SharedTokenizer, TokenSequence, Tokenizer};
pub use types::{ChatId, Message, MessageId, Role};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
