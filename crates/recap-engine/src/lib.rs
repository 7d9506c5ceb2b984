pub mod access;
pub mod captions;
pub mod chat;
pub mod config;
pub mod delivery;
pub mod prompts;
pub mod summarizer;
pub mod video;

pub use access::{AccessPolicy, Caller};
pub use captions::{CaptionSource, DirectoryCaptionSource};
pub use chat::ChatService;
pub use config::RecapConfig;
pub use delivery::split_for_delivery;
pub use prompts::PromptSet;
pub use summarizer::{MapReduceSummarizer, Summary};
pub use video::VideoSummaryService;
