//! Summaries of videos from a link in a chat message.

use std::sync::Arc;

use chrono::Utc;
use recap_core::{extract_video_id, extract_video_url, ChatId, DedupCache, Result};

use crate::captions::CaptionSource;
use crate::prompts::PromptSet;
use crate::summarizer::MapReduceSummarizer;

/// Turns a message with a video link into a summary of the video's captions.
///
/// # Flow
///
/// 1. Find the link and the video id in the message
/// 2. Claim the video for this chat (skipped for clarify questions)
/// 3. Fetch captions in the preferred language and render them as SRT
/// 4. Run the map-reduce summarizer with that language's prompts
/// 5. Record the video as processed, only once everything succeeded
pub struct VideoSummaryService {
    summarizer: Arc<MapReduceSummarizer>,
    captions: Arc<dyn CaptionSource>,
    dedup: DedupCache,
    languages: Vec<String>,
    renumber_points: bool,
    cost_annotation: bool,
}

impl VideoSummaryService {
    pub fn new(
        summarizer: Arc<MapReduceSummarizer>,
        captions: Arc<dyn CaptionSource>,
        dedup: DedupCache,
        languages: Vec<String>,
    ) -> Self {
        Self {
            summarizer,
            captions,
            dedup,
            languages,
            renumber_points: false,
            cost_annotation: true,
        }
    }

    /// Merge multi-chunk summaries with the renumbering prompt.
    pub fn with_renumber_points(mut self, enabled: bool) -> Self {
        self.renumber_points = enabled;
        self
    }

    /// Append the cost line to every summary.
    pub fn with_cost_annotation(mut self, enabled: bool) -> Self {
        self.cost_annotation = enabled;
        self
    }

    /// Summarize the video linked in `text`.
    ///
    /// With `clarify`, answers a question about the video instead. Clarify
    /// requests neither check nor record the dedup cache.
    pub async fn summarize_video(
        &self,
        chat_id: ChatId,
        text: &str,
        clarify: Option<&str>,
    ) -> Result<String> {
        let url = extract_video_url(text)?;
        let video_id = extract_video_id(&url)?;
        let claim = self.dedup.claim(chat_id, &video_id, clarify.is_some())?;

        tracing::info!("Summarizing video {} for chat {}", video_id, chat_id);
        let transcript = self.captions.fetch(&video_id, &self.languages).await?;
        let srt = transcript.to_srt()?;
        let prompts = PromptSet::for_language(&transcript.language);

        let map_prompt = match clarify {
            Some(topic) => prompts.clarify(topic),
            None => prompts.summary.to_string(),
        };
        let reduce_prompt = (clarify.is_none() && self.renumber_points).then_some(prompts.renumber);

        let summary = self
            .summarizer
            .summarize(&srt, &map_prompt, reduce_prompt)
            .await?;
        claim.commit(Utc::now());

        if self.cost_annotation {
            Ok(summary.annotated(&prompts.cost_line(summary.cost.cost)))
        } else {
            Ok(summary.text)
        }
    }
}
