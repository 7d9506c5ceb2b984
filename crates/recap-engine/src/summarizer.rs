//! Token-budgeted map-reduce summarization.
//!
//! Long text is split into chunks that fit next to the instruction prompt,
//! each chunk is summarized on its own (map), and the partial results are
//! either merged by one more call (reduce) or joined in chunk order.

use futures::stream::{self, StreamExt, TryStreamExt};
use recap_core::budget::{CostEstimate, CostEstimator, TextChunk, TextChunker};
use recap_core::{Message, RecapError, Result, SharedTokenizer};
use recap_llm::SharedProvider;

/// Result of one summarization run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub text: String,
    /// Estimated cost of the whole input
    pub cost: CostEstimate,
    /// Number of map calls issued
    pub chunks: usize,
    /// Whether the reduce call produced the final text
    pub reduced: bool,
}

impl Summary {
    /// Final text followed by a blank line and `line`.
    pub fn annotated(&self, line: &str) -> String {
        format!("{}\n\n{}", self.text, line)
    }
}

pub struct MapReduceSummarizer {
    provider: SharedProvider,
    tokenizer: SharedTokenizer,
    costs: CostEstimator,
    model: String,
    max_tokens: usize,
    map_concurrency: usize,
}

impl std::fmt::Debug for MapReduceSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapReduceSummarizer")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("map_concurrency", &self.map_concurrency)
            .finish_non_exhaustive()
    }
}

impl MapReduceSummarizer {
    pub fn new(
        provider: SharedProvider,
        tokenizer: SharedTokenizer,
        costs: CostEstimator,
        model: impl Into<String>,
        max_tokens: usize,
    ) -> Self {
        Self {
            provider,
            tokenizer,
            costs,
            model: model.into(),
            max_tokens,
            map_concurrency: 1,
        }
    }

    /// Number of map calls allowed in flight at once. Results are still
    /// aggregated in chunk order.
    pub fn with_map_concurrency(mut self, n: usize) -> Self {
        self.map_concurrency = n.max(1);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Summarize `text` with `map_prompt`, merging with `reduce_prompt`
    /// when there is more than one partial result.
    ///
    /// The cost of the whole input is checked against the ceiling before any
    /// backend call is made. Backend failures abort the run without retry.
    pub async fn summarize(
        &self,
        text: &str,
        map_prompt: &str,
        reduce_prompt: Option<&str>,
    ) -> Result<Summary> {
        let chunks = TextChunker::new(self.tokenizer.as_ref()).split(
            text,
            map_prompt,
            self.max_tokens,
        )?;
        let total_tokens = match chunks.last() {
            Some(last) => last.tokens.end,
            None => return Err(RecapError::NoContent("input text is empty".to_string())),
        };

        let cost = self.costs.estimate_within_ceiling(total_tokens, &self.model)?;
        tracing::info!("Cost is {}", cost.cost);

        let total = chunks.len();
        let responses: Vec<String> = stream::iter(
            chunks
                .iter()
                .map(|chunk| self.map_chunk(chunk, total, map_prompt)),
        )
        .buffered(self.map_concurrency)
        .try_collect()
        .await?;

        let (text, reduced) = match reduce_prompt {
            Some(reduce_prompt) if responses.len() > 1 => {
                (self.reduce(&responses, reduce_prompt).await?, true)
            }
            _ => (responses.join("\n"), false),
        };

        Ok(Summary {
            text,
            cost,
            chunks: total,
            reduced,
        })
    }

    async fn map_chunk(&self, chunk: &TextChunk, total: usize, map_prompt: &str) -> Result<String> {
        tracing::info!("Process chunk {} out of {}", chunk.index + 1, total);
        let messages = [Message::system(chunk.text.as_str()), Message::user(map_prompt)];
        self.complete(&messages).await
    }

    async fn reduce(&self, responses: &[String], reduce_prompt: &str) -> Result<String> {
        tracing::info!("Merging {} partial summaries", responses.len());
        let messages = [
            Message::system(responses.join("\n")),
            Message::user(reduce_prompt),
        ];
        self.complete(&messages).await
    }

    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let reply = self
            .provider
            .chat_completion(messages, Some(&self.model))
            .await
            .map_err(|e| {
                tracing::error!("Chat completion failed: {}", e);
                RecapError::from(e)
            })?;
        Ok(reply.content.trim().to_string())
    }
}
