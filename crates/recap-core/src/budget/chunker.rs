//! Splitting long text into pieces that fit next to an instruction prompt.

use std::ops::Range;

use crate::error::{RecapError, Result};
use crate::tokenizer::Tokenizer;

/// A contiguous slice of the source token stream, decoded back to text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    /// Position of this chunk in source order
    pub index: usize,
    /// Token range in the encoded source
    pub tokens: Range<usize>,
    /// Decoded text of the range
    pub text: String,
}

impl TextChunk {
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

/// Splits text by token count.
///
/// # Algorithm
///
/// 1. Encode the source text
/// 2. Reserve the tokens of the instruction prompt from `max_tokens`
/// 3. Cut the token stream into consecutive slices of the remaining size
/// 4. Move a cut back while it falls inside a multi-byte character, so
///    every slice decodes to whole characters
/// 5. Decode each slice back to text
pub struct TextChunker<'a> {
    tokenizer: &'a dyn Tokenizer,
}

impl<'a> TextChunker<'a> {
    pub fn new(tokenizer: &'a dyn Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Tokens left for content once `prompt` is reserved out of `max_tokens`.
    pub fn chunk_size(&self, prompt: &str, max_tokens: usize) -> Result<usize> {
        let prompt_tokens = self.tokenizer.count(prompt);
        match max_tokens.checked_sub(prompt_tokens) {
            Some(size) if size > 0 => Ok(size),
            _ => Err(RecapError::InvalidBudget {
                max_tokens,
                prompt_tokens,
            }),
        }
    }

    /// Split `text` into chunks of at most `max_tokens - tokens(prompt)` tokens.
    ///
    /// Chunks are contiguous and in source order; empty text yields no
    /// chunks. When no cut falls inside a character there are exactly
    /// `ceil(L / chunk_size)` chunks. Fails with [`RecapError::Encoding`]
    /// only if one character needs more tokens than a whole chunk holds.
    pub fn split(&self, text: &str, prompt: &str, max_tokens: usize) -> Result<Vec<TextChunk>> {
        let chunk_size = self.chunk_size(prompt, max_tokens)?;
        let tokens = self.tokenizer.encode(text);

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < tokens.len() {
            let (end, text) = self.decode_whole_chars(&tokens, start, chunk_size)?;
            chunks.push(TextChunk {
                index: chunks.len(),
                tokens: start..end,
                text,
            });
            start = end;
        }
        Ok(chunks)
    }

    /// Longest slice from `start`, at most `chunk_size` tokens, that decodes.
    ///
    /// `start` is always a character boundary, so a slice decodes exactly
    /// when its end is one too.
    fn decode_whole_chars(
        &self,
        tokens: &[u32],
        start: usize,
        chunk_size: usize,
    ) -> Result<(usize, String)> {
        let mut end = (start + chunk_size).min(tokens.len());
        loop {
            match self.tokenizer.decode(&tokens[start..end]) {
                Ok(text) => return Ok((end, text)),
                Err(_) if end - start > 1 => end -= 1,
                Err(err) => {
                    tracing::warn!(
                        "No character boundary within {} tokens at token {}",
                        chunk_size,
                        start
                    );
                    return Err(err);
                }
            }
        }
    }
}
