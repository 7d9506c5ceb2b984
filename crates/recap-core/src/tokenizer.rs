//! Text <-> token conversion used for sizing and cost accounting.
//!
//! Token ids never carry meaning outside of the tokenizer that produced them;
//! the rest of the crate only counts and slices them.

use std::sync::Arc;

use tiktoken_rs::CoreBPE;

use crate::error::{RecapError, Result};

/// Ordered token identifiers produced by [`Tokenizer::encode`].
pub type TokenSequence = Vec<u32>;

/// Trait for tokenizer implementations.
pub trait Tokenizer: Send + Sync {
    /// Encode text into token ids. Deterministic for a given vocabulary.
    fn encode(&self, text: &str) -> TokenSequence;

    /// Decode token ids back into text.
    ///
    /// Fails with [`RecapError::Encoding`] when the ids do not form valid text.
    fn decode(&self, tokens: &[u32]) -> Result<String>;

    /// Count tokens in a plain text string.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// Arc-wrapped tokenizer for easy sharing.
pub type SharedTokenizer = Arc<dyn Tokenizer>;

/// Byte-pair-encoding tokenizer backed by the OpenAI vocabularies.
pub struct BpeTokenizer {
    bpe: CoreBPE,
    model: String,
}

impl BpeTokenizer {
    /// Default vocabulary: the one `gpt-4o` uses (`o200k_base`).
    pub const DEFAULT_MODEL: &'static str = "gpt-4o";

    /// Create a tokenizer using the vocabulary of the given model.
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = tiktoken_rs::get_bpe_from_model(model)
            .map_err(|e| RecapError::Encoding(format!("no vocabulary for {model}: {e}")))?;
        Ok(Self {
            bpe,
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for BpeTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BpeTokenizer")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Tokenizer for BpeTokenizer {
    fn encode(&self, text: &str) -> TokenSequence {
        // Special-token markup in user text is treated as ordinary text.
        self.bpe.encode_ordinary(text)
    }

    /// Ids must come from [`BpeTokenizer::encode`] of the same vocabulary.
    /// A slice that cuts a multi-byte character in half is not valid UTF-8
    /// and is reported as an encoding error.
    fn decode(&self, tokens: &[u32]) -> Result<String> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| RecapError::Encoding(e.to_string()))
    }
}

/// One token per Unicode scalar value.
///
/// Lossless and vocabulary-free, so sizes are predictable. Used offline and
/// in tests where exact token counts matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharTokenizer;

impl CharTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str) -> TokenSequence {
        text.chars().map(u32::from).collect()
    }

    fn decode(&self, tokens: &[u32]) -> Result<String> {
        tokens
            .iter()
            .map(|&id| {
                char::from_u32(id)
                    .ok_or_else(|| RecapError::Encoding(format!("token {id} is not a character")))
            })
            .collect()
    }

    fn count(&self, text: &str) -> usize {
        text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_tokenizer_counts_scalars() {
        let tokenizer = CharTokenizer::new();
        assert_eq!(tokenizer.count("Hello"), 5);
        assert_eq!(tokenizer.count("Привет 😀"), 8);
        assert_eq!(tokenizer.count(""), 0);
    }

    #[test]
    fn char_tokenizer_round_trips_unicode() {
        let tokenizer = CharTokenizer::new();
        let text = "Это транскрипция 🎉 mixed text";
        let tokens = tokenizer.encode(text);
        assert_eq!(tokenizer.decode(&tokens).unwrap(), text);
    }

    #[test]
    fn char_tokenizer_rejects_surrogate_ids() {
        let tokenizer = CharTokenizer::new();
        let err = tokenizer.decode(&[0xD800]).unwrap_err();
        assert!(matches!(err, RecapError::Encoding(_)));
    }

    #[test]
    fn bpe_tokenizer_round_trips_text() {
        let tokenizer = BpeTokenizer::for_model(BpeTokenizer::DEFAULT_MODEL).unwrap();
        let text = "This is a transcript in SRT format.";
        let tokens = tokenizer.encode(text);

        assert!(!tokens.is_empty());
        assert!(tokens.len() < text.len(), "BPE should merge characters");
        assert_eq!(tokenizer.decode(&tokens).unwrap(), text);
    }

    #[test]
    fn bpe_tokenizer_is_deterministic() {
        let tokenizer = BpeTokenizer::for_model("gpt-4o").unwrap();
        let text = "Пронумеруй каждый тезис заново.";
        assert_eq!(tokenizer.encode(text), tokenizer.encode(text));
        assert_eq!(tokenizer.model(), "gpt-4o");
    }

    #[test]
    fn bpe_tokenizer_is_shared_through_arc() {
        let shared: SharedTokenizer =
            Arc::new(BpeTokenizer::for_model(BpeTokenizer::DEFAULT_MODEL).unwrap());
        let other = Arc::clone(&shared);

        let counted = std::thread::spawn(move || other.count("Видео про Rust"))
            .join()
            .unwrap();
        assert_eq!(counted, shared.count("Видео про Rust"));
    }

    #[test]
    fn bpe_tokenizer_counts_empty_text() {
        let tokenizer = BpeTokenizer::for_model("gpt-4o").unwrap();
        assert_eq!(tokenizer.count(""), 0);
    }
}
