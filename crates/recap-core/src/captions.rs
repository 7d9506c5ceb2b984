//! Timed caption segments and their SRT rendering.

use serde::{Deserialize, Serialize};

use crate::error::{RecapError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSegment {
    /// Start time in seconds
    pub start: f64,
    /// Duration in seconds
    pub duration: f64,
    pub text: String,
}

/// Captions of one video in one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Language tag, e.g. "en" or "ru"
    pub language: String,
    pub segments: Vec<CaptionSegment>,
}

impl Transcript {
    pub fn new(language: impl Into<String>, segments: Vec<CaptionSegment>) -> Self {
        Self {
            language: language.into(),
            segments,
        }
    }

    /// Render as an SRT subtitle block.
    ///
    /// A segment ends where the next one starts if they overlap.
    pub fn to_srt(&self) -> Result<String> {
        let blocks: Vec<String> = self
            .segments
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.text.trim().is_empty())
            .map(|(i, segment)| {
                let mut end = segment.start + segment.duration;
                if let Some(next) = self.segments.get(i + 1) {
                    if next.start < end {
                        end = next.start;
                    }
                }
                format!(
                    "{} --> {}\n{}",
                    srt_timestamp(segment.start),
                    srt_timestamp(end),
                    clean_caption(&segment.text)
                )
            })
            .collect();

        if blocks.is_empty() {
            return Err(RecapError::NoContent(format!(
                "transcript in '{}' has no captions",
                self.language
            )));
        }

        let numbered: Vec<String> = blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| format!("{}\n{}", i + 1, block))
            .collect();
        Ok(numbered.join("\n\n") + "\n")
    }
}

fn clean_caption(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `HH:MM:SS,mmm`
fn srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}
