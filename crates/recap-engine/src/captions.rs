//! Where video captions come from.

use std::path::PathBuf;

use async_trait::async_trait;
use recap_core::{RecapError, Result, Transcript};
use serde::Deserialize;

/// Supplies the captions of a video.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Fetch captions in the first of `languages` that is available.
    ///
    /// Any failure, including no matching language, is reported as
    /// [`RecapError::NoContent`].
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript>;
}

/// Reads captions prepared on disk as `<dir>/<video_id>.json`.
///
/// The file holds either one transcript or a list of transcripts in
/// different languages.
#[derive(Debug, Clone)]
pub struct DirectoryCaptionSource {
    dir: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CaptionFile {
    Many(Vec<Transcript>),
    One(Transcript),
}

impl DirectoryCaptionSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, video_id: &str) -> Result<PathBuf> {
        // id characters only, so the path stays inside `dir`
        if video_id.is_empty() || !video_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(RecapError::InvalidSource(format!("bad video id: {video_id}")));
        }
        Ok(self.dir.join(format!("{video_id}.json")))
    }
}

#[async_trait]
impl CaptionSource for DirectoryCaptionSource {
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript> {
        let path = self.path_for(video_id)?;
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            tracing::warn!("Failed to read captions {}: {}", path.display(), e);
            RecapError::NoContent(format!("no captions for video {video_id}"))
        })?;

        let transcripts = match serde_json::from_str::<CaptionFile>(&raw) {
            Ok(CaptionFile::Many(list)) => list,
            Ok(CaptionFile::One(one)) => vec![one],
            Err(e) => {
                tracing::warn!("Malformed captions file {}: {}", path.display(), e);
                return Err(RecapError::NoContent(format!(
                    "captions for video {video_id} are unreadable"
                )));
            }
        };

        pick_language(transcripts, languages).ok_or_else(|| {
            RecapError::NoContent(format!(
                "no captions for video {video_id} in {}",
                languages.join(", ")
            ))
        })
    }
}

fn pick_language(transcripts: Vec<Transcript>, languages: &[String]) -> Option<Transcript> {
    let index = languages
        .iter()
        .find_map(|lang| transcripts.iter().position(|t| &t.language == lang))?;
    transcripts.into_iter().nth(index)
}
