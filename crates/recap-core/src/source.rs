//! Locating the video a message refers to.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::error::{RecapError, Result};

// Both patterns are literals; `source_patterns_compile` keeps them valid.
fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("valid url regex"))
}

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:^|\W)(?:youtube(?:-nocookie)?\.com/(?:.*[?&]v=|v/|e(?:mbed)?/|[^/]+/.+/)|youtu\.be/)([\w-]+)",
        )
        .expect("valid video id regex")
    })
}

/// First URL in `text`, if it points at a YouTube host.
///
/// Only the first URL is considered; a message that starts with some other
/// link is not treated as a video request.
pub fn extract_video_url(text: &str) -> Result<String> {
    let candidate = url_regex()
        .find(text)
        .map(|m| m.as_str())
        .ok_or_else(|| RecapError::InvalidSource("no link in the message".to_string()))?;

    let host = Url::parse(candidate)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_default();

    if host.contains("youtu") {
        Ok(candidate.to_string())
    } else {
        Err(RecapError::InvalidSource(format!("{candidate} is not a YouTube link")))
    }
}

/// Video id from any of the common YouTube URL shapes.
pub fn extract_video_id(url: &str) -> Result<String> {
    video_id_regex()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| RecapError::InvalidSource(format!("{url} does not contain a video id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_patterns_compile() {
        assert!(url_regex().is_match("http://a.b"));
        assert!(video_id_regex().is_match("youtu.be/abc"));
    }

    #[test]
    fn finds_youtube_link_in_text() {
        let url = extract_video_url("look at this https://youtu.be/DsUxuz_Rt8g please").unwrap();
        assert_eq!(url, "https://youtu.be/DsUxuz_Rt8g");
    }

    #[test]
    fn only_first_link_counts() {
        let err = extract_video_url("https://example.com and https://youtu.be/abc").unwrap_err();
        assert!(matches!(err, RecapError::InvalidSource(_)));
    }

    #[test]
    fn text_without_links_is_invalid() {
        assert!(matches!(
            extract_video_url("no links here"),
            Err(RecapError::InvalidSource(_))
        ));
    }

    #[test]
    fn extracts_ids_from_common_shapes() {
        let cases = [
            ("https://www.youtube.com/watch?v=DsUxuz_Rt8g", "DsUxuz_Rt8g"),
            ("https://www.youtube.com/watch?feature=share&v=abc-123", "abc-123"),
            ("https://youtu.be/DsUxuz_Rt8g", "DsUxuz_Rt8g"),
            ("https://www.youtube.com/embed/xyz_9", "xyz_9"),
            ("https://www.youtube-nocookie.com/v/qwerty", "qwerty"),
        ];
        for (url, expected) in cases {
            assert_eq!(extract_video_id(url).unwrap(), expected, "url {url:?}");
        }
    }

    #[test]
    fn channel_page_has_no_video_id() {
        assert!(matches!(
            extract_video_id("https://www.youtube.com/"),
            Err(RecapError::InvalidSource(_))
        ));
    }
}
