//! Fetching a public video's metadata by URL or identifier.
//!
//! A failed or empty lookup is never fatal: callers log it and fall back to
//! manual entry.

mod youtube;

pub use youtube::YouTubeClient;

use thiserror::Error;
use time::PrimitiveDateTime;
use url::Url;

/// Metadata returned for a single video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub title: String,
    pub channel: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub published_at: PrimitiveDateTime,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Not a video URL or identifier: {0:?}")]
    InvalidInput(String),
    #[error("No API key configured (set it in config.toml or ${0})")]
    MissingApiKey(String),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Lookup service answered HTTP {0}")]
    Status(u16),
    #[error("Unexpected lookup response: {0}")]
    Decode(String),
}

/// Source of video metadata.
pub trait MetadataLookup {
    /// Look up `input` (a URL or raw id). `Ok(None)` means no such video.
    fn lookup(&self, input: &str) -> Result<Option<VideoMetadata>, LookupError>;
}

/// Extract the video id from a watch, short-link, shorts or embed URL, or
/// accept a bare identifier.
pub fn parse_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if !input.contains("youtube.com") && !input.contains("youtu.be") {
        return is_plausible_id(input).then(|| input.to_string());
    }
    let with_scheme;
    let text = if input.contains("://") {
        input
    } else {
        with_scheme = format!("https://{input}");
        &with_scheme
    };
    let url = Url::parse(text).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
    let mut segments = url.path_segments()?.filter(|segment| !segment.is_empty());
    let id = match host {
        "youtu.be" => segments.next().map(str::to_string),
        host if host.ends_with("youtube.com") => match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned()),
            Some("shorts") | Some("embed") | Some("live") => segments.next().map(str::to_string),
            _ => None,
        },
        _ => None,
    }?;
    is_plausible_id(&id).then_some(id)
}

fn is_plausible_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_url_shapes() {
        let cases = [
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("https://youtube.com/watch?feature=share&v=abc_DEF-123", "abc_DEF-123"),
            ("youtube.com/watch?v=abc", "abc"),
            ("https://m.youtube.com/watch?v=mobile1", "mobile1"),
            ("https://youtu.be/short1?t=42", "short1"),
            ("https://www.youtube.com/shorts/clip9", "clip9"),
            ("https://www.youtube.com/embed/emb3d", "emb3d"),
            ("dQw4w9WgXcQ", "dQw4w9WgXcQ"),
            ("  padded_id  ", "padded_id"),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_video_id(input).as_deref(), Some(expected), "{input}");
        }
    }

    #[test]
    fn rejects_non_video_input() {
        for input in [
            "",
            "https://www.youtube.com/channel/UC123",
            "https://www.youtube.com/watch?list=PL1",
            "not an id",
            "https://example.com/watch?v=abc",
        ] {
            assert_eq!(parse_video_id(input), None, "{input}");
        }
    }
}
