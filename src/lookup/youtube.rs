use std::time::Duration;

use serde::Deserialize;

use crate::config::LookupSettings;
use crate::http_client::{self, MAX_RESPONSE_BYTES};
use crate::video::parse_api_timestamp;

use super::{LookupError, MetadataLookup, VideoMetadata, parse_video_id};

const VIDEO_PARTS: &str = "snippet,statistics,contentDetails";

/// Client for the YouTube Data API v3 `videos` endpoint.
pub struct YouTubeClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
}

impl YouTubeClient {
    pub fn new(settings: &LookupSettings) -> Self {
        Self {
            agent: http_client::agent(Duration::from_secs(settings.timeout_secs.max(1))),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.resolve_api_key(),
            api_key_env: settings.api_key_env.clone(),
        }
    }

    fn fetch(&self, id: &str, key: &str) -> Result<VideoListResponse, LookupError> {
        let url = format!("{}/videos", self.base_url);
        tracing::debug!("Looking up video {id}");
        let response = match self
            .agent
            .get(&url)
            .query("part", VIDEO_PARTS)
            .query("id", id)
            .query("key", key)
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(LookupError::Status(code)),
            Err(ureq::Error::Transport(err)) => return Err(LookupError::Transport(err.to_string())),
        };
        http_client::read_json(response, MAX_RESPONSE_BYTES)
            .map_err(|err| LookupError::Decode(err.to_string()))
    }
}

impl MetadataLookup for YouTubeClient {
    fn lookup(&self, input: &str) -> Result<Option<VideoMetadata>, LookupError> {
        let id = parse_video_id(input).ok_or_else(|| LookupError::InvalidInput(input.to_string()))?;
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LookupError::MissingApiKey(self.api_key_env.clone()))?;
        let listing = self.fetch(&id, key)?;
        let Some(item) = listing.items.into_iter().next() else {
            tracing::info!("No video found for id {id}");
            return Ok(None);
        };
        item.into_metadata().map(Some)
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_title: String,
    published_at: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

impl VideoItem {
    fn into_metadata(self) -> Result<VideoMetadata, LookupError> {
        let published_at = parse_api_timestamp(&self.snippet.published_at)
            .map_err(|err| LookupError::Decode(err.to_string()))?;
        Ok(VideoMetadata {
            title: self.snippet.title,
            channel: self.snippet.channel_title,
            views: count(self.statistics.view_count.as_deref(), "viewCount")?,
            likes: count(self.statistics.like_count.as_deref(), "likeCount")?,
            comments: count(self.statistics.comment_count.as_deref(), "commentCount")?,
            published_at,
        })
    }
}

/// Counts arrive as decimal strings; hidden counts are absent and read as 0.
fn count(value: Option<&str>, field: &str) -> Result<u64, LookupError> {
    match value {
        None => Ok(0),
        Some(text) => text
            .parse()
            .map_err(|_| LookupError::Decode(format!("{field} is not a count: {text:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::test_server::serve_once;
    use time::macros::datetime;

    fn client(base_url: String) -> YouTubeClient {
        YouTubeClient::new(&LookupSettings {
            api_key: Some("test-key".into()),
            base_url,
            timeout_secs: 5,
            ..LookupSettings::default()
        })
    }

    fn json_response(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        )
    }

    #[test]
    fn maps_api_item_and_defaults_missing_counts() {
        let body = r#"{"items":[{"snippet":{"title":"Big Reveal","channelTitle":"Studio",
            "publishedAt":"2025-05-12T14:00:00Z"},"statistics":{"viewCount":"1000","likeCount":"100"}}]}"#;
        let (url, requests) = serve_once(json_response(body));
        let meta = client(url)
            .lookup("https://youtu.be/abc123")
            .unwrap()
            .unwrap();
        assert_eq!(meta.title, "Big Reveal");
        assert_eq!(meta.channel, "Studio");
        assert_eq!((meta.views, meta.likes, meta.comments), (1000, 100, 0));
        assert_eq!(meta.published_at, datetime!(2025-05-12 14:00:00));
        let request = requests.recv().unwrap();
        assert!(request.starts_with("GET /videos?"), "{request}");
        assert!(request.contains("id=abc123"), "{request}");
        assert!(request.contains("key=test-key"), "{request}");
    }

    #[test]
    fn empty_listing_is_not_found() {
        let (url, _) = serve_once(json_response(r#"{"items":[]}"#));
        assert_eq!(client(url).lookup("abc123").unwrap(), None);
    }

    #[test]
    fn http_errors_surface_status() {
        let (url, _) = serve_once("HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\n\r\n".to_string());
        let err = client(url).lookup("abc123").unwrap_err();
        assert!(matches!(err, LookupError::Status(403)));
    }

    #[test]
    fn malformed_count_is_a_decode_error() {
        let body = r#"{"items":[{"snippet":{"title":"t","channelTitle":"c",
            "publishedAt":"2025-05-12T14:00:00Z"},"statistics":{"viewCount":"lots"}}]}"#;
        let (url, _) = serve_once(json_response(body));
        let err = client(url).lookup("abc123").unwrap_err();
        assert!(matches!(err, LookupError::Decode(_)));
    }

    #[test]
    fn rejects_bad_input_and_missing_key_before_any_request() {
        let no_key = YouTubeClient::new(&LookupSettings {
            api_key: None,
            api_key_env: "VIDTREND_TEST_NO_SUCH_KEY".into(),
            base_url: "http://127.0.0.1:9".into(),
            ..LookupSettings::default()
        });
        assert!(matches!(
            no_key.lookup("abc123").unwrap_err(),
            LookupError::MissingApiKey(_)
        ));
        assert!(matches!(
            client("http://127.0.0.1:9".into()).lookup("not an id").unwrap_err(),
            LookupError::InvalidInput(_)
        ));
    }
}
