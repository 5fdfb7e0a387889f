//! Input form behind a prediction: defaults, lookup prefill and user edits.

use time::PrimitiveDateTime;

use crate::lookup::{LookupError, VideoMetadata};
use crate::video::{Region, VideoRecord};

pub const DEFAULT_VIEWS: u64 = 100_000;
pub const DEFAULT_LIKES: u64 = 5_000;
pub const DEFAULT_COMMENTS: u64 = 1_000;

/// Editable fields of one video to score.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoForm {
    pub title: String,
    pub channel: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub published_at: PrimitiveDateTime,
    pub region: Region,
}

/// What a lookup attempt contributed to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Prefilled,
    NotFound,
    Failed(String),
}

impl LookupOutcome {
    /// Line shown to the user when the form fell back to manual entry.
    pub fn notice(&self) -> Option<String> {
        match self {
            LookupOutcome::Prefilled => None,
            LookupOutcome::NotFound => {
                Some("Could not fetch video details. Please enter manually.".to_string())
            }
            LookupOutcome::Failed(reason) => Some(format!(
                "Could not fetch video details ({reason}). Please enter manually."
            )),
        }
    }
}

/// Field values supplied explicitly by the user; `None` keeps the form value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormOverrides {
    pub title: Option<String>,
    pub channel: Option<String>,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub published_at: Option<PrimitiveDateTime>,
    pub region: Option<Region>,
}

impl VideoForm {
    /// Blank form for manual entry, published at `now`.
    pub fn manual_defaults(now: PrimitiveDateTime) -> Self {
        Self {
            title: String::new(),
            channel: String::new(),
            views: DEFAULT_VIEWS,
            likes: DEFAULT_LIKES,
            comments: DEFAULT_COMMENTS,
            published_at: now,
            region: Region::default(),
        }
    }

    /// Form prefilled from looked-up metadata.
    pub fn prefilled(meta: VideoMetadata, region: Region) -> Self {
        Self {
            title: meta.title,
            channel: meta.channel,
            views: meta.views,
            likes: meta.likes,
            comments: meta.comments,
            published_at: meta.published_at,
            region,
        }
    }

    /// Seed the form from a lookup result. A missing video or a failed
    /// lookup is logged and yields [`VideoForm::manual_defaults`].
    pub fn from_lookup(
        result: Result<Option<VideoMetadata>, LookupError>,
        region: Region,
        now: PrimitiveDateTime,
    ) -> (Self, LookupOutcome) {
        match result {
            Ok(Some(meta)) => (Self::prefilled(meta, region), LookupOutcome::Prefilled),
            Ok(None) => {
                tracing::warn!("Lookup found no video; using manual entry");
                (Self::manual_defaults(now), LookupOutcome::NotFound)
            }
            Err(err) => {
                tracing::warn!("Video lookup failed: {err}; using manual entry");
                (Self::manual_defaults(now), LookupOutcome::Failed(err.to_string()))
            }
        }
    }

    pub fn apply(mut self, overrides: FormOverrides) -> Self {
        if let Some(title) = overrides.title {
            self.title = title;
        }
        if let Some(channel) = overrides.channel {
            self.channel = channel;
        }
        if let Some(views) = overrides.views {
            self.views = views;
        }
        if let Some(likes) = overrides.likes {
            self.likes = likes;
        }
        if let Some(comments) = overrides.comments {
            self.comments = comments;
        }
        if let Some(published_at) = overrides.published_at {
            self.published_at = published_at;
        }
        if let Some(region) = overrides.region {
            self.region = region;
        }
        self
    }

    pub fn into_record(self) -> VideoRecord {
        VideoRecord {
            title: self.title,
            channel: self.channel,
            views: self.views,
            likes: self.likes,
            comments: self.comments,
            published_at: self.published_at,
            region: self.region,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn manual_defaults_match_entry_form() {
        let now = datetime!(2025-05-16 9:30);
        let record = VideoForm::manual_defaults(now).into_record();
        assert_eq!(record.views, 100_000);
        assert_eq!(record.likes, 5_000);
        assert_eq!(record.comments, 1_000);
        assert_eq!(record.published_at, now);
        assert_eq!(record.region, Region::Us);
        assert!(record.title.is_empty() && record.channel.is_empty());
    }

    fn fetched() -> VideoMetadata {
        VideoMetadata {
            title: "Fetched".into(),
            channel: "Chan".into(),
            views: 10,
            likes: 2,
            comments: 1,
            published_at: datetime!(2025-01-01 0:00),
        }
    }

    #[test]
    fn missing_or_failed_lookup_falls_back_to_manual_defaults() {
        let now = datetime!(2025-05-16 9:30);
        let (form, outcome) = VideoForm::from_lookup(Ok(None), Region::Gb, now);
        assert_eq!(form, VideoForm::manual_defaults(now));
        assert_eq!(outcome, LookupOutcome::NotFound);
        assert!(outcome.notice().is_some());

        let (form, outcome) =
            VideoForm::from_lookup(Err(LookupError::Status(403)), Region::Gb, now);
        assert_eq!(form, VideoForm::manual_defaults(now));
        let notice = outcome.notice().unwrap();
        assert!(notice.contains("403"), "{notice}");
        assert!(notice.ends_with("Please enter manually."));
    }

    #[test]
    fn found_video_prefills_the_form() {
        let now = datetime!(2025-05-16 9:30);
        let (form, outcome) = VideoForm::from_lookup(Ok(Some(fetched())), Region::In, now);
        assert_eq!(outcome, LookupOutcome::Prefilled);
        assert_eq!(outcome.notice(), None);
        assert_eq!(form, VideoForm::prefilled(fetched(), Region::In));
        assert_eq!(form.views, 10);
        assert_eq!(form.published_at, datetime!(2025-01-01 0:00));
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let form = VideoForm::prefilled(fetched(), Region::Jp).apply(FormOverrides {
            views: Some(500),
            title: Some("Edited".into()),
            ..FormOverrides::default()
        });
        assert_eq!(form.title, "Edited");
        assert_eq!(form.channel, "Chan");
        assert_eq!(form.views, 500);
        assert_eq!(form.likes, 2);
        assert_eq!(form.region, Region::Jp);
    }
}
