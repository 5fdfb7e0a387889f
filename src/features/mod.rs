//! Feature pipeline turning video records into named numeric vectors.
//!
//! The pipeline has two ordered stages over a batch of records:
//! - [`basic`]: upload time fields, title length and engagement ratios.
//! - [`enhanced`]: title analysis, channel frequency, age and engagement score.
//!
//! Both the trainer and the predictor go through [`FeaturePipeline::run`], so the
//! feature semantics cannot drift between training and inference. The feature
//! set itself is declared once in [`FEATURE_NAMES`] and versioned by
//! [`FEATURE_VERSION`].

pub mod basic;
mod channel;
pub mod enhanced;
mod sentiment;
mod title;

use std::collections::BTreeMap;

use time::PrimitiveDateTime;

use crate::video::VideoRecord;

pub use channel::ChannelCounts;
pub use sentiment::{LexiconSentiment, SentimentModel};
pub use title::{caps_ratio, has_emoji, has_official, title_length, word_count};

/// Version of the feature set; bumped whenever a definition changes.
pub const FEATURE_VERSION: i64 = 1;

pub const UPLOAD_HOUR: &str = "Upload_Hour";
pub const UPLOAD_WEEKDAY: &str = "Upload_Weekday";
pub const TITLE_LENGTH: &str = "Title_Length";
pub const LIKE_VIEW_RATIO: &str = "Like_View_Ratio";
pub const COMMENT_VIEW_RATIO: &str = "Comment_View_Ratio";
pub const LIKE_COMMENT_RATIO: &str = "Like_Comment_Ratio";
pub const TITLE_HAS_EMOJI: &str = "Title_Has_Emoji";
pub const TITLE_SENTIMENT_SCORE: &str = "Title_Sentiment_Score";
pub const TITLE_WORD_COUNT: &str = "Title_Word_Count";
pub const TITLE_CAPS_RATIO: &str = "Title_Caps_Ratio";
pub const HAS_OFFICIAL: &str = "Has_Official";
pub const CHANNEL_FREQUENCY: &str = "Channel_Frequency";
pub const HOURS_SINCE_UPLOAD: &str = "Hours_Since_Upload";
pub const ENGAGEMENT_SCORE: &str = "Engagement_Score";

/// Canonical, ordered feature set shared by training and inference.
pub const FEATURE_NAMES: [&str; 14] = [
    UPLOAD_HOUR,
    UPLOAD_WEEKDAY,
    TITLE_LENGTH,
    LIKE_VIEW_RATIO,
    COMMENT_VIEW_RATIO,
    LIKE_COMMENT_RATIO,
    TITLE_HAS_EMOJI,
    TITLE_SENTIMENT_SCORE,
    TITLE_WORD_COUNT,
    TITLE_CAPS_RATIO,
    HAS_OFFICIAL,
    CHANNEL_FREQUENCY,
    HOURS_SINCE_UPLOAD,
    ENGAGEMENT_SCORE,
];

/// Owned copy of [`FEATURE_NAMES`].
pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|name| (*name).to_string()).collect()
}

/// Inputs whose features are numerically degenerate.
///
/// The affected values are still produced (NaN or infinite ratios); the
/// marker lets callers decide whether to clean the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degenerate {
    /// Views is zero, so every `/ Views` ratio is NaN or infinite.
    ZeroViews,
    /// Title is empty.
    EmptyTitle,
}

/// Named numeric features derived from one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    values: BTreeMap<String, f64>,
    degenerate: Vec<Degenerate>,
}

impl FeatureVector {
    /// Set a feature value, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(name)
    }

    /// Feature names present, in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Degenerate-input markers recorded while deriving this vector.
    pub fn degenerate(&self) -> &[Degenerate] {
        &self.degenerate
    }

    pub(crate) fn mark(&mut self, marker: Degenerate) {
        if !self.degenerate.contains(&marker) {
            self.degenerate.push(marker);
        }
    }

    /// Whether every value is a finite number.
    pub fn is_finite(&self) -> bool {
        self.values.values().all(|value| value.is_finite())
    }

    /// Project onto `names` in that order, substituting 0 for absent names.
    ///
    /// Returns the row and the names that had to be zero-filled.
    pub fn align(&self, names: &[String]) -> (Vec<f64>, Vec<String>) {
        let mut filled = Vec::new();
        let row = names
            .iter()
            .map(|name| match self.values.get(name) {
                Some(&value) => value,
                None => {
                    filled.push(name.clone());
                    0.0
                }
            })
            .collect();
        (row, filled)
    }
}

/// Where `Channel_Frequency` counts come from.
#[derive(Debug, Clone, Copy)]
pub enum ChannelSource<'a> {
    /// Count rows sharing the channel within the batch being featurized.
    Batch,
    /// Look counts up in a corpus-derived table.
    Corpus(&'a ChannelCounts),
}

/// Runs both pipeline stages over a batch.
#[derive(Clone, Copy)]
pub struct FeaturePipeline<'a> {
    sentiment: &'a dyn SentimentModel,
    channels: ChannelSource<'a>,
}

impl<'a> FeaturePipeline<'a> {
    /// Pipeline counting channels within each batch, as used for training.
    pub fn new(sentiment: &'a dyn SentimentModel) -> Self {
        Self {
            sentiment,
            channels: ChannelSource::Batch,
        }
    }

    /// Replace batch channel counts with a corpus table.
    pub fn with_channel_counts(mut self, counts: &'a ChannelCounts) -> Self {
        self.channels = ChannelSource::Corpus(counts);
        self
    }

    /// Featurize `records`, measuring upload age against `evaluated_at`.
    ///
    /// Output rows line up one-to-one with `records`.
    pub fn run(&self, records: &[VideoRecord], evaluated_at: PrimitiveDateTime) -> Vec<FeatureVector> {
        let basic = basic::derive_batch(records);
        let batch_counts;
        let counts = match self.channels {
            ChannelSource::Batch => {
                batch_counts = ChannelCounts::from_records(records);
                &batch_counts
            }
            ChannelSource::Corpus(table) => table,
        };
        let context = enhanced::EnhancedContext {
            sentiment: self.sentiment,
            channels: counts,
            evaluated_at,
        };
        enhanced::derive_batch(records, basic, &context)
    }

    /// Featurize a single record.
    pub fn run_one(&self, record: &VideoRecord, evaluated_at: PrimitiveDateTime) -> FeatureVector {
        self.run(std::slice::from_ref(record), evaluated_at)
            .pop()
            .unwrap_or_default()
    }
}
