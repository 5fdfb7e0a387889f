//! Stage 2: title analysis, channel popularity, upload age and engagement.

use time::PrimitiveDateTime;

use crate::video::VideoRecord;

use super::basic::BasicFeatures;
use super::{
    CHANNEL_FREQUENCY, ChannelCounts, Degenerate, ENGAGEMENT_SCORE, FeatureVector, HAS_OFFICIAL,
    HOURS_SINCE_UPLOAD, SentimentModel, TITLE_CAPS_RATIO, TITLE_HAS_EMOJI, TITLE_SENTIMENT_SCORE,
    TITLE_WORD_COUNT, title,
};

const LIKE_WEIGHT: f64 = 0.6;
const COMMENT_WEIGHT: f64 = 0.4;

/// Everything Stage 2 reads besides the record itself.
pub struct EnhancedContext<'a> {
    pub sentiment: &'a dyn SentimentModel,
    pub channels: &'a ChannelCounts,
    /// Instant upload age is measured against.
    pub evaluated_at: PrimitiveDateTime,
}

/// Stage 2 output for one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnhancedFeatures {
    pub title_has_emoji: bool,
    pub title_sentiment_score: f64,
    pub title_word_count: usize,
    pub title_caps_ratio: f64,
    pub has_official: bool,
    pub channel_frequency: u32,
    pub hours_since_upload: f64,
    /// `(0.6 * Likes + 0.4 * Comments) / Views`.
    pub engagement_score: f64,
}

pub fn derive(record: &VideoRecord, context: &EnhancedContext<'_>) -> EnhancedFeatures {
    let age = context.evaluated_at - record.published_at;
    EnhancedFeatures {
        title_has_emoji: title::has_emoji(&record.title),
        title_sentiment_score: context.sentiment.polarity(&record.title),
        title_word_count: title::word_count(&record.title),
        title_caps_ratio: title::caps_ratio(&record.title),
        has_official: title::has_official(&record.title),
        channel_frequency: context.channels.count(&record.channel),
        hours_since_upload: age.as_seconds_f64() / 3600.0,
        engagement_score: (LIKE_WEIGHT * record.likes as f64
            + COMMENT_WEIGHT * record.comments as f64)
            / record.views as f64,
    }
}

impl EnhancedFeatures {
    pub fn write_into(&self, vector: &mut FeatureVector) {
        vector.insert(TITLE_HAS_EMOJI, flag(self.title_has_emoji));
        vector.insert(TITLE_SENTIMENT_SCORE, self.title_sentiment_score);
        vector.insert(TITLE_WORD_COUNT, self.title_word_count as f64);
        vector.insert(TITLE_CAPS_RATIO, self.title_caps_ratio);
        vector.insert(HAS_OFFICIAL, flag(self.has_official));
        vector.insert(CHANNEL_FREQUENCY, f64::from(self.channel_frequency));
        vector.insert(HOURS_SINCE_UPLOAD, self.hours_since_upload);
        vector.insert(ENGAGEMENT_SCORE, self.engagement_score);
        if !self.engagement_score.is_finite() {
            vector.mark(Degenerate::ZeroViews);
        }
    }
}

/// Combine Stage 1 output with Stage 2 features into one vector per record.
pub fn derive_batch(
    records: &[VideoRecord],
    basic: Vec<BasicFeatures>,
    context: &EnhancedContext<'_>,
) -> Vec<FeatureVector> {
    records
        .iter()
        .zip(basic)
        .map(|(record, basic)| {
            let mut vector = FeatureVector::default();
            basic.write_into(&mut vector);
            derive(record, context).write_into(&mut vector);
            if record.title.is_empty() {
                vector.mark(Degenerate::EmptyTitle);
            }
            vector
        })
        .collect()
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}
