//! Stage 1: fields derived from a single record's raw metadata.

use crate::video::VideoRecord;

use super::{
    COMMENT_VIEW_RATIO, Degenerate, FeatureVector, LIKE_COMMENT_RATIO, LIKE_VIEW_RATIO,
    TITLE_LENGTH, UPLOAD_HOUR, UPLOAD_WEEKDAY, title,
};

/// Stage 1 output for one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicFeatures {
    /// Hour of day, 0..=23.
    pub upload_hour: u8,
    /// Day of week, Monday = 0 .. Sunday = 6.
    pub upload_weekday: u8,
    pub title_length: usize,
    /// `Likes / Views`; NaN or infinite when Views is 0.
    pub like_view_ratio: f64,
    /// `Comments / Views`; NaN or infinite when Views is 0.
    pub comment_view_ratio: f64,
    /// `Likes / (Comments + 1)`.
    ///
    /// Only the comment denominator is biased; the view ratios above stay
    /// unguarded.
    pub like_comment_ratio: f64,
}

/// Derive Stage 1 features for one record.
pub fn derive(record: &VideoRecord) -> BasicFeatures {
    let views = record.views as f64;
    let likes = record.likes as f64;
    let comments = record.comments as f64;
    BasicFeatures {
        upload_hour: record.published_at.hour(),
        upload_weekday: record.published_at.weekday().number_days_from_monday(),
        title_length: title::title_length(&record.title),
        like_view_ratio: likes / views,
        comment_view_ratio: comments / views,
        like_comment_ratio: likes / (comments + 1.0),
    }
}

/// Derive Stage 1 features for every record of a batch, preserving order.
pub fn derive_batch(records: &[VideoRecord]) -> Vec<BasicFeatures> {
    records.iter().map(derive).collect()
}

impl BasicFeatures {
    /// Write the Stage 1 columns into `vector`.
    pub fn write_into(&self, vector: &mut FeatureVector) {
        vector.insert(UPLOAD_HOUR, f64::from(self.upload_hour));
        vector.insert(UPLOAD_WEEKDAY, f64::from(self.upload_weekday));
        vector.insert(TITLE_LENGTH, self.title_length as f64);
        vector.insert(LIKE_VIEW_RATIO, self.like_view_ratio);
        vector.insert(COMMENT_VIEW_RATIO, self.comment_view_ratio);
        vector.insert(LIKE_COMMENT_RATIO, self.like_comment_ratio);
        if !self.like_view_ratio.is_finite() || !self.comment_view_ratio.is_finite() {
            vector.mark(Degenerate::ZeroViews);
        }
    }
}
