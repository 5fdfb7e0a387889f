//! Training labels: a video is trending when its views reach the batch's
//! upper quantile.
//!
//! The threshold is recomputed for every batch, so the same view count can be
//! labeled differently in different corpora. Labels only exist at training
//! time; a batch of one would always label itself trending.

use crate::video::VideoRecord;

/// Fraction of the batch below the trending threshold.
pub const DEFAULT_TRENDING_QUANTILE: f64 = 0.8;

/// Linearly interpolated quantile of `values`.
///
/// Position `q * (n - 1)` in the sorted values, interpolating between the two
/// neighbours. Returns `None` for an empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Labels assigned to one batch together with the threshold used.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchLabels {
    pub threshold: f64,
    /// 1 for trending, 0 otherwise, aligned with the batch.
    pub labels: Vec<u8>,
}

impl BatchLabels {
    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|&&label| label == 1).count()
    }
}

/// Label each record `1` when its views are at least the batch quantile.
pub fn label_batch(records: &[VideoRecord], q: f64) -> Option<BatchLabels> {
    let views: Vec<f64> = records.iter().map(|record| record.views as f64).collect();
    let threshold = quantile(&views, q)?;
    let labels = views
        .iter()
        .map(|&value| u8::from(value >= threshold))
        .collect();
    Some(BatchLabels { threshold, labels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::Region;
    use time::macros::datetime;

    fn records(views: &[u64]) -> Vec<VideoRecord> {
        views
            .iter()
            .map(|&views| VideoRecord {
                title: String::new(),
                channel: String::new(),
                views,
                likes: 0,
                comments: 0,
                published_at: datetime!(2025-01-01 0:00),
                region: Region::Us,
            })
            .collect()
    }

    #[test]
    fn ten_records_threshold_interpolates() {
        let batch = records(&[3, 1, 2, 10, 4, 5, 6, 7, 8, 9]);
        let labels = label_batch(&batch, DEFAULT_TRENDING_QUANTILE).unwrap();
        assert!((labels.threshold - 8.2).abs() < 1e-9);
        assert_eq!(labels.labels, vec![0, 0, 0, 1, 0, 0, 0, 0, 0, 1]);
        assert_eq!(labels.positives(), 2);
    }

    #[test]
    fn single_record_is_always_trending() {
        let labels = label_batch(&records(&[42]), DEFAULT_TRENDING_QUANTILE).unwrap();
        assert_eq!(labels.threshold, 42.0);
        assert_eq!(labels.labels, vec![1]);
    }

    #[test]
    fn ties_at_threshold_are_trending() {
        let labels = label_batch(&records(&[5, 5, 5, 5, 5]), 0.8).unwrap();
        assert_eq!(labels.labels, vec![1; 5]);
    }

    #[test]
    fn empty_batch_has_no_threshold() {
        assert!(quantile(&[], 0.5).is_none());
        assert!(label_batch(&[], 0.8).is_none());
    }
}
