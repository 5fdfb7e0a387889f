//! Inference over a single video record with a loaded artifact.

use std::fmt;

use time::PrimitiveDateTime;

use crate::artifact::{ArtifactError, ArtifactPaths, TrainedArtifact, locate};
use crate::features::{Degenerate, FeaturePipeline, LexiconSentiment, SentimentModel};
use crate::video::VideoRecord;

/// Fixed advice shown with every prediction.
pub const IMPROVEMENT_TIPS: [&str; 3] = [
    "Increase video engagement (likes/comments)",
    "Publish during peak hours (2-4 PM local time)",
    "Use compelling titles with proper keywords",
];

const TITLE_PREVIEW_CHARS: usize = 30;

/// Qualitative reading of a trending probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendTier {
    /// Probability above 0.7.
    VeryLikely,
    /// Probability above 0.4.
    MightTrend,
    Unlikely,
}

impl TrendTier {
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.7 {
            TrendTier::VeryLikely
        } else if probability > 0.4 {
            TrendTier::MightTrend
        } else {
            TrendTier::Unlikely
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            TrendTier::VeryLikely => "Very likely to trend!",
            TrendTier::MightTrend => "Might trend",
            TrendTier::Unlikely => "Unlikely to trend",
        }
    }
}

impl fmt::Display for TrendTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Summary of the input shown next to a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFactors {
    /// First 30 characters of the title followed by `...`.
    pub title_preview: String,
    pub channel: String,
    /// Likes over views; NaN or infinite when views is zero.
    pub like_view_ratio: f64,
}

impl KeyFactors {
    pub fn from_record(record: &VideoRecord) -> Self {
        let preview: String = record.title.chars().take(TITLE_PREVIEW_CHARS).collect();
        Self {
            title_preview: format!("{preview}..."),
            channel: record.channel.clone(),
            like_view_ratio: record.likes as f64 / record.views as f64,
        }
    }
}

impl fmt::Display for KeyFactors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- Title: {}", self.title_preview)?;
        writeln!(f, "- Channel: {}", self.channel)?;
        if self.like_view_ratio.is_finite() {
            write!(
                f,
                "- Engagement: {:.2}% like/view ratio",
                self.like_view_ratio * 100.0
            )
        } else {
            write!(f, "- Engagement: undefined like/view ratio (no views)")
        }
    }
}

/// Outcome of one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Probability of the trending class, in `[0, 1]`.
    pub probability: f64,
    pub tier: TrendTier,
    /// Trained features the pipeline did not produce and were filled with 0.
    pub zero_filled: Vec<String>,
    pub degenerate: Vec<Degenerate>,
    pub key_factors: KeyFactors,
}

/// Scores records against one loaded artifact.
///
/// Built once per process and shared by reference.
pub struct Predictor {
    artifact: TrainedArtifact,
    sentiment: Box<dyn SentimentModel>,
}

impl Predictor {
    pub fn new(artifact: TrainedArtifact) -> Self {
        Self {
            artifact,
            sentiment: Box::new(LexiconSentiment::new()),
        }
    }

    /// Locate and load the artifact pair for `base`, preferring dated pairs.
    pub fn load(base: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let paths = locate(base)?;
        let artifact = TrainedArtifact::load(&paths)?;
        tracing::info!(
            "Loaded model {} ({} trees, {} features)",
            paths.model.display(),
            artifact.model.trees.len(),
            artifact.features.len()
        );
        Ok(Self::new(artifact))
    }

    /// Replace the title sentiment scorer; it must match the one used in training.
    pub fn with_sentiment(mut self, sentiment: Box<dyn SentimentModel>) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn artifact(&self) -> &TrainedArtifact {
        &self.artifact
    }

    /// Score `record`, measuring upload age against `evaluated_at`.
    pub fn predict(&self, record: &VideoRecord, evaluated_at: PrimitiveDateTime) -> Prediction {
        let vector = FeaturePipeline::new(self.sentiment.as_ref())
            .with_channel_counts(&self.artifact.channel_counts)
            .run_one(record, evaluated_at);
        let (row, zero_filled) = vector.align(&self.artifact.features);
        if !zero_filled.is_empty() {
            tracing::debug!("Zero-filled missing features: {}", zero_filled.join(", "));
        }
        if !vector.degenerate().is_empty() {
            tracing::warn!("Degenerate input: {:?}", vector.degenerate());
        }
        let probability = self.artifact.model.predict_proba(&row).clamp(0.0, 1.0);
        Prediction {
            probability,
            tier: TrendTier::from_probability(probability),
            zero_filled,
            degenerate: vector.degenerate().to_vec(),
            key_factors: KeyFactors::from_record(record),
        }
    }
}
