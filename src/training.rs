//! Offline training of the trending classifier.
//!
//! The run is strictly sequential: label the corpus, featurize it, rebalance
//! the classes, hold out a test split, grid-search the booster with
//! cross-validation, evaluate the winner and hand back an artifact. Any failure
//! aborts the run before anything is written.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::PrimitiveDateTime;

use crate::artifact::{ArtifactError, ArtifactPaths, TrainedArtifact};
use crate::features::{ChannelCounts, FeaturePipeline, SentimentModel, feature_names};
use crate::labeling::{DEFAULT_TRENDING_QUANTILE, label_batch};
use crate::ml::gbdt::BoosterParams;
use crate::ml::grid_search::{ParamGrid, grid_search};
use crate::ml::metrics::{ClassificationReport, ConfusionMatrix};
use crate::ml::smote::Smote;
use crate::ml::split::{take_rows, train_test_split};
use crate::video::VideoRecord;

/// Class names used in evaluation output.
pub const CLASS_NAMES: [&str; 2] = ["not_trending", "trending"];

/// Knobs for a training run, loaded from the `[training]` config table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    /// Seed shared by oversampling, splitting and row subsampling.
    pub seed: u64,
    pub test_fraction: f64,
    pub cv_folds: usize,
    pub trending_quantile: f64,
    pub smote_neighbors: usize,
    pub max_bins: usize,
    /// Worker threads for the search; 0 uses every core.
    pub threads: usize,
    pub grid: ParamGrid,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            cv_folds: 5,
            trending_quantile: DEFAULT_TRENDING_QUANTILE,
            smote_neighbors: 5,
            max_bins: 64,
            threads: 0,
            grid: ParamGrid::default(),
        }
    }
}

/// Fatal training failures.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Training corpus is empty")]
    EmptyCorpus,
    #[error("No usable rows remain after dropping {dropped} rows with undefined features")]
    NoUsableRows { dropped: usize },
    #[error("Training needs both classes; {positives} of {total} rows are trending")]
    SingleClass { positives: usize, total: usize },
    #[error("Oversampling failed: {0}")]
    Resample(String),
    #[error("Train/test split failed: {0}")]
    Split(String),
    #[error("Hyperparameter search failed: {0}")]
    Search(String),
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Observability summary of a completed run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub corpus_rows: usize,
    pub dropped_rows: usize,
    pub view_threshold: f64,
    pub trending_rows: usize,
    pub resampled_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub best_params: BoosterParams,
    pub best_cv_f1: f64,
    pub evaluation: ClassificationReport,
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Corpus: {} rows ({} dropped), trending threshold {:.1} views, {} trending",
            self.corpus_rows, self.dropped_rows, self.view_threshold, self.trending_rows
        )?;
        writeln!(
            f,
            "Resampled to {} rows: {} train / {} test",
            self.resampled_rows, self.train_rows, self.test_rows
        )?;
        writeln!(f, "Model Evaluation:")?;
        write!(f, "{}", self.evaluation)?;
        writeln!(
            f,
            "Best Parameters: learning_rate={}, max_depth={}, n_estimators={}, subsample={} (cv f1 {:.4})",
            self.best_params.learning_rate,
            self.best_params.max_depth,
            self.best_params.n_estimators,
            self.best_params.subsample,
            self.best_cv_f1
        )
    }
}

/// Result of [`Trainer::fit`].
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: TrainedArtifact,
    pub report: TrainingReport,
}

/// Runs the training procedure over a corpus.
pub struct Trainer<'a> {
    settings: &'a TrainingSettings,
    sentiment: &'a dyn SentimentModel,
}

impl<'a> Trainer<'a> {
    pub fn new(settings: &'a TrainingSettings, sentiment: &'a dyn SentimentModel) -> Self {
        Self {
            settings,
            sentiment,
        }
    }

    /// Train on `records`, measuring upload age against `evaluated_at`.
    pub fn fit(
        &self,
        records: &[VideoRecord],
        evaluated_at: PrimitiveDateTime,
    ) -> Result<TrainingOutcome, TrainingError> {
        let settings = self.settings;
        let labels = label_batch(records, settings.trending_quantile)
            .ok_or(TrainingError::EmptyCorpus)?;
        tracing::info!(
            "Labeled {} rows: threshold {:.1} views, {} trending",
            records.len(),
            labels.threshold,
            labels.positives()
        );

        let features = feature_names();
        let vectors = FeaturePipeline::new(self.sentiment).run(records, evaluated_at);
        let mut x = Vec::with_capacity(vectors.len());
        let mut y = Vec::with_capacity(vectors.len());
        for (vector, &label) in vectors.iter().zip(&labels.labels) {
            let (row, _) = vector.align(&features);
            if row.iter().all(|value| value.is_finite()) {
                x.push(row);
                y.push(label);
            }
        }
        let dropped = records.len() - x.len();
        if dropped > 0 {
            tracing::warn!("Dropped {dropped} rows with undefined feature values (zero views)");
        }
        if x.is_empty() {
            return Err(TrainingError::NoUsableRows { dropped });
        }
        let positives = y.iter().filter(|&&label| label == 1).count();
        if positives == 0 || positives == y.len() {
            return Err(TrainingError::SingleClass {
                positives,
                total: y.len(),
            });
        }

        let smote = Smote {
            k_neighbors: settings.smote_neighbors,
            seed: settings.seed,
        };
        let (x, y) = smote.fit_resample(&x, &y).map_err(TrainingError::Resample)?;
        let (train_idx, test_idx) = train_test_split(x.len(), settings.test_fraction, settings.seed)
            .map_err(TrainingError::Split)?;
        let (train_x, train_y) = (take_rows(&x, &train_idx), take_rows(&y, &train_idx));
        let (test_x, test_y) = (take_rows(&x, &test_idx), take_rows(&y, &test_idx));

        let base = BoosterParams {
            seed: settings.seed,
            max_bins: settings.max_bins,
            ..BoosterParams::default()
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.threads)
            .build()?;
        let search = pool
            .install(|| grid_search(&train_x, &train_y, &settings.grid, &base, settings.cv_folds))
            .map_err(TrainingError::Search)?;

        let model = search.best_model.clone();
        let predicted: Vec<u8> = test_x.iter().map(|row| model.predict_class(row)).collect();
        let cm = ConfusionMatrix::from_labels(2, &test_y, &predicted);
        let evaluation = ClassificationReport::new(
            CLASS_NAMES.iter().map(|name| (*name).to_string()).collect(),
            &cm,
        );

        let report = TrainingReport {
            corpus_rows: records.len(),
            dropped_rows: dropped,
            view_threshold: labels.threshold,
            trending_rows: labels.positives(),
            resampled_rows: x.len(),
            train_rows: train_x.len(),
            test_rows: test_x.len(),
            best_params: search.best().params.clone(),
            best_cv_f1: search.best().mean_f1,
            evaluation,
        };
        tracing::info!("Training finished\n{report}");

        Ok(TrainingOutcome {
            artifact: TrainedArtifact {
                model,
                features,
                channel_counts: ChannelCounts::from_records(records),
            },
            report,
        })
    }

    /// Train and persist the artifact pair; nothing is written on failure.
    pub fn fit_and_save(
        &self,
        records: &[VideoRecord],
        evaluated_at: PrimitiveDateTime,
        paths: &ArtifactPaths,
    ) -> Result<TrainingOutcome, TrainingError> {
        let outcome = self.fit(records, evaluated_at)?;
        outcome.artifact.save(paths)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::LexiconSentiment;
    use crate::video::Region;
    use time::macros::datetime;

    fn record(views: u64) -> VideoRecord {
        VideoRecord {
            title: format!("Video {views}"),
            channel: "c".to_string(),
            views,
            likes: views / 10,
            comments: views / 100,
            published_at: datetime!(2025-05-01 12:00:00),
            region: Region::Us,
        }
    }

    #[test]
    fn empty_corpus_fails() {
        let settings = TrainingSettings::default();
        let sentiment = LexiconSentiment::new();
        let err = Trainer::new(&settings, &sentiment)
            .fit(&[], datetime!(2025-05-02 0:00))
            .unwrap_err();
        assert!(matches!(err, TrainingError::EmptyCorpus));
    }

    #[test]
    fn all_zero_view_rows_fail() {
        let settings = TrainingSettings::default();
        let sentiment = LexiconSentiment::new();
        let records = vec![record(0), record(0), record(0)];
        let err = Trainer::new(&settings, &sentiment)
            .fit(&records, datetime!(2025-05-02 0:00))
            .unwrap_err();
        assert!(matches!(err, TrainingError::NoUsableRows { dropped: 3 }));
    }

    #[test]
    fn identical_views_are_a_single_class() {
        let settings = TrainingSettings::default();
        let sentiment = LexiconSentiment::new();
        let records = vec![record(10); 8];
        let err = Trainer::new(&settings, &sentiment)
            .fit(&records, datetime!(2025-05-02 0:00))
            .unwrap_err();
        assert!(matches!(err, TrainingError::SingleClass { positives: 8, total: 8 }));
    }
}
