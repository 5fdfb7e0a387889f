mod support;

use support::corpus;
use support::vidtrend_env::EnvGuard;
use tempfile::tempdir;
use time::macros::datetime;
use vidtrend::artifact::{ArtifactError, ArtifactPaths, TrainedArtifact};
use vidtrend::config;
use vidtrend::features::{FeaturePipeline, LexiconSentiment, feature_names};
use vidtrend::labeling::label_batch;
use vidtrend::ml::grid_search::ParamGrid;
use vidtrend::predictor::Predictor;
use vidtrend::training::{Trainer, TrainingError, TrainingSettings};

fn small_settings(threads: usize) -> TrainingSettings {
    TrainingSettings {
        cv_folds: 3,
        threads,
        grid: ParamGrid {
            learning_rate: vec![0.3],
            max_depth: vec![2],
            n_estimators: vec![10, 20],
            subsample: vec![1.0],
        },
        ..TrainingSettings::default()
    }
}

#[test]
fn trains_saves_and_predicts_from_a_csv_corpus() {
    let dir = tempdir().unwrap();
    let csv = corpus::write(dir.path(), "corpus.csv", &corpus::synthetic_csv());
    let records = vidtrend::corpus::load_csv(&csv).unwrap();
    assert_eq!(records.len(), corpus::ROWS);

    let models = dir.path().join("models");
    std::fs::create_dir_all(&models).unwrap();
    let paths = ArtifactPaths::in_dir(&models).dated("20250516").unwrap();
    let settings = small_settings(2);
    let sentiment = LexiconSentiment::new();
    let evaluated_at = datetime!(2025-05-16 12:00);
    let outcome = Trainer::new(&settings, &sentiment)
        .fit_and_save(&records, evaluated_at, &paths)
        .unwrap();

    let report = &outcome.report;
    assert_eq!(report.corpus_rows, 60);
    assert_eq!(report.trending_rows, 12);
    assert_eq!(report.resampled_rows, 96);
    assert_eq!(report.test_rows, 20);
    assert_eq!(report.train_rows, 76);
    assert!(report.evaluation.accuracy >= 0.9, "{report}");
    assert_eq!(outcome.artifact.features, feature_names());

    // The loader finds the dated pair when asked for the default names.
    let predictor = Predictor::load(&ArtifactPaths::in_dir(&models)).unwrap();
    let labels = label_batch(&records, settings.trending_quantile).unwrap();
    let trending = records
        .iter()
        .zip(&labels.labels)
        .find(|(_, label)| **label == 1)
        .map(|(record, _)| record)
        .unwrap();
    let quiet = records
        .iter()
        .zip(&labels.labels)
        .find(|(_, label)| **label == 0)
        .map(|(record, _)| record)
        .unwrap();
    let high = predictor.predict(trending, evaluated_at);
    let low = predictor.predict(quiet, evaluated_at);
    assert!(high.probability > 0.5, "{}", high.probability);
    assert!(low.probability < 0.5, "{}", low.probability);
    assert!(high.zero_filled.is_empty());

    // The average trending row scores on the positive side.
    let pipeline = FeaturePipeline::new(&sentiment);
    let rows: Vec<Vec<f64>> = pipeline
        .run(&records, evaluated_at)
        .iter()
        .zip(&labels.labels)
        .filter(|(_, label)| **label == 1)
        .map(|(vector, _)| vector.align(&outcome.artifact.features).0)
        .collect();
    let width = rows[0].len();
    let mean: Vec<f64> = (0..width)
        .map(|j| rows.iter().map(|row| row[j]).sum::<f64>() / rows.len() as f64)
        .collect();
    assert!(predictor.artifact().model.predict_proba(&mean) > 0.5);
}

#[test]
fn thread_count_does_not_change_the_model() {
    let records = vidtrend::corpus::read_csv(corpus::synthetic_csv().as_bytes()).unwrap();
    let sentiment = LexiconSentiment::new();
    let evaluated_at = datetime!(2025-05-16 12:00);
    let single = Trainer::new(&small_settings(1), &sentiment)
        .fit(&records, evaluated_at)
        .unwrap();
    let many = Trainer::new(&small_settings(4), &sentiment)
        .fit(&records, evaluated_at)
        .unwrap();
    assert_eq!(single.artifact.model, many.artifact.model);
    assert_eq!(single.report.best_params, many.report.best_params);
}

#[test]
fn failed_training_writes_no_artifact() {
    let dir = tempdir().unwrap();
    let records = vidtrend::corpus::read_csv(corpus::single_class_csv().as_bytes()).unwrap();
    let paths = ArtifactPaths::in_dir(dir.path());
    let sentiment = LexiconSentiment::new();
    let err = Trainer::new(&small_settings(1), &sentiment)
        .fit_and_save(&records, datetime!(2025-05-16 12:00), &paths)
        .unwrap_err();
    assert!(matches!(err, TrainingError::SingleClass { .. }));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn fresh_install_reports_missing_model_under_app_root() {
    let home = tempdir().unwrap();
    let _guard = EnvGuard::isolated_home(home.path());
    let settings = config::load_or_default().unwrap();
    let base = settings.model.artifact_paths().unwrap();
    assert!(base.model.starts_with(home.path().join(".vidtrend").join("models")));
    let err = match Predictor::load(&base) {
        Ok(_) => panic!("no model should be found"),
        Err(err) => err,
    };
    assert!(matches!(err, ArtifactError::Missing { .. }));
    assert!(TrainedArtifact::load(&base).is_err());
}

#[test]
fn saved_config_and_env_key_are_picked_up() {
    let home = tempdir().unwrap();
    let _guard = EnvGuard::isolated_home(home.path()).set("VIDTREND_TEST_KEY", "  env-key  ");
    let mut settings = config::load_or_default().unwrap();
    assert_eq!(settings.lookup.resolve_api_key(), None);

    settings.lookup.api_key_env = "VIDTREND_TEST_KEY".to_string();
    settings.training.cv_folds = 4;
    config::save(&settings).unwrap();
    assert!(home.path().join(".vidtrend").join("config.toml").is_file());

    let reloaded = config::load_or_default().unwrap();
    assert_eq!(reloaded.training.cv_folds, 4);
    assert_eq!(reloaded.lookup.resolve_api_key().as_deref(), Some("env-key"));
}
