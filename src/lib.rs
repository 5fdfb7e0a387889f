//! Predicts whether a YouTube video is likely to trend.
//!
//! Records are turned into named numeric features, labeled against the
//! batch view-count quantile, and fed to a boosted tree classifier whose
//! artifact is reused at inference time.

/// Application directory resolution.
pub mod app_dirs;
/// Trained model and feature schema persistence.
pub mod artifact;
/// TOML settings.
pub mod config;
/// Training corpus loading.
pub mod corpus;
/// Feature derivation shared by training and inference.
pub mod features;
/// Prediction input form.
pub mod form;
mod fs_atomic;
mod http_client;
/// Trending label derivation.
pub mod labeling;
/// Tracing setup for the binaries.
pub mod logging;
/// Video metadata lookup.
pub mod lookup;
/// Classifier, resampling, splitting, search and metrics.
pub mod ml;
/// Single-record inference.
pub mod predictor;
/// Training orchestration.
pub mod training;
/// Core record types.
pub mod video;
