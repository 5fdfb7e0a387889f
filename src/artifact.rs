//! Persisted (model, feature schema) pairs.
//!
//! A trained artifact is two JSON files that always travel together: the
//! boosted-tree model and the feature schema describing which named features,
//! in which order, the model consumes. The schema records a blake3 fingerprint
//! of the model file so a schema can never be loaded against a different model.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{ChannelCounts, FEATURE_VERSION};
use crate::fs_atomic;
use crate::ml::gbdt::GbdtModel;

pub const DEFAULT_MODEL_FILE: &str = "youtube_trending_model.json";
pub const DEFAULT_FEATURES_FILE: &str = "youtube_features.json";

/// Errors raised while saving or loading artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// No complete model/features pair exists where it was looked for.
    #[error("Model not available: expected {} and {}", model.display(), features.display())]
    Missing { model: PathBuf, features: PathBuf },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid artifact {path}: {message}")]
    Parse { path: PathBuf, message: String },
    /// The features file was written for a different model file.
    #[error("{} does not belong to model {}", features.display(), model.display())]
    PairMismatch { model: PathBuf, features: PathBuf },
    #[error("Incompatible feature schema: {0}")]
    Schema(String),
    #[error("Failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid artifact date tag {0:?} (expected YYYYMMDD)")]
    InvalidTag(String),
}

/// The feature contract a model was trained against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub feature_version: i64,
    /// Feature names in the column order the model expects.
    pub features: Vec<String>,
    /// Channel counts of the training corpus, used for `Channel_Frequency`.
    #[serde(default)]
    pub channel_counts: ChannelCounts,
    /// blake3 hex digest of the paired model file.
    pub model_fingerprint: String,
}

/// Model and schema, loaded or saved as one unit.
#[derive(Debug, Clone)]
pub struct TrainedArtifact {
    pub model: GbdtModel,
    pub features: Vec<String>,
    pub channel_counts: ChannelCounts,
}

/// Locations of the two artifact files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub features: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::named(dir, DEFAULT_MODEL_FILE, DEFAULT_FEATURES_FILE)
    }

    pub fn named(dir: &Path, model_file: &str, features_file: &str) -> Self {
        Self {
            model: dir.join(model_file),
            features: dir.join(features_file),
        }
    }

    /// Date-tagged variant, e.g. `youtube_trending_model_20250516.json`.
    pub fn dated(&self, tag: &str) -> Result<Self, ArtifactError> {
        if !is_date_tag(tag) {
            return Err(ArtifactError::InvalidTag(tag.to_string()));
        }
        Ok(Self {
            model: with_tag(&self.model, tag),
            features: with_tag(&self.features, tag),
        })
    }

    fn exists(&self) -> bool {
        self.model.is_file() && self.features.is_file()
    }

    fn missing(&self) -> ArtifactError {
        ArtifactError::Missing {
            model: self.model.clone(),
            features: self.features.clone(),
        }
    }
}

/// Find the artifact pair to load for the default names in `base`.
///
/// The newest complete date-tagged pair wins; otherwise the untagged pair is
/// used. Errors with [`ArtifactError::Missing`] when neither exists.
pub fn locate(base: &ArtifactPaths) -> Result<ArtifactPaths, ArtifactError> {
    let newest_tag = dated_tags(base)
        .into_iter()
        .rev()
        .filter_map(|tag| base.dated(&tag).ok())
        .find(ArtifactPaths::exists);
    if let Some(paths) = newest_tag {
        tracing::debug!("Using dated artifact {}", paths.model.display());
        return Ok(paths);
    }
    if base.exists() {
        return Ok(base.clone());
    }
    Err(base.missing())
}

impl TrainedArtifact {
    /// Write both files; neither becomes visible unless both were staged.
    pub fn save(&self, paths: &ArtifactPaths) -> Result<(), ArtifactError> {
        for path in [&paths.model, &paths.features] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| ArtifactError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let model_bytes = serde_json::to_vec_pretty(&self.model)?;
        let schema = FeatureSchema {
            feature_version: FEATURE_VERSION,
            features: self.features.clone(),
            channel_counts: self.channel_counts.clone(),
            model_fingerprint: fingerprint(&model_bytes),
        };
        let schema_bytes = serde_json::to_vec_pretty(&schema)?;

        let staged_model = fs_atomic::stage(&paths.model, &model_bytes).map_err(|source| {
            ArtifactError::Write {
                path: paths.model.clone(),
                source,
            }
        })?;
        let staged_schema = match fs_atomic::stage(&paths.features, &schema_bytes) {
            Ok(staged) => staged,
            Err(source) => {
                staged_model.discard();
                return Err(ArtifactError::Write {
                    path: paths.features.clone(),
                    source,
                });
            }
        };
        if let Err(source) = staged_model.commit() {
            staged_schema.discard();
            return Err(ArtifactError::Write {
                path: paths.model.clone(),
                source,
            });
        }
        staged_schema.commit().map_err(|source| ArtifactError::Write {
            path: paths.features.clone(),
            source,
        })?;
        tracing::info!(
            "Saved model to {} and features to {}",
            paths.model.display(),
            paths.features.display()
        );
        Ok(())
    }

    /// Read and cross-check both files.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        if !paths.exists() {
            return Err(paths.missing());
        }
        let model_bytes = read(&paths.model)?;
        let schema_bytes = read(&paths.features)?;
        let schema: FeatureSchema =
            serde_json::from_slice(&schema_bytes).map_err(|err| ArtifactError::Parse {
                path: paths.features.clone(),
                message: err.to_string(),
            })?;
        if schema.model_fingerprint != fingerprint(&model_bytes) {
            return Err(ArtifactError::PairMismatch {
                model: paths.model.clone(),
                features: paths.features.clone(),
            });
        }
        let model =
            GbdtModel::from_json_bytes(&model_bytes).map_err(|message| ArtifactError::Parse {
                path: paths.model.clone(),
                message,
            })?;
        if schema.features.len() != model.feature_len {
            return Err(ArtifactError::Schema(format!(
                "{} feature names for a model expecting {}",
                schema.features.len(),
                model.feature_len
            )));
        }
        if schema.feature_version != FEATURE_VERSION {
            tracing::warn!(
                "Artifact uses feature version {} (current {}); missing features will be zero-filled",
                schema.feature_version,
                FEATURE_VERSION
            );
        }
        Ok(Self {
            model,
            features: schema.features,
            channel_counts: schema.channel_counts,
        })
    }
}

fn read(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    std::fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn fingerprint(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

fn is_date_tag(tag: &str) -> bool {
    tag.len() == 8 && tag.bytes().all(|b| b.is_ascii_digit())
}

fn with_tag(path: &Path, tag: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{tag}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{tag}"),
    };
    path.with_file_name(name)
}

/// Date tags present for the model file, ascending.
fn dated_tags(base: &ArtifactPaths) -> Vec<String> {
    let Some(dir) = base.model.parent() else {
        return Vec::new();
    };
    let Some(prefix) = base
        .model
        .file_stem()
        .map(|stem| format!("{}_", stem.to_string_lossy()))
    else {
        return Vec::new();
    };
    let suffix = base
        .model
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut tags: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter_map(|name| {
            name.strip_prefix(&prefix)?
                .strip_suffix(&suffix)
                .filter(|tag| is_date_tag(tag))
                .map(str::to_string)
        })
        .collect();
    tags.sort();
    tags
}
