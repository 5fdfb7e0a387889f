//! Loading training corpora from CSV exports of trending-video data.
//!
//! Expected header: `Title,Channel,Views,Likes,Comments,Published At,Region`.
//! Extra columns are ignored.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::video::{UnknownRegion, VideoRecord, parse_naive_timestamp};

/// Errors raised while reading a corpus file.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to open corpus {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid corpus row {row}: {source}")]
    Row { row: usize, source: csv::Error },
    #[error("Invalid timestamp {value:?} on corpus row {row}")]
    Timestamp { row: usize, value: String },
    #[error("Corpus row {row}: {source}")]
    Region { row: usize, source: UnknownRegion },
}

#[derive(Debug, Deserialize)]
struct CorpusRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Channel")]
    channel: String,
    #[serde(rename = "Views")]
    views: u64,
    #[serde(rename = "Likes")]
    likes: u64,
    #[serde(rename = "Comments")]
    comments: u64,
    #[serde(rename = "Published At")]
    published_at: String,
    #[serde(rename = "Region")]
    region: String,
}

/// Read every record of the CSV file at `path`.
pub fn load_csv(path: &Path) -> Result<Vec<VideoRecord>, CorpusError> {
    let file = std::fs::File::open(path).map_err(|source| CorpusError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_csv(file)?;
    tracing::info!("Loaded {} corpus rows from {}", records.len(), path.display());
    Ok(records)
}

/// Read every record from CSV text.
pub fn read_csv(reader: impl Read) -> Result<Vec<VideoRecord>, CorpusError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);
    let mut records = Vec::new();
    for (index, row) in csv_reader.deserialize::<CorpusRow>().enumerate() {
        // Row numbers are 1-based and skip the header line.
        let row_number = index + 2;
        let row = row.map_err(|source| CorpusError::Row {
            row: row_number,
            source,
        })?;
        let published_at =
            parse_naive_timestamp(&row.published_at).map_err(|_| CorpusError::Timestamp {
                row: row_number,
                value: row.published_at.clone(),
            })?;
        let region = row.region.parse().map_err(|source| CorpusError::Region {
            row: row_number,
            source,
        })?;
        records.push(VideoRecord {
            title: row.title,
            channel: row.channel,
            views: row.views,
            likes: row.likes,
            comments: row.comments,
            published_at,
            region,
        });
    }
    Ok(records)
}
