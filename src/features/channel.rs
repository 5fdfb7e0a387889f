use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::video::VideoRecord;

/// Number of corpus rows per channel name.
///
/// Built from the training corpus and shipped inside the artifact so the
/// predictor sees the same channel popularity the model was trained on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelCounts(BTreeMap<String, u32>);

impl ChannelCounts {
    pub fn from_records(records: &[VideoRecord]) -> Self {
        let mut counts = BTreeMap::new();
        for record in records {
            *counts.entry(record.channel.clone()).or_insert(0u32) += 1;
        }
        Self(counts)
    }

    /// Rows for `channel`; a channel never seen counts as its own single row.
    pub fn count(&self, channel: &str) -> u32 {
        self.0.get(channel).copied().unwrap_or(1)
    }

    /// Number of distinct channels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
