//! Raw video metadata as entered by the user or returned by a lookup.

use std::fmt;
use std::str::FromStr;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Regions a video can be scored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Region {
    #[default]
    Us,
    In,
    Gb,
    Jp,
    Ca,
}

impl Region {
    /// All supported regions in display order.
    pub const ALL: [Region; 5] = [Region::Us, Region::In, Region::Gb, Region::Jp, Region::Ca];

    /// Two-letter region code.
    pub fn code(self) -> &'static str {
        match self {
            Region::Us => "US",
            Region::In => "IN",
            Region::Gb => "GB",
            Region::Jp => "JP",
            Region::Ca => "CA",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Region code outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported region {0:?} (expected one of US, IN, GB, JP, CA)")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let code = value.trim().to_ascii_uppercase();
        Region::ALL
            .into_iter()
            .find(|region| region.code() == code)
            .ok_or_else(|| UnknownRegion(value.to_string()))
    }
}

/// Timestamp text that matched none of the accepted layouts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized timestamp {0:?}")]
pub struct TimestampError(pub String);

/// Parse a publish timestamp into a naive instant.
///
/// Any UTC offset is dropped, not applied: `2024-03-01T10:00:00+05:00`
/// becomes `2024-03-01 10:00:00`.
pub fn parse_naive_timestamp(text: &str) -> Result<PrimitiveDateTime, TimestampError> {
    let text = text.trim();
    if let Ok(with_offset) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(strip_offset(with_offset));
    }
    let layouts = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ];
    for layout in layouts {
        if let Ok(parsed) = PrimitiveDateTime::parse(text, layout) {
            return Ok(parsed);
        }
    }
    Err(TimestampError(text.to_string()))
}

/// Parse the strict `YYYY-MM-DDTHH:MM:SSZ` form returned by the metadata API.
pub fn parse_api_timestamp(text: &str) -> Result<PrimitiveDateTime, TimestampError> {
    let layout = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");
    PrimitiveDateTime::parse(text, layout).map_err(|_| TimestampError(text.to_string()))
}

/// Drop the offset of an instant, keeping its wall-clock reading.
pub fn strip_offset(instant: OffsetDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(instant.date(), instant.time())
}

/// One video's metadata, the unit of both training corpora and prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    pub title: String,
    pub channel: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    /// Naive publish instant; offsets are stripped on the way in.
    pub published_at: PrimitiveDateTime,
    pub region: Region,
}
