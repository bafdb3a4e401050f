use serde::{Deserialize, Serialize};

/// Standard time granularities known to the semantic layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeGranularity {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    #[serde(other)]
    Unknown,
}

/// Parts that can be extracted from a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatePart {
    Doy,
    Dow,
    Day,
    Month,
    Quarter,
    Year,
    #[serde(other)]
    Unknown,
}
