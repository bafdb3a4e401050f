use serde::{Deserialize, Serialize};

use crate::protocol::graphql::{WireField, WireModel};

/// Aggregation applied by a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationType {
    Sum,
    Min,
    Max,
    CountDistinct,
    SumBoolean,
    Average,
    Percentile,
    Median,
    Count,
    #[serde(other)]
    Unknown,
}

/// An aggregated column metrics are built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub name: String,
    pub agg: AggregationType,
    #[serde(default)]
    pub agg_time_dimension: Option<String>,
    #[serde(default)]
    pub expr: Option<String>,
}

impl WireModel for Measure {
    const TYPE_NAME: &'static str = "Measure";

    fn wire_fields() -> Vec<WireField> {
        vec![
            WireField::scalar("name"),
            WireField::scalar("aggTimeDimension"),
            WireField::scalar("agg"),
            WireField::scalar("expr"),
        ]
    }
}
