use serde::{Deserialize, Serialize};

use crate::models::TimeGranularity;
use crate::protocol::graphql::{WireField, WireModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DimensionType {
    Categorical,
    Time,
    #[serde(other)]
    Unknown,
}

/// A dimension that metrics can be grouped by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub name: String,
    pub qualified_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub dimension_type: DimensionType,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub is_partition: bool,
    #[serde(default)]
    pub expr: Option<String>,
    #[serde(default)]
    pub queryable_granularities: Vec<TimeGranularity>,
    #[serde(default)]
    pub queryable_time_granularities: Vec<String>,
}

impl WireModel for Dimension {
    const TYPE_NAME: &'static str = "Dimension";

    fn wire_fields() -> Vec<WireField> {
        vec![
            WireField::scalar("name"),
            WireField::scalar("qualifiedName"),
            WireField::scalar("description"),
            WireField::scalar("type"),
            WireField::scalar("label"),
            WireField::scalar("isPartition"),
            WireField::scalar("expr"),
            WireField::scalar("queryableGranularities"),
            WireField::scalar("queryableTimeGranularities"),
        ]
    }
}
