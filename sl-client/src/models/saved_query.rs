use serde::{Deserialize, Serialize};

use crate::models::{DatePart, TimeGranularity};
use crate::protocol::graphql::{WireField, WireModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportDestinationType {
    Table,
    View,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQueryMetricParam {
    pub name: String,
}

impl WireModel for SavedQueryMetricParam {
    const TYPE_NAME: &'static str = "SavedQueryMetricParam";

    fn wire_fields() -> Vec<WireField> {
        vec![WireField::scalar("name")]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQueryGroupByParam {
    pub name: String,
    #[serde(default)]
    pub grain: Option<String>,
    #[serde(default)]
    pub time_granularity: Option<TimeGranularity>,
    #[serde(default)]
    pub date_part: Option<DatePart>,
}

impl WireModel for SavedQueryGroupByParam {
    const TYPE_NAME: &'static str = "SavedQueryGroupByParam";

    fn wire_fields() -> Vec<WireField> {
        vec![
            WireField::scalar("name"),
            WireField::scalar("grain"),
            WireField::scalar("timeGranularity"),
            WireField::scalar("datePart"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQueryWhereParam {
    pub where_sql_template: String,
}

impl WireModel for SavedQueryWhereParam {
    const TYPE_NAME: &'static str = "WhereFilter";

    fn wire_fields() -> Vec<WireField> {
        vec![WireField::scalar("whereSqlTemplate")]
    }
}

/// Query parameters stored with a saved query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQueryQueryParams {
    #[serde(default)]
    pub metrics: Vec<SavedQueryMetricParam>,
    #[serde(default)]
    pub group_by: Vec<SavedQueryGroupByParam>,
    #[serde(default, rename = "where")]
    pub where_filter: Option<SavedQueryWhereParam>,
}

impl WireModel for SavedQueryQueryParams {
    const TYPE_NAME: &'static str = "SavedQueryQueryParams";

    fn wire_fields() -> Vec<WireField> {
        vec![
            WireField::nested::<SavedQueryMetricParam>("metrics"),
            WireField::nested::<SavedQueryGroupByParam>("groupBy"),
            WireField::nested::<SavedQueryWhereParam>("where"),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    pub alias: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    pub export_as: ExportDestinationType,
}

impl WireModel for ExportConfig {
    const TYPE_NAME: &'static str = "ExportConfig";

    fn wire_fields() -> Vec<WireField> {
        vec![
            WireField::scalar("alias"),
            WireField::scalar("schema"),
            WireField::scalar("exportAs"),
        ]
    }
}

/// A materialization target of a saved query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Export {
    pub name: String,
    pub config: ExportConfig,
}

impl WireModel for Export {
    const TYPE_NAME: &'static str = "Export";

    fn wire_fields() -> Vec<WireField> {
        vec![
            WireField::scalar("name"),
            WireField::nested::<ExportConfig>("config"),
        ]
    }
}

/// A named query stored in the semantic layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    pub query_params: SavedQueryQueryParams,
    #[serde(default)]
    pub exports: Vec<Export>,
}

impl WireModel for SavedQuery {
    const TYPE_NAME: &'static str = "SavedQuery";

    fn wire_fields() -> Vec<WireField> {
        vec![
            WireField::scalar("name"),
            WireField::scalar("description"),
            WireField::scalar("label"),
            WireField::nested::<SavedQueryQueryParams>("queryParams"),
            WireField::nested::<Export>("exports"),
        ]
    }
}
